//! Product catalog types.

use crate::ids::ProductId;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A product in the catalog.
///
/// Holds the authoritative stock count. Stock is only mutated by the
/// order engine: decremented when an order is created, incremented when
/// an unfulfilled order is cancelled or deleted. Carts never touch it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Full description.
    pub description: String,
    /// Unit price. Never negative.
    pub price: Money,
    /// Image path or URL.
    pub image: String,
    /// Units in stock. Never negative.
    pub stock: i64,
    /// Category name.
    pub category: String,
    /// Highlighted on landing pages.
    pub featured: bool,
    /// Whether the product can currently be ordered.
    pub is_available: bool,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last update.
    pub updated_at: i64,
}

impl Product {
    /// Create a new product with sane defaults.
    pub fn new(
        name: impl Into<String>,
        price: Money,
        stock: i64,
        category: impl Into<String>,
    ) -> Self {
        let now = current_timestamp();
        Self {
            id: ProductId::generate(),
            name: name.into(),
            description: String::new(),
            price,
            image: "/images/default-product.jpg".to_string(),
            stock,
            category: category.into(),
            featured: false,
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the image.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Check if a specific quantity can be fulfilled from stock.
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }

    /// Check if any stock remains.
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Bump the update timestamp.
    pub fn touch(&mut self) {
        self.updated_at = current_timestamp();
    }
}

/// Get current Unix timestamp.
fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
