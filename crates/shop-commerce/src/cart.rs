//! Cart and cart line types.

use crate::catalog::Product;
use crate::error::CommerceError;
use crate::ids::{CartId, OwnerKey, ProductId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A cart is purged after 7 days of inactivity.
pub const CART_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// A (product, quantity) line within a cart.
///
/// Quantities are at least 1; a quantity reaching 0 means the line is
/// removed, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    /// Referenced product.
    pub product_id: ProductId,
    /// Quantity, >= 1.
    pub quantity: i64,
}

/// A shopping cart, keyed by its owner.
///
/// At most one line per product: adding a product that is already in
/// the cart merges by summing quantities. The cart reserves nothing;
/// stock is only decremented at checkout, so two concurrent carts may
/// reference more stock than exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    /// Unique cart identifier.
    pub id: CartId,
    /// Owner identity (user or guest token).
    pub owner: OwnerKey,
    /// Lines in the cart, unique per product.
    pub lines: Vec<CartLine>,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last activity. Drives the TTL.
    pub updated_at: i64,
}

impl Cart {
    /// Create an empty cart for an owner.
    pub fn new(owner: OwnerKey) -> Self {
        let now = current_timestamp();
        Self {
            id: CartId::generate(),
            owner,
            lines: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a quantity of a product, merging with an existing line.
    pub fn add_line(&mut self, product_id: ProductId, quantity: i64) -> Result<(), CommerceError> {
        if quantity < 1 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity += quantity;
        } else {
            self.lines.push(CartLine {
                product_id,
                quantity,
            });
        }
        self.updated_at = current_timestamp();
        Ok(())
    }

    /// Set the quantity of an existing line. Does not add.
    pub fn set_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<(), CommerceError> {
        if quantity < 1 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }
        let line = self
            .lines
            .iter_mut()
            .find(|l| &l.product_id == product_id)
            .ok_or_else(|| CommerceError::ItemNotInCart(product_id.to_string()))?;
        line.quantity = quantity;
        self.updated_at = current_timestamp();
        Ok(())
    }

    /// Remove the line for a product. Idempotent: removing an absent
    /// line is not an error.
    pub fn remove_line(&mut self, product_id: &ProductId) -> bool {
        let len_before = self.lines.len();
        self.lines.retain(|l| &l.product_id != product_id);
        let removed = self.lines.len() < len_before;
        if removed {
            self.updated_at = current_timestamp();
        }
        removed
    }

    /// Empty the line list. The cart record itself survives.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.updated_at = current_timestamp();
    }

    /// Get the line for a product.
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product_id == product_id)
    }

    /// Check if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Merge another cart's lines into this one, e.g. a guest cart when
    /// its owner logs in. Duplicate products merge by summing.
    pub fn absorb(&mut self, other: Cart) {
        for line in other.lines {
            if let Some(existing) = self
                .lines
                .iter_mut()
                .find(|l| l.product_id == line.product_id)
            {
                existing.quantity += line.quantity;
            } else {
                self.lines.push(line);
            }
        }
        self.updated_at = current_timestamp();
    }

    /// Check if the cart has been inactive past its TTL.
    pub fn is_expired(&self, now: i64) -> bool {
        now - self.updated_at > CART_TTL_SECS
    }
}

/// A cart line with its product joined in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedLine {
    /// The product at its current catalog state.
    pub product: Product,
    /// Quantity in the cart.
    pub quantity: i64,
    /// quantity x current unit price.
    pub line_total: Money,
}

/// A cart with product details resolved into every line, plus derived
/// totals. This is the shape the HTTP layer serializes; nothing here is
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedCart {
    /// Owner identity.
    pub owner: OwnerKey,
    /// Lines with products joined in. Lines whose product has vanished
    /// from the catalog are dropped.
    pub items: Vec<ResolvedLine>,
    /// Sum of line totals.
    pub total: Money,
    /// Sum of quantities.
    pub item_count: i64,
}

impl ResolvedCart {
    /// Build the derived view from joined lines.
    pub fn new(owner: OwnerKey, items: Vec<ResolvedLine>) -> Self {
        let total = items.iter().map(|l| l.line_total).sum();
        let item_count = items.iter().map(|l| l.quantity).sum();
        Self {
            owner,
            items,
            total,
            item_count,
        }
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
