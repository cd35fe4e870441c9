//! Cart aggregation and order engine services.
//!
//! This crate is the request-facing surface of the ordering core: a
//! thin HTTP layer resolves identity into an
//! [`OwnerKey`](shop_commerce::ids::OwnerKey), parses JSON bodies, and
//! calls into [`CartService`] and [`OrderService`]. Both run against
//! any [`shop_db::Store`], leaning on its atomicity guarantees for
//! stock and status correctness.
//!
//! # Example
//!
//! ```
//! use shop_commerce::catalog::Product;
//! use shop_commerce::ids::OwnerKey;
//! use shop_commerce::money::Money;
//! use shop_db::{MemoryStore, ProductStore};
//! use shop_engine::{CartService, OrderService, OrderRequest};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let product = Product::new("Rust Book", Money::from_decimal(49.99), 10, "books");
//! let product_id = product.id.clone();
//! store.insert_product(product).unwrap();
//!
//! let carts = CartService::new(Arc::clone(&store));
//! let orders = OrderService::new(Arc::clone(&store));
//!
//! let owner = OwnerKey::guest("sess-1");
//! carts.add_item(&owner, &product_id, 2).unwrap();
//!
//! let order = orders.create_order(&owner, OrderRequest::default()).unwrap();
//! assert_eq!(order.subtotal, Money::from_decimal(99.98));
//! ```

mod cart;
mod orders;
mod response;

pub use cart::CartService;
pub use orders::{OrderItemInput, OrderRequest, OrderService, PricingOverrides, PricingPolicy};
pub use response::{ApiError, ApiMessage};
