//! Domain types and logic for the shop ordering core.
//!
//! This crate holds the pure domain model of the order/cart/inventory
//! subsystem:
//!
//! - **Catalog**: products with authoritative stock counts
//! - **Cart**: owner-keyed line collections with merge-by-sum semantics
//! - **Discount**: the static coupon table
//! - **Order**: immutable line snapshots, pricing breakdown, and the
//!   four-state fulfillment machine
//!
//! Storage and request-level orchestration live in `shop-db` and
//! `shop-engine`; everything here is synchronous, deterministic (apart
//! from id/order-number generation), and side-effect free.

pub mod cart;
pub mod catalog;
pub mod discount;
pub mod error;
pub mod ids;
pub mod money;
pub mod order;

pub use error::CommerceError;
pub use ids::{CartId, OrderId, OwnerKey, ProductId, UserId};
pub use money::Money;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::{CartId, OrderId, OwnerKey, ProductId, UserId};
    pub use crate::money::Money;

    pub use crate::cart::{Cart, CartLine, ResolvedCart, ResolvedLine, CART_TTL_SECS};
    pub use crate::catalog::Product;
    pub use crate::discount::{Coupon, DiscountTable};
    pub use crate::order::{
        Order, OrderLine, OrderStatus, PaymentCapture, PaymentMethod, PaymentStatus,
        ShippingAddress,
    };
}
