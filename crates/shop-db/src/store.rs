//! Repository traits.
//!
//! The concurrency contract lives here, not in the services: every
//! stock mutation and every order update is a single atomic operation
//! at the storage layer. A non-atomic read-check-write on stock is a
//! known oversell race and is deliberately impossible through these
//! interfaces.

use serde::{Deserialize, Serialize};
use shop_commerce::cart::Cart;
use shop_commerce::catalog::Product;
use shop_commerce::ids::{OrderId, OwnerKey, ProductId, UserId};
use shop_commerce::order::Order;
use shop_commerce::CommerceError;

/// A quantity of a product to reserve or release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockClaim {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl StockClaim {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Product records and stock mutation.
pub trait ProductStore {
    /// Insert or replace a product.
    fn insert_product(&self, product: Product) -> Result<(), CommerceError>;

    /// Fetch a product by id.
    fn product(&self, id: &ProductId) -> Result<Product, CommerceError>;

    /// List all products.
    fn products(&self) -> Result<Vec<Product>, CommerceError>;

    /// Atomically decrement stock for every claim, all-or-nothing.
    ///
    /// Each decrement is conditional: "subtract N only if stock >= N".
    /// If any claim cannot be satisfied (product missing or stock
    /// short), no stock is mutated and the error names the offending
    /// product. Claims for the same product are counted cumulatively.
    ///
    /// Returns the post-reservation product records, one per claim, in
    /// claim order.
    fn reserve_stock(&self, claims: &[StockClaim]) -> Result<Vec<Product>, CommerceError>;

    /// Increment stock for every claim; the inverse of
    /// [`reserve_stock`](ProductStore::reserve_stock).
    ///
    /// Claims whose product no longer exists are skipped: restoring
    /// stock for a deleted product is a no-op, not an error.
    fn release_stock(&self, claims: &[StockClaim]) -> Result<(), CommerceError>;
}

/// Cart records, keyed by owner.
pub trait CartStore {
    /// Fetch the owner's cart, if one exists.
    fn cart(&self, owner: &OwnerKey) -> Result<Option<Cart>, CommerceError>;

    /// Fetch the owner's cart, creating an empty one if absent.
    fn fetch_or_create_cart(&self, owner: &OwnerKey) -> Result<Cart, CommerceError>;

    /// Persist a cart under its owner key.
    fn save_cart(&self, cart: &Cart) -> Result<(), CommerceError>;

    /// Delete the owner's cart record. Returns whether one existed.
    fn delete_cart(&self, owner: &OwnerKey) -> Result<bool, CommerceError>;

    /// Drop carts inactive past their TTL. Returns how many were
    /// purged. Expected to be driven by a background sweep, not by
    /// request handlers.
    fn purge_expired_carts(&self, now: i64) -> Result<usize, CommerceError>;
}

/// Order records.
pub trait OrderStore {
    /// Insert a new order.
    fn insert_order(&self, order: Order) -> Result<(), CommerceError>;

    /// Fetch an order by id.
    fn order(&self, id: &OrderId) -> Result<Order, CommerceError>;

    /// Orders for a user, newest first.
    fn orders_for(&self, user: &UserId) -> Result<Vec<Order>, CommerceError>;

    /// Atomically read-validate-mutate an order.
    ///
    /// `apply` runs under the store's write lock, so the status it
    /// observes cannot change before the mutation lands. Returning an
    /// error from `apply` leaves the record untouched. Returns the
    /// updated order.
    fn update_order(
        &self,
        id: &OrderId,
        apply: &mut dyn FnMut(&mut Order) -> Result<(), CommerceError>,
    ) -> Result<Order, CommerceError>;

    /// Atomically remove an order, but only if `guard` admits the
    /// current record. Returns the removed order.
    fn remove_order(
        &self,
        id: &OrderId,
        guard: &dyn Fn(&Order) -> Result<(), CommerceError>,
    ) -> Result<Order, CommerceError>;
}

/// Umbrella trait for anything that can back the services.
pub trait Store: ProductStore + CartStore + OrderStore + Send + Sync {}

impl<T: ProductStore + CartStore + OrderStore + Send + Sync> Store for T {}
