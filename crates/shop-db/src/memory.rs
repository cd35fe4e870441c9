//! In-memory store.

use crate::store::{CartStore, OrderStore, ProductStore, StockClaim};
use shop_commerce::cart::Cart;
use shop_commerce::catalog::Product;
use shop_commerce::ids::{OrderId, OwnerKey, ProductId, UserId};
use shop_commerce::order::Order;
use shop_commerce::CommerceError;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory store.
///
/// One `RwLock` per collection. Multi-product stock reservation runs
/// under a single write guard on the product map, which is what makes
/// it all-or-nothing: no interleaving of concurrent `reserve_stock`
/// calls can drive any stock below zero.
#[derive(Debug, Default)]
pub struct MemoryStore {
    products: RwLock<HashMap<ProductId, Product>>,
    carts: RwLock<HashMap<OwnerKey, Cart>>,
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders.
    pub fn order_count(&self) -> usize {
        self.orders.read().map(|m| m.len()).unwrap_or(0)
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, CommerceError> {
    lock.read()
        .map_err(|_| CommerceError::Storage("lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, CommerceError> {
    lock.write()
        .map_err(|_| CommerceError::Storage("lock poisoned".to_string()))
}

impl ProductStore for MemoryStore {
    fn insert_product(&self, product: Product) -> Result<(), CommerceError> {
        write(&self.products)?.insert(product.id.clone(), product);
        Ok(())
    }

    fn product(&self, id: &ProductId) -> Result<Product, CommerceError> {
        read(&self.products)?
            .get(id)
            .cloned()
            .ok_or_else(|| CommerceError::ProductNotFound(id.to_string()))
    }

    fn products(&self) -> Result<Vec<Product>, CommerceError> {
        Ok(read(&self.products)?.values().cloned().collect())
    }

    fn reserve_stock(&self, claims: &[StockClaim]) -> Result<Vec<Product>, CommerceError> {
        let mut products = write(&self.products)?;

        // Validate every claim before touching any stock, counting
        // repeated products cumulatively.
        let mut needed: HashMap<&ProductId, i64> = HashMap::new();
        for claim in claims {
            *needed.entry(&claim.product_id).or_insert(0) += claim.quantity;
        }
        for (product_id, quantity) in &needed {
            let product = products
                .get(*product_id)
                .ok_or_else(|| CommerceError::ProductNotFound(product_id.to_string()))?;
            if product.stock < *quantity {
                return Err(CommerceError::InsufficientStock {
                    name: product.name.clone(),
                    requested: *quantity,
                    available: product.stock,
                });
            }
        }

        for claim in claims {
            if let Some(product) = products.get_mut(&claim.product_id) {
                product.stock -= claim.quantity;
                product.touch();
            }
        }

        let mut reserved = Vec::with_capacity(claims.len());
        for claim in claims {
            if let Some(product) = products.get(&claim.product_id) {
                reserved.push(product.clone());
            }
        }
        Ok(reserved)
    }

    fn release_stock(&self, claims: &[StockClaim]) -> Result<(), CommerceError> {
        let mut products = write(&self.products)?;
        for claim in claims {
            // Product may have been deleted since the order was placed.
            if let Some(product) = products.get_mut(&claim.product_id) {
                product.stock += claim.quantity;
                product.touch();
            }
        }
        Ok(())
    }
}

impl CartStore for MemoryStore {
    fn cart(&self, owner: &OwnerKey) -> Result<Option<Cart>, CommerceError> {
        Ok(read(&self.carts)?.get(owner).cloned())
    }

    fn fetch_or_create_cart(&self, owner: &OwnerKey) -> Result<Cart, CommerceError> {
        let mut carts = write(&self.carts)?;
        Ok(carts
            .entry(owner.clone())
            .or_insert_with(|| Cart::new(owner.clone()))
            .clone())
    }

    fn save_cart(&self, cart: &Cart) -> Result<(), CommerceError> {
        write(&self.carts)?.insert(cart.owner.clone(), cart.clone());
        Ok(())
    }

    fn delete_cart(&self, owner: &OwnerKey) -> Result<bool, CommerceError> {
        Ok(write(&self.carts)?.remove(owner).is_some())
    }

    fn purge_expired_carts(&self, now: i64) -> Result<usize, CommerceError> {
        let mut carts = write(&self.carts)?;
        let before = carts.len();
        carts.retain(|_, cart| !cart.is_expired(now));
        Ok(before - carts.len())
    }
}

impl OrderStore for MemoryStore {
    fn insert_order(&self, order: Order) -> Result<(), CommerceError> {
        write(&self.orders)?.insert(order.id.clone(), order);
        Ok(())
    }

    fn order(&self, id: &OrderId) -> Result<Order, CommerceError> {
        read(&self.orders)?
            .get(id)
            .cloned()
            .ok_or_else(|| CommerceError::OrderNotFound(id.to_string()))
    }

    fn orders_for(&self, user: &UserId) -> Result<Vec<Order>, CommerceError> {
        let mut orders: Vec<Order> = read(&self.orders)?
            .values()
            .filter(|o| o.user.as_ref() == Some(user))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    fn update_order(
        &self,
        id: &OrderId,
        apply: &mut dyn FnMut(&mut Order) -> Result<(), CommerceError>,
    ) -> Result<Order, CommerceError> {
        let mut orders = write(&self.orders)?;
        let order = orders
            .get_mut(id)
            .ok_or_else(|| CommerceError::OrderNotFound(id.to_string()))?;
        // Apply to a copy and commit only on success, so a rejected
        // update leaves the record untouched.
        let mut updated = order.clone();
        apply(&mut updated)?;
        *order = updated.clone();
        Ok(updated)
    }

    fn remove_order(
        &self,
        id: &OrderId,
        guard: &dyn Fn(&Order) -> Result<(), CommerceError>,
    ) -> Result<Order, CommerceError> {
        let mut orders = write(&self.orders)?;
        let order = orders
            .get(id)
            .ok_or_else(|| CommerceError::OrderNotFound(id.to_string()))?;
        guard(order)?;
        match orders.remove(id) {
            Some(order) => Ok(order),
            None => Err(CommerceError::OrderNotFound(id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_commerce::money::Money;
    use shop_commerce::order::{OrderLine, OrderStatus, PaymentMethod, ShippingAddress};
    use std::sync::Arc;
    use std::thread;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        let mut product = Product::new("Widget", Money::new(1000), 5, "tools");
        product.id = ProductId::new("p1");
        store.insert_product(product).unwrap();
        store
    }

    #[test]
    fn test_reserve_decrements_conditionally() {
        let store = seeded();

        let reserved = store
            .reserve_stock(&[StockClaim::new(ProductId::new("p1"), 3)])
            .unwrap();
        assert_eq!(reserved[0].stock, 2);

        let err = store
            .reserve_stock(&[StockClaim::new(ProductId::new("p1"), 3)])
            .unwrap_err();
        assert!(matches!(err, CommerceError::InsufficientStock { .. }));
        assert_eq!(store.product(&ProductId::new("p1")).unwrap().stock, 2);
    }

    #[test]
    fn test_reserve_is_all_or_nothing() {
        let store = seeded();
        let mut other = Product::new("Gadget", Money::new(500), 1, "tools");
        other.id = ProductId::new("p2");
        store.insert_product(other).unwrap();

        let err = store
            .reserve_stock(&[
                StockClaim::new(ProductId::new("p1"), 2),
                StockClaim::new(ProductId::new("p2"), 5),
            ])
            .unwrap_err();
        assert!(matches!(err, CommerceError::InsufficientStock { .. }));

        // First claim must not have been applied.
        assert_eq!(store.product(&ProductId::new("p1")).unwrap().stock, 5);
        assert_eq!(store.product(&ProductId::new("p2")).unwrap().stock, 1);
    }

    #[test]
    fn test_reserve_counts_repeated_products_cumulatively() {
        let store = seeded();
        let err = store
            .reserve_stock(&[
                StockClaim::new(ProductId::new("p1"), 3),
                StockClaim::new(ProductId::new("p1"), 3),
            ])
            .unwrap_err();
        assert!(matches!(err, CommerceError::InsufficientStock { .. }));
        assert_eq!(store.product(&ProductId::new("p1")).unwrap().stock, 5);
    }

    #[test]
    fn test_release_skips_missing_products() {
        let store = seeded();
        store
            .release_stock(&[
                StockClaim::new(ProductId::new("p1"), 2),
                StockClaim::new(ProductId::new("gone"), 9),
            ])
            .unwrap();
        assert_eq!(store.product(&ProductId::new("p1")).unwrap().stock, 7);
    }

    #[test]
    fn test_concurrent_reserves_never_oversell() {
        let store = Arc::new(seeded());
        let mut handles = Vec::new();

        // Stock is 5; eight threads each claim 2, so at most 2 can win.
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                store
                    .reserve_stock(&[StockClaim::new(ProductId::new("p1"), 2)])
                    .is_ok()
            }));
        }

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap_or(false))
            .filter(|ok| *ok)
            .count() as i64;

        let remaining = store.product(&ProductId::new("p1")).unwrap().stock;
        assert_eq!(successes, 2);
        assert_eq!(remaining, 5 - successes * 2);
        assert!(remaining >= 0);
    }

    #[test]
    fn test_fetch_or_create_cart_never_fails() {
        let store = MemoryStore::new();
        let owner = OwnerKey::guest("s1");

        let first = store.fetch_or_create_cart(&owner).unwrap();
        let second = store.fetch_or_create_cart(&owner).unwrap();
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn test_purge_expired_carts() {
        let store = MemoryStore::new();
        let mut stale = Cart::new(OwnerKey::guest("old"));
        stale.updated_at = 0;
        store.save_cart(&stale).unwrap();

        let fresh = store
            .fetch_or_create_cart(&OwnerKey::guest("new"))
            .unwrap();

        let purged = store
            .purge_expired_carts(shop_commerce::cart::CART_TTL_SECS + 1)
            .unwrap();
        assert_eq!(purged, 1);
        assert!(store.cart(&OwnerKey::guest("old")).unwrap().is_none());
        assert_eq!(store.cart(&fresh.owner).unwrap().unwrap().id, fresh.id);
    }

    #[test]
    fn test_update_order_rejection_leaves_record_untouched() {
        let store = seeded();
        let order = sample_order();
        let id = order.id.clone();
        store.insert_order(order).unwrap();

        let err = store
            .update_order(&id, &mut |o| {
                o.mark_delivered(99);
                Err(CommerceError::Conflict("rolled back".into()))
            })
            .unwrap_err();
        assert!(matches!(err, CommerceError::Conflict(_)));

        let unchanged = store.order(&id).unwrap();
        assert_eq!(unchanged.status, OrderStatus::Placed);
        assert!(!unchanged.is_delivered);
    }

    #[test]
    fn test_remove_order_guard_blocks() {
        let store = seeded();
        let mut order = sample_order();
        order.mark_paid(None, 10);
        let id = order.id.clone();
        store.insert_order(order).unwrap();

        let err = store
            .remove_order(&id, &|o| {
                if o.deletable() {
                    Ok(())
                } else {
                    Err(CommerceError::Conflict(
                        "Cannot delete paid or delivered orders".into(),
                    ))
                }
            })
            .unwrap_err();
        assert!(matches!(err, CommerceError::Conflict(_)));
        assert!(store.order(&id).is_ok());
    }

    #[test]
    fn test_orders_for_newest_first() {
        let store = seeded();
        let user = UserId::new("u1");

        let mut first = sample_order();
        first.user = Some(user.clone());
        first.created_at = 100;
        let mut second = sample_order();
        second.user = Some(user.clone());
        second.created_at = 200;

        store.insert_order(first).unwrap();
        store.insert_order(second).unwrap();

        let orders = store.orders_for(&user).unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders[0].created_at >= orders[1].created_at);
    }

    fn sample_order() -> Order {
        Order::new(
            None,
            vec![OrderLine {
                product_id: ProductId::new("p1"),
                name: "Widget".into(),
                quantity: 1,
                unit_price: Money::new(1000),
                image: String::new(),
            }],
            ShippingAddress::default(),
            PaymentMethod::Cash,
            Money::new(1000),
            Money::zero(),
            Money::new(100),
            Money::zero(),
            Money::new(1100),
        )
    }

    #[test]
    fn test_update_order_missing() {
        let store = MemoryStore::new();
        let err = store
            .update_order(&OrderId::new("nope"), &mut |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, CommerceError::OrderNotFound(_)));
    }
}
