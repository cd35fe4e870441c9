//! Stock non-negativity under concurrent checkouts.

use shop_commerce::catalog::Product;
use shop_commerce::ids::{OwnerKey, ProductId};
use shop_commerce::money::Money;
use shop_db::{MemoryStore, ProductStore};
use shop_engine::{OrderItemInput, OrderRequest, OrderService};
use std::sync::Arc;
use std::thread;

fn request(quantity: i64) -> OrderRequest {
    OrderRequest {
        items: Some(vec![OrderItemInput {
            product_id: ProductId::new("hot-item"),
            quantity,
        }]),
        ..OrderRequest::default()
    }
}

#[test]
fn concurrent_checkouts_never_oversell() {
    const INITIAL_STOCK: i64 = 10;
    const THREADS: usize = 16;
    const QUANTITY: i64 = 3;

    let store = Arc::new(MemoryStore::new());
    let mut product = Product::new("Hot Item", Money::new(1000), INITIAL_STOCK, "deals");
    product.id = ProductId::new("hot-item");
    store.insert_product(product).unwrap();

    let orders = Arc::new(OrderService::new(Arc::clone(&store)));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let orders = Arc::clone(&orders);
            thread::spawn(move || {
                orders
                    .create_order(&OwnerKey::guest(format!("sess-{i}")), request(QUANTITY))
                    .is_ok()
            })
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap_or(false))
        .filter(|ok| *ok)
        .count() as i64;

    let remaining = store.product(&ProductId::new("hot-item")).unwrap().stock;

    // Sum of successfully ordered quantities never exceeds the initial
    // stock, and stock never goes negative.
    assert!(remaining >= 0);
    assert_eq!(remaining, INITIAL_STOCK - successes * QUANTITY);
    assert!(successes * QUANTITY <= INITIAL_STOCK);
    // 10 / 3 leaves room for exactly 3 winners.
    assert_eq!(successes, 3);
    assert_eq!(store.order_count(), 3);
}

#[test]
fn concurrent_cancellations_restore_everything() {
    const INITIAL_STOCK: i64 = 50;
    const THREADS: usize = 10;

    let store = Arc::new(MemoryStore::new());
    let mut product = Product::new("Hot Item", Money::new(1000), INITIAL_STOCK, "deals");
    product.id = ProductId::new("hot-item");
    store.insert_product(product).unwrap();

    let orders = Arc::new(OrderService::new(Arc::clone(&store)));

    let created: Vec<_> = (0..THREADS)
        .map(|i| {
            orders
                .create_order(&OwnerKey::guest(format!("sess-{i}")), request(5))
                .unwrap()
        })
        .collect();
    assert_eq!(
        store.product(&ProductId::new("hot-item")).unwrap().stock,
        0
    );

    let handles: Vec<_> = created
        .into_iter()
        .map(|order| {
            let orders = Arc::clone(&orders);
            thread::spawn(move || orders.cancel(&order.id, None).unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        store.product(&ProductId::new("hot-item")).unwrap().stock,
        INITIAL_STOCK
    );
}

#[test]
fn double_cancel_race_cannot_double_restore() {
    let store = Arc::new(MemoryStore::new());
    let mut product = Product::new("Hot Item", Money::new(1000), 5, "deals");
    product.id = ProductId::new("hot-item");
    store.insert_product(product).unwrap();

    let orders = Arc::new(OrderService::new(Arc::clone(&store)));
    let order = orders
        .create_order(&OwnerKey::guest("sess-1"), request(5))
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let orders = Arc::clone(&orders);
            let id = order.id.clone();
            thread::spawn(move || orders.cancel(&id, None).is_ok())
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap_or(false))
        .filter(|ok| *ok)
        .count();

    // Exactly one cancel wins the optimistic status check; stock is
    // restored exactly once.
    assert_eq!(winners, 1);
    assert_eq!(store.product(&ProductId::new("hot-item")).unwrap().stock, 5);
}
