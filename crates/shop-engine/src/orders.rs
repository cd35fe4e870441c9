//! Order engine: creation, status transitions, payment, deletion.

use serde::{Deserialize, Serialize};
use shop_commerce::catalog::Product;
use shop_commerce::discount::DiscountTable;
use shop_commerce::ids::{OrderId, OwnerKey, ProductId, UserId};
use shop_commerce::money::Money;
use shop_commerce::order::{
    Order, OrderLine, OrderStatus, PaymentCapture, PaymentMethod, ShippingAddress,
};
use shop_commerce::CommerceError;
use shop_db::{StockClaim, Store};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// A requested (product, quantity) pair for an explicit item list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Caller-supplied pricing overrides. Any field left `None` is
/// computed by the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingOverrides {
    pub subtotal: Option<Money>,
    pub tax: Option<Money>,
    pub shipping: Option<Money>,
    pub total: Option<Money>,
}

/// A checkout request.
///
/// Lines come either from `items` or, when `items` is absent, from the
/// caller's persisted cart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderRequest {
    pub items: Option<Vec<OrderItemInput>>,
    pub shipping_address: Option<ShippingAddress>,
    pub payment_method: Option<PaymentMethod>,
    pub coupon: Option<String>,
    #[serde(default)]
    pub overrides: PricingOverrides,
}

/// Default pricing knobs.
#[derive(Debug, Clone, Copy)]
pub struct PricingPolicy {
    /// Tax as a ratio of the discounted subtotal.
    pub tax_rate: f64,
    /// Flat shipping charge.
    pub shipping_flat: Money,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: 0.10,
            shipping_flat: Money::zero(),
        }
    }
}

/// The order engine and status state machine.
///
/// Stock moves in exactly two places: `create_order` reserves it
/// through the store's all-or-nothing conditional decrement, and
/// cancellation/deletion restores it line for line.
pub struct OrderService<S> {
    store: Arc<S>,
    discounts: DiscountTable,
    policy: PricingPolicy,
}

impl<S: Store> OrderService<S> {
    /// Create a service with the standard coupon table and default
    /// pricing policy.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            discounts: DiscountTable::standard(),
            policy: PricingPolicy::default(),
        }
    }

    /// Replace the coupon table.
    pub fn with_discounts(mut self, discounts: DiscountTable) -> Self {
        self.discounts = discounts;
        self
    }

    /// Replace the pricing policy.
    pub fn with_policy(mut self, policy: PricingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Create an order for `owner`.
    ///
    /// Resolves lines (explicit list or the owner's cart), atomically
    /// reserves stock for all of them, snapshots the catalog state into
    /// immutable order lines, prices the order, and persists it. A
    /// failed call leaves every product's stock unchanged. On success,
    /// a cart-sourced order clears the cart.
    pub fn create_order(
        &self,
        owner: &OwnerKey,
        request: OrderRequest,
    ) -> Result<Order, CommerceError> {
        let (claims, from_cart) = self.resolve_lines(owner, request.items)?;

        let reserved = match self.store.reserve_stock(&claims) {
            Ok(products) => products,
            Err(e) => {
                warn!(owner = %owner, error = %e, "stock reservation rejected");
                return Err(e);
            }
        };

        let lines = snapshot_lines(&claims, &reserved);
        let computed_subtotal: Money = lines.iter().map(|l| l.line_total()).sum();

        let coupon = self.discounts.evaluate(request.coupon.as_deref());
        let subtotal = request.overrides.subtotal.unwrap_or(computed_subtotal);
        let discount_amount = subtotal.percent_of(coupon.percent);
        let discounted = subtotal - discount_amount;
        let tax_amount = request
            .overrides
            .tax
            .unwrap_or_else(|| discounted.percent_of(self.policy.tax_rate));
        let shipping_cost = request.overrides.shipping.unwrap_or(self.policy.shipping_flat);
        let total_amount = request
            .overrides
            .total
            .unwrap_or(discounted + tax_amount + shipping_cost);

        let order = Order::new(
            owner.user_id().cloned(),
            lines,
            request.shipping_address.unwrap_or_default(),
            request.payment_method.unwrap_or_default(),
            subtotal,
            discount_amount,
            tax_amount,
            shipping_cost,
            total_amount,
        );

        if let Err(e) = self.store.insert_order(order.clone()) {
            // Compensate: the reservation must not outlive a failed
            // persist.
            if let Err(release_err) = self.store.release_stock(&claims) {
                warn!(error = %release_err, "failed to release stock after persist failure");
            }
            return Err(e);
        }

        if from_cart {
            if let Some(mut cart) = self.store.cart(owner)? {
                cart.clear();
                self.store.save_cart(&cart)?;
            }
        }

        info!(
            order = %order.order_number,
            owner = %owner,
            items = order.item_count(),
            total = %order.total_amount,
            "order created"
        );
        Ok(order)
    }

    /// Move an order to `target` per the transition table, applying the
    /// target state's side effects.
    ///
    /// The legality check runs inside the store's atomic update, so two
    /// concurrent operator actions cannot both succeed on an illegal
    /// double-transition. Entering `Cancelled` restores stock for every
    /// line.
    pub fn transition(
        &self,
        order_id: &OrderId,
        target: OrderStatus,
    ) -> Result<Order, CommerceError> {
        self.apply_transition(order_id, target, None)
    }

    /// Cancel an order, recording an optional reason. Equivalent to a
    /// transition to `Cancelled`.
    pub fn cancel(
        &self,
        order_id: &OrderId,
        reason: Option<String>,
    ) -> Result<Order, CommerceError> {
        self.apply_transition(order_id, OrderStatus::Cancelled, reason)
    }

    fn apply_transition(
        &self,
        order_id: &OrderId,
        target: OrderStatus,
        reason: Option<String>,
    ) -> Result<Order, CommerceError> {
        let now = current_timestamp();
        let updated = self.store.update_order(order_id, &mut |order| {
            if !order.status.can_transition_to(target) {
                return Err(CommerceError::IllegalTransition {
                    from: order.status,
                    to: target,
                });
            }
            match target {
                OrderStatus::Delivered => order.mark_delivered(now),
                OrderStatus::Cancelled => order.mark_cancelled(reason.clone(), now),
                other => order.set_status(other, now),
            }
            Ok(())
        })?;

        if updated.status == OrderStatus::Cancelled {
            // Symmetric inverse of creation: put every line's quantity
            // back. Legal transitions into Cancelled happen at most
            // once, so this cannot double-restore.
            self.store.release_stock(&claims_for(&updated))?;
        }

        info!(order = %updated.order_number, status = %updated.status, "order status updated");
        Ok(updated)
    }

    /// Record a captured payment on an order.
    pub fn mark_paid(
        &self,
        order_id: &OrderId,
        capture: Option<PaymentCapture>,
    ) -> Result<Order, CommerceError> {
        let now = current_timestamp();
        let updated = self.store.update_order(order_id, &mut |order| {
            if order.is_paid {
                return Err(CommerceError::Conflict("Order is already paid".to_string()));
            }
            if order.status == OrderStatus::Cancelled {
                return Err(CommerceError::Conflict(
                    "Cannot pay a cancelled order".to_string(),
                ));
            }
            order.mark_paid(capture.clone(), now);
            Ok(())
        })?;

        info!(order = %updated.order_number, "order marked as paid");
        Ok(updated)
    }

    /// Hard-delete an order that is neither paid nor delivered,
    /// restoring stock for every line. Returns the removed order.
    pub fn delete_order(&self, order_id: &OrderId) -> Result<Order, CommerceError> {
        let removed = self.store.remove_order(order_id, &|order| {
            if order.deletable() {
                Ok(())
            } else {
                Err(CommerceError::Conflict(
                    "Cannot delete paid or delivered orders".to_string(),
                ))
            }
        })?;

        // Cancelled orders already had their stock restored.
        if removed.status != OrderStatus::Cancelled {
            self.store.release_stock(&claims_for(&removed))?;
        }

        info!(order = %removed.order_number, "order deleted");
        Ok(removed)
    }

    /// Fetch an order.
    pub fn order(&self, order_id: &OrderId) -> Result<Order, CommerceError> {
        self.store.order(order_id)
    }

    /// Orders for a user, newest first.
    pub fn orders_for(&self, user: &UserId) -> Result<Vec<Order>, CommerceError> {
        self.store.orders_for(user)
    }

    /// Resolve the source lines for a checkout: the explicit item list
    /// when given, the owner's cart otherwise.
    fn resolve_lines(
        &self,
        owner: &OwnerKey,
        items: Option<Vec<OrderItemInput>>,
    ) -> Result<(Vec<StockClaim>, bool), CommerceError> {
        let (claims, from_cart) = match items {
            Some(items) => {
                let claims = items
                    .into_iter()
                    .map(|i| StockClaim::new(i.product_id, i.quantity))
                    .collect::<Vec<_>>();
                (claims, false)
            }
            None => {
                let cart = self.store.cart(owner)?;
                let claims = cart
                    .map(|c| {
                        c.lines
                            .iter()
                            .map(|l| StockClaim::new(l.product_id.clone(), l.quantity))
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                (claims, true)
            }
        };

        if claims.is_empty() {
            return Err(CommerceError::EmptyOrder);
        }
        for claim in &claims {
            if claim.quantity < 1 {
                return Err(CommerceError::InvalidQuantity(claim.quantity));
            }
        }
        Ok((claims, from_cart))
    }
}

/// Build immutable line snapshots from the reserved catalog state, in
/// claim order.
fn snapshot_lines(claims: &[StockClaim], reserved: &[Product]) -> Vec<OrderLine> {
    let by_id: HashMap<&ProductId, &Product> = reserved.iter().map(|p| (&p.id, p)).collect();
    claims
        .iter()
        .filter_map(|claim| {
            by_id.get(&claim.product_id).map(|product| OrderLine {
                product_id: product.id.clone(),
                name: product.name.clone(),
                quantity: claim.quantity,
                unit_price: product.price,
                image: product.image.clone(),
            })
        })
        .collect()
}

fn claims_for(order: &Order) -> Vec<StockClaim> {
    order
        .lines
        .iter()
        .map(|l| StockClaim::new(l.product_id.clone(), l.quantity))
        .collect()
}

/// Get current Unix timestamp.
fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
