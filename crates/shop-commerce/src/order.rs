//! Order types and the order status state machine.

use crate::ids::{OrderId, ProductId, UserId};
use crate::money::Money;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order fulfillment status.
///
/// Legal transitions:
///
/// | From       | Allowed to             |
/// |------------|------------------------|
/// | Placed     | Processing, Cancelled  |
/// | Processing | Delivered, Cancelled   |
/// | Delivered  | (terminal)             |
/// | Cancelled  | (terminal)             |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order placed, awaiting processing.
    #[default]
    Placed,
    /// Order being prepared.
    Processing,
    /// Order delivered. Terminal.
    Delivered,
    /// Order cancelled. Terminal.
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "Placed",
            OrderStatus::Processing => "Processing",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// The set of states reachable from this one.
    pub fn allowed_transitions(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Placed => &[OrderStatus::Processing, OrderStatus::Cancelled],
            OrderStatus::Processing => &[OrderStatus::Delivered, OrderStatus::Cancelled],
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }

    /// Check if a transition to `target` is legal.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Check if no further transition is permitted.
    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment status, tracked independently of fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Payment pending.
    #[default]
    Pending,
    /// Payment completed.
    Paid,
    /// Payment failed.
    Failed,
    /// Payment refunded.
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

/// Accepted payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Paypal,
    Stripe,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::Stripe => "stripe",
        }
    }
}

/// An immutable line-item snapshot, decoupled from the live product.
///
/// Name, price, and image are captured at order-creation time so later
/// catalog changes do not retroactively alter historical orders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    /// Referenced product.
    pub product_id: ProductId,
    /// Product name at time of order.
    pub name: String,
    /// Quantity ordered, >= 1.
    pub quantity: i64,
    /// Unit price at time of order.
    pub unit_price: Money,
    /// Image at time of order.
    pub image: String,
}

impl OrderLine {
    /// Total for this line.
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// A shipping address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ShippingAddress {
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub phone: String,
}

/// Details recorded when a payment is captured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PaymentCapture {
    /// Processor-side transaction id.
    pub id: String,
    /// Processor-side status string.
    pub status: String,
    /// Processor-side update time.
    pub update_time: String,
    /// Payer email.
    pub email_address: String,
}

/// A persisted order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Unique order identifier. The primary key.
    pub id: OrderId,
    /// Human-readable order number, `ORD-YYYYMMDD-NNNN`. Informational
    /// only; uniqueness is not enforced.
    pub order_number: String,
    /// Customer user id. None for guest checkout.
    pub user: Option<UserId>,
    /// Immutable line snapshots.
    pub lines: Vec<OrderLine>,
    /// Shipping address.
    pub shipping_address: ShippingAddress,
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Sum of line totals (before discount).
    pub subtotal: Money,
    /// Coupon discount taken off the subtotal.
    pub discount_amount: Money,
    /// Tax charged.
    pub tax_amount: Money,
    /// Shipping charged.
    pub shipping_cost: Money,
    /// Amount charged: subtotal - discount + tax + shipping.
    pub total_amount: Money,
    /// Fulfillment status.
    pub status: OrderStatus,
    /// Payment status.
    pub payment_status: PaymentStatus,
    /// Whether payment has been captured.
    pub is_paid: bool,
    /// Unix timestamp of payment capture.
    pub paid_at: Option<i64>,
    /// Whether the order has been delivered.
    pub is_delivered: bool,
    /// Unix timestamp of delivery.
    pub delivered_at: Option<i64>,
    /// Unix timestamp of cancellation.
    pub cancelled_at: Option<i64>,
    /// Why the order was cancelled.
    pub cancellation_reason: Option<String>,
    /// Payment capture details, if paid.
    pub payment_capture: Option<PaymentCapture>,
    /// Free-form customer note.
    pub notes: Option<String>,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last update.
    pub updated_at: i64,
}

impl Order {
    /// Create a freshly placed order.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user: Option<UserId>,
        lines: Vec<OrderLine>,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
        subtotal: Money,
        discount_amount: Money,
        tax_amount: Money,
        shipping_cost: Money,
        total_amount: Money,
    ) -> Self {
        let now = current_timestamp();
        Self {
            id: OrderId::generate(),
            order_number: generate_order_number(),
            user,
            lines,
            shipping_address,
            payment_method,
            subtotal,
            discount_amount,
            tax_amount,
            shipping_cost,
            total_amount,
            status: OrderStatus::Placed,
            payment_status: PaymentStatus::Pending,
            is_paid: false,
            paid_at: None,
            is_delivered: false,
            delivered_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            payment_capture: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Total item count across all lines.
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Whether the order may be hard-deleted. Paid or delivered orders
    /// must be retained.
    pub fn deletable(&self) -> bool {
        !self.is_paid && !self.is_delivered
    }

    /// Apply the side effects of entering `Delivered`.
    pub fn mark_delivered(&mut self, now: i64) {
        self.status = OrderStatus::Delivered;
        self.is_delivered = true;
        self.delivered_at = Some(now);
        self.updated_at = now;
    }

    /// Apply the side effects of entering `Cancelled`. Stock
    /// restoration is the caller's responsibility.
    pub fn mark_cancelled(&mut self, reason: Option<String>, now: i64) {
        self.status = OrderStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.cancellation_reason = reason;
        self.updated_at = now;
    }

    /// Record a captured payment.
    pub fn mark_paid(&mut self, capture: Option<PaymentCapture>, now: i64) {
        self.is_paid = true;
        self.paid_at = Some(now);
        self.payment_status = PaymentStatus::Paid;
        self.payment_capture = capture;
        self.updated_at = now;
    }

    /// Move to a non-terminal intermediate status with no extra side
    /// effects (currently only `Processing`).
    pub fn set_status(&mut self, status: OrderStatus, now: i64) {
        self.status = status;
        self.updated_at = now;
    }
}

/// Generate a human-readable order number: `ORD-YYYYMMDD-NNNN` with a
/// zero-padded pseudo-random 4-digit suffix. Collisions are possible
/// and accepted; the order number is not a key.
pub fn generate_order_number() -> String {
    let date = chrono::Utc::now().format("%Y%m%d");
    let suffix: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("ORD-{date}-{suffix:04}")
}

/// Get current Unix timestamp.
fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
