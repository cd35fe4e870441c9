//! Commerce error types.

use crate::order::OrderStatus;
use thiserror::Error;

/// Errors that can occur in cart, order, and inventory operations.
///
/// Every variant is recoverable at the request boundary: each maps to a
/// specific HTTP status via [`CommerceError::http_status`] and none of
/// them should crash the process.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Cart not found.
    #[error("Cart not found for {0}")]
    CartNotFound(String),

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Item not in cart.
    #[error("Item not in cart: {0}")]
    ItemNotInCart(String),

    /// Requested quantity exceeds available stock.
    #[error("Insufficient stock for {name}: requested {requested}, available {available}")]
    InsufficientStock {
        name: String,
        requested: i64,
        available: i64,
    },

    /// Checkout resolved to zero lines.
    #[error("No order items provided")]
    EmptyOrder,

    /// Quantity must be at least 1.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Status change not permitted from the current state.
    #[error("Invalid status transition from '{from}' to '{to}'")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    /// Mutation blocked by a business rule.
    #[error("{0}")]
    Conflict(String),

    /// Missing or invalid identity.
    #[error("Not authorized")]
    Unauthorized,

    /// Identity lacks the required role.
    #[error("Forbidden")]
    Forbidden,

    /// Unexpected storage failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CommerceError {
    /// The HTTP status this error maps to at the request boundary.
    pub fn http_status(&self) -> u16 {
        match self {
            CommerceError::ProductNotFound(_)
            | CommerceError::CartNotFound(_)
            | CommerceError::OrderNotFound(_)
            | CommerceError::ItemNotInCart(_) => 404,
            CommerceError::InsufficientStock { .. }
            | CommerceError::EmptyOrder
            | CommerceError::InvalidQuantity(_)
            | CommerceError::IllegalTransition { .. }
            | CommerceError::Conflict(_) => 400,
            CommerceError::Unauthorized => 401,
            CommerceError::Forbidden => 403,
            CommerceError::Storage(_) => 500,
        }
    }

    /// Whether this is an unexpected server-side failure, as opposed to
    /// a precondition the caller can correct.
    pub fn is_server_error(&self) -> bool {
        self.http_status() >= 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            CommerceError::ProductNotFound("p1".into()).http_status(),
            404
        );
        assert_eq!(CommerceError::EmptyOrder.http_status(), 400);
        assert_eq!(
            CommerceError::Conflict("cannot delete".into()).http_status(),
            400
        );
        assert_eq!(CommerceError::Storage("lock".into()).http_status(), 500);
    }

    #[test]
    fn test_insufficient_stock_names_product() {
        let err = CommerceError::InsufficientStock {
            name: "Widget".into(),
            requested: 3,
            available: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("Widget"));
        assert!(msg.contains("requested 3"));
    }

    #[test]
    fn test_illegal_transition_names_states() {
        let err = CommerceError::IllegalTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Processing,
        };
        assert_eq!(
            err.to_string(),
            "Invalid status transition from 'Delivered' to 'Processing'"
        );
    }
}
