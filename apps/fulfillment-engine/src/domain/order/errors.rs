//! Order domain errors.

use thiserror::Error;

use super::status::{OrderStatus, SubOrderStatus};

/// Errors raised by order and sub-order operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// A transition outside the allowed table was attempted.
    #[error("invalid sub-order transition {from} -> {to}")]
    InvalidSubOrderTransition {
        /// Current status.
        from: SubOrderStatus,
        /// Attempted status.
        to: SubOrderStatus,
    },

    /// An order-level transition outside the allowed table was attempted.
    #[error("invalid order transition {from} -> {to}")]
    InvalidOrderTransition {
        /// Current status.
        from: OrderStatus,
        /// Attempted status.
        to: OrderStatus,
    },

    /// The actor does not own the order or shop in question.
    #[error("actor does not own this resource")]
    Forbidden,

    /// Customer cancellation gate failed.
    #[error("order cannot be cancelled: {reason}")]
    NotCancellable {
        /// Why the gate rejected the cancellation.
        reason: String,
    },

    /// Monetary totals failed validation.
    #[error("invalid order totals: {reason}")]
    InvalidTotals {
        /// What was wrong.
        reason: String,
    },

    /// Order or sub-order not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind ("order", "sub-order").
        entity: &'static str,
        /// The missing id.
        id: String,
    },
}
