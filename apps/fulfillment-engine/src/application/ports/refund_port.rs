//! Refund Port (Collaborator Contract)
//!
//! Invoked when a paid non-COD order is cancelled. The refund outcome never
//! blocks the cancellation itself.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::shared::{Money, OrderId};
use crate::error::AppError;

/// Receipt of an initiated refund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundReceipt {
    /// Payment-provider reference of the refund.
    pub reference: String,
    /// Refunded amount.
    pub amount: Money,
    /// When the refund was accepted.
    pub at: DateTime<Utc>,
}

/// Port into the payment provider's refund path.
#[async_trait]
pub trait RefundPort: Send + Sync {
    /// Initiate a refund for an order.
    async fn refund(&self, order_id: &OrderId, amount: Money) -> Result<RefundReceipt, AppError>;
}
