//! Order and sub-order statuses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a customer order (the aggregate across all shops).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Awaiting payment (or partner confirmation for COD).
    PendingPayment,
    /// Payment attempt failed.
    PaymentFailed,
    /// Confirmed by the seller, not yet paid/processing.
    Confirmed,
    /// Paid and being fulfilled.
    Processing,
    /// All sub-orders settled, at least one fulfilled.
    Completed,
    /// Cancelled before fulfillment.
    Cancelled,
    /// Cancelled and money returned.
    Refunded,
}

impl OrderStatus {
    /// Returns true if the order reached a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Refunded)
    }

    /// Status token used on the wire and in event payloads.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PendingPayment => "pending_payment",
            Self::PaymentFailed => "payment_failed",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a per-shop sub-order, the unit of fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubOrderStatus {
    /// Created at checkout, waiting for the seller.
    Pending,
    /// Seller confirmed the sub-order.
    Confirmed,
    /// Seller is preparing the parcel.
    Processing,
    /// Packed and waiting for pickup.
    ReadyToShip,
    /// In transit to the customer.
    Shipping,
    /// Handed to the customer; return window open.
    Delivered,
    /// Receipt confirmed by the customer.
    Completed,
    /// Cancelled before shipping.
    Cancelled,
    /// Customer asked to return the parcel.
    ReturnRequested,
    /// Seller approved the return.
    ReturnApproved,
    /// Parcel back at the seller.
    Returned,
    /// Return refunded.
    Refunded,
}

impl SubOrderStatus {
    /// Returns true if the sub-order reached a settled state for the
    /// aggregate completion rule.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Delivered | Self::Completed | Self::Cancelled)
    }

    /// Returns true if no further transition is allowed.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Refunded)
    }

    /// Status token used on the wire and in event payloads.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::ReadyToShip => "ready_to_ship",
            Self::Shipping => "shipping",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::ReturnRequested => "return_requested",
            Self::ReturnApproved => "return_approved",
            Self::Returned => "returned",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for SubOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Not yet paid.
    Pending,
    /// Captured by the payment provider (or COD settled).
    Paid,
    /// Payment attempt failed.
    Failed,
    /// Payment returned to the customer.
    Refunded,
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery.
    Cod,
    /// MoMo e-wallet.
    Momo,
    /// VNPay gateway.
    Vnpay,
    /// ZaloPay e-wallet.
    Zalopay,
}

impl PaymentMethod {
    /// Whether money moves at the door rather than online.
    #[must_use]
    pub const fn is_cod(&self) -> bool {
        matches!(self, Self::Cod)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_terminal() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Refunded.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(!OrderStatus::PendingPayment.is_terminal());
    }

    #[test]
    fn sub_order_status_settled() {
        assert!(SubOrderStatus::Delivered.is_settled());
        assert!(SubOrderStatus::Completed.is_settled());
        assert!(SubOrderStatus::Cancelled.is_settled());
        assert!(!SubOrderStatus::Shipping.is_settled());
        assert!(!SubOrderStatus::Returned.is_settled());
    }

    #[test]
    fn status_serde_tokens() {
        let json = serde_json::to_string(&SubOrderStatus::ReadyToShip).unwrap();
        assert_eq!(json, "\"ready_to_ship\"");
        let parsed: OrderStatus = serde_json::from_str("\"pending_payment\"").unwrap();
        assert_eq!(parsed, OrderStatus::PendingPayment);
    }

    #[test]
    fn payment_method_cod() {
        assert!(PaymentMethod::Cod.is_cod());
        assert!(!PaymentMethod::Momo.is_cod());
    }
}
