//! The customer order aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::shared::{Address, Money, OrderId, UserId};

use super::errors::OrderError;
use super::state_machine::OrderStateMachine;
use super::status::{OrderStatus, PaymentMethod, PaymentStatus};

/// Shipping destination captured at checkout.
///
/// A snapshot: later edits to the customer's address book do not rewrite
/// orders already placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingSnapshot {
    /// Recipient name.
    pub name: String,
    /// Recipient phone.
    pub phone: String,
    /// Destination address.
    pub address: Address,
}

/// Monetary totals of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Sum of item totals across all sub-orders.
    pub subtotal: Money,
    /// Sum of shipping fees.
    pub shipping_total: Money,
    /// Discounts applied.
    pub discount_total: Money,
    /// What the customer pays.
    pub grand_total: Money,
}

impl OrderTotals {
    /// Build totals, computing and checking the grand total.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTotals` when the discount exceeds subtotal plus
    /// shipping (the grand total would go negative).
    pub fn new(
        subtotal: Money,
        shipping_total: Money,
        discount_total: Money,
    ) -> Result<Self, OrderError> {
        let gross = subtotal + shipping_total;
        if discount_total > gross {
            return Err(OrderError::InvalidTotals {
                reason: format!("discount {discount_total} exceeds gross {gross}"),
            });
        }
        Ok(Self {
            subtotal,
            shipping_total,
            discount_total,
            grand_total: gross - discount_total,
        })
    }
}

/// A customer order, fanned out into one sub-order per shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique id.
    pub id: OrderId,
    /// Buying customer.
    pub user_id: UserId,
    /// Opaque unique order number shown to the customer.
    pub order_number: String,
    /// Monetary totals.
    pub totals: OrderTotals,
    /// Payment method chosen at checkout.
    pub payment_method: PaymentMethod,
    /// Payment state.
    pub payment_status: PaymentStatus,
    /// Order state.
    pub status: OrderStatus,
    /// Shipping destination snapshot.
    pub shipping: ShippingSnapshot,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
    /// When payment was captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    /// When the order completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// When the order was cancelled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Create a new order in `pending_payment`.
    #[must_use]
    pub fn new(
        user_id: UserId,
        order_number: String,
        totals: OrderTotals,
        payment_method: PaymentMethod,
        shipping: ShippingSnapshot,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OrderId::generate(),
            user_id,
            order_number,
            totals,
            payment_method,
            payment_status: PaymentStatus::Pending,
            status: OrderStatus::PendingPayment,
            shipping,
            created_at: now,
            updated_at: now,
            paid_at: None,
            completed_at: None,
            cancelled_at: None,
        }
    }

    /// Apply a validated status transition, stamping the matching timestamp.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOrderTransition` if the move is not allowed.
    pub fn transition_to(&mut self, to: OrderStatus, now: DateTime<Utc>) -> Result<(), OrderError> {
        OrderStateMachine::validate_transition(self.status, to)?;
        self.status = to;
        self.updated_at = now;
        match to {
            OrderStatus::Completed => self.completed_at = Some(now),
            OrderStatus::Cancelled => self.cancelled_at = Some(now),
            _ => {}
        }
        Ok(())
    }

    /// Record a successful payment capture.
    pub fn mark_paid(&mut self, now: DateTime<Utc>) {
        self.payment_status = PaymentStatus::Paid;
        self.paid_at = Some(now);
        self.updated_at = now;
    }

    /// Record a failed payment attempt.
    pub fn mark_payment_failed(&mut self, now: DateTime<Utc>) {
        self.payment_status = PaymentStatus::Failed;
        self.updated_at = now;
    }

    /// Record a refund.
    pub fn mark_refunded(&mut self, now: DateTime<Utc>) {
        self.payment_status = PaymentStatus::Refunded;
        self.updated_at = now;
    }

    /// Whether this order has been paid online (refund needed on cancel).
    #[must_use]
    pub const fn needs_refund_on_cancel(&self) -> bool {
        matches!(self.payment_status, PaymentStatus::Paid) && !self.payment_method.is_cod()
    }
}
