//! Domain events published on the event bus.
//!
//! Every message is JSON with a versioned `schema` tag so consumers can
//! evolve independently. Delivery is at-least-once; consumers are expected
//! to be idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::shared::{Money, OrderId, ShipmentId, ShipperId, SubOrderId, TrackingNumber};
use crate::domain::shipment::UnifiedShippingStatus;

use super::status::{OrderStatus, SubOrderStatus};

/// Durable queues on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueName {
    /// Order lifecycle events.
    Orders,
    /// Payment outcome events (consumed by the core).
    Payments,
    /// Shipment lifecycle events.
    Shipments,
    /// Fan-out queue for the notification service.
    Notifications,
}

impl QueueName {
    /// Queue name on the broker.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Orders => "orders",
            Self::Payments => "payments",
            Self::Shipments => "shipments",
            Self::Notifications => "notifications",
        }
    }
}

/// Events emitted (and, for payments, consumed) by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// An order or one of its sub-orders changed status.
    OrderStatusChanged {
        /// The order.
        order_id: OrderId,
        /// The sub-order, when the change is shop-scoped.
        #[serde(skip_serializing_if = "Option::is_none")]
        sub_order_id: Option<SubOrderId>,
        /// New order status.
        order_status: OrderStatus,
        /// New sub-order status, when shop-scoped.
        #[serde(skip_serializing_if = "Option::is_none")]
        sub_order_status: Option<SubOrderStatus>,
        /// When the change happened.
        at: DateTime<Utc>,
    },

    /// An order was cancelled.
    OrderCancelled {
        /// The order.
        order_id: OrderId,
        /// Who/why, free-form.
        reason: String,
        /// When.
        at: DateTime<Utc>,
    },

    /// An order satisfied the aggregate completion rule.
    OrderCompleted {
        /// The order.
        order_id: OrderId,
        /// When.
        at: DateTime<Utc>,
    },

    /// Payment captured (consumed from the payments queue).
    PaymentSucceeded {
        /// The order.
        order_id: OrderId,
        /// Captured amount.
        amount: Money,
        /// When.
        at: DateTime<Utc>,
    },

    /// Payment failed (consumed from the payments queue).
    PaymentFailed {
        /// The order.
        order_id: OrderId,
        /// Provider-reported reason.
        reason: String,
        /// When.
        at: DateTime<Utc>,
    },

    /// A shipper was assigned to a shipment leg.
    ShipmentAssigned {
        /// The shipment.
        shipment_id: ShipmentId,
        /// Tracking number.
        tracking_number: TrackingNumber,
        /// Assigned shipper.
        shipper_id: ShipperId,
        /// When.
        at: DateTime<Utc>,
    },

    /// No shipper could be assigned to a shipment leg.
    ShipmentUnassigned {
        /// The shipment.
        shipment_id: ShipmentId,
        /// Why dispatch failed.
        reason: String,
        /// When.
        at: DateTime<Utc>,
    },

    /// A shipment changed status.
    ShipmentStatusChanged {
        /// The shipment.
        shipment_id: ShipmentId,
        /// Tracking number.
        tracking_number: TrackingNumber,
        /// New unified status.
        status: UnifiedShippingStatus,
        /// When.
        at: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// The queue this event belongs on.
    #[must_use]
    pub const fn queue(&self) -> QueueName {
        match self {
            Self::OrderStatusChanged { .. }
            | Self::OrderCancelled { .. }
            | Self::OrderCompleted { .. } => QueueName::Orders,
            Self::PaymentSucceeded { .. } | Self::PaymentFailed { .. } => QueueName::Payments,
            Self::ShipmentAssigned { .. }
            | Self::ShipmentUnassigned { .. }
            | Self::ShipmentStatusChanged { .. } => QueueName::Shipments,
        }
    }

    /// Dotted event name used in envelopes and consumer bindings.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OrderStatusChanged { .. } => "order.status_changed",
            Self::OrderCancelled { .. } => "order.cancelled",
            Self::OrderCompleted { .. } => "order.completed",
            Self::PaymentSucceeded { .. } => "payment.succeeded",
            Self::PaymentFailed { .. } => "payment.failed",
            Self::ShipmentAssigned { .. } => "shipment.assigned",
            Self::ShipmentUnassigned { .. } => "shipment.unassigned",
            Self::ShipmentStatusChanged { .. } => "shipment.status_changed",
        }
    }

    /// Versioned schema tag (`<name>.v1`).
    #[must_use]
    pub fn schema(&self) -> String {
        format!("{}.v1", self.name())
    }

    /// Wire envelope: `{schema, event, payload}`.
    #[must_use]
    pub fn to_envelope(&self) -> Value {
        serde_json::json!({
            "schema": self.schema(),
            "payload": self,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed_event() -> DomainEvent {
        DomainEvent::OrderCompleted {
            order_id: OrderId::new("ord-1"),
            at: Utc::now(),
        }
    }

    #[test]
    fn queue_routing() {
        assert_eq!(completed_event().queue(), QueueName::Orders);
        assert_eq!(
            DomainEvent::PaymentFailed {
                order_id: OrderId::new("ord-1"),
                reason: "declined".to_string(),
                at: Utc::now(),
            }
            .queue(),
            QueueName::Payments
        );
        assert_eq!(
            DomainEvent::ShipmentUnassigned {
                shipment_id: ShipmentId::new("shm-1"),
                reason: "no shipper".to_string(),
                at: Utc::now(),
            }
            .queue(),
            QueueName::Shipments
        );
    }

    #[test]
    fn envelope_carries_versioned_schema() {
        let env = completed_event().to_envelope();
        assert_eq!(env["schema"], "order.completed.v1");
        assert_eq!(env["payload"]["event"], "order_completed");
    }

    #[test]
    fn event_serde_round_trip() {
        let event = DomainEvent::ShipmentStatusChanged {
            shipment_id: ShipmentId::new("shm-1"),
            tracking_number: TrackingNumber::new("TRK-9"),
            status: UnifiedShippingStatus::Delivering,
            at: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: DomainEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn queue_names_on_broker() {
        assert_eq!(QueueName::Orders.as_str(), "orders");
        assert_eq!(QueueName::Notifications.as_str(), "notifications");
    }
}
