//! Append-only tracking events on sub-orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::shared::{Role, SubOrderId};

/// What a tracking event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingEventKind {
    /// Order placed at checkout.
    OrderPlaced,
    /// Payment captured.
    PaymentConfirmed,
    /// Sub-order or shipment status moved.
    StatusChanged,
    /// A shipper was assigned.
    ShipmentAssigned,
    /// Dispatch could not find a shipper.
    ShipmentUnassigned,
    /// A delivery attempt failed.
    DeliveryFailed,
    /// Receipt-confirmation coins granted.
    RewardGranted,
    /// Free-form note from a participant.
    Note,
}

/// One append-only tracking event, shown on the order timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEvent {
    /// Unique id.
    pub id: String,
    /// Sub-order this event belongs to.
    pub sub_order_id: SubOrderId,
    /// Event kind.
    pub kind: TrackingEventKind,
    /// Human-readable description.
    pub description: String,
    /// Role of whoever caused the event.
    pub actor_role: Role,
    /// When the event happened.
    pub created_at: DateTime<Utc>,
}

impl TrackingEvent {
    /// Create a new tracking event.
    #[must_use]
    pub fn new(
        sub_order_id: SubOrderId,
        kind: TrackingEventKind,
        description: impl Into<String>,
        actor_role: Role,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sub_order_id,
            kind,
            description: description.into(),
            actor_role,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_event_construction() {
        let e = TrackingEvent::new(
            SubOrderId::new("sub-1"),
            TrackingEventKind::PaymentConfirmed,
            "Thanh toán thành công",
            Role::System,
            Utc::now(),
        );
        assert_eq!(e.kind, TrackingEventKind::PaymentConfirmed);
        assert!(!e.id.is_empty());
    }

    #[test]
    fn kind_serde_token() {
        let json = serde_json::to_string(&TrackingEventKind::ShipmentUnassigned).unwrap();
        assert_eq!(json, "\"shipment_unassigned\"");
    }
}
