//! The shipment aggregate: one physical parcel moving through legs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::shared::{
    Address, Contact, Money, ProviderOrderId, ShipmentId, ShopId, SubOrderId, TrackingNumber,
};
use crate::providers::ProviderCode;

use super::leg::ShipmentLeg;
use super::status::UnifiedShippingStatus;

/// Errors raised by shipment mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShipmentError {
    /// A status write was attempted after a terminal observation.
    #[error("shipment is terminal ({status}), only history appends are permitted")]
    AlreadyTerminal {
        /// The terminal status.
        status: UnifiedShippingStatus,
    },

    /// COD collection recorded outside a delivered shipment.
    #[error("cod can only be collected on delivery (status {status})")]
    CodOutsideDelivery {
        /// Current status.
        status: UnifiedShippingStatus,
    },
}

/// Parcel weight and declared value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Total weight in grams.
    pub weight_grams: u32,
    /// Declared value (insurance / COD basis).
    pub declared_value: Money,
    /// Free-form contents description for the carrier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One append-only entry in the shipment's status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unified status asserted by the update.
    pub status: UnifiedShippingStatus,
    /// Raw provider token the status was normalized from.
    pub provider_status: String,
    /// When the update was observed.
    pub at: DateTime<Utc>,
    /// Human-readable note, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Provider-specific extras that have no unified field.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

/// How dispatch left the shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    /// Not yet dispatched.
    #[default]
    Unassigned,
    /// All shipper legs have an assignee.
    Assigned,
    /// Dispatch ran and found no eligible shipper.
    NoShipperAvailable,
}

/// Outcome of applying a status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusApplied {
    /// The current status moved to the new value.
    Updated,
    /// The update was appended to history only (stale or post-terminal).
    HistoryOnly,
}

/// A physical parcel: provider handle, addresses, COD, legs, and its
/// append-only status history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    /// Unique id.
    pub id: ShipmentId,
    /// Fulfilled sub-order.
    pub sub_order_id: SubOrderId,
    /// Shop the parcel ships from (provider configs are per shop).
    pub shop_id: ShopId,
    /// Unique tracking number.
    pub tracking_number: TrackingNumber,
    /// Carrier moving the parcel.
    pub provider_code: ProviderCode,
    /// Carrier-side order id, for external carriers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_order_id: Option<ProviderOrderId>,
    /// Current unified status.
    pub status: UnifiedShippingStatus,
    /// Dispatch outcome for in-house shipments.
    #[serde(default)]
    pub dispatch_state: DispatchState,
    /// Pickup address.
    pub pickup_address: Address,
    /// Pickup contact (the seller).
    pub pickup_contact: Contact,
    /// Delivery address.
    pub delivery_address: Address,
    /// Delivery contact (the customer).
    pub delivery_contact: Contact,
    /// Parcel weight and value.
    pub package: PackageInfo,
    /// Cash to collect on delivery; zero for prepaid orders.
    pub cod_amount: Money,
    /// Whether the COD cash has been collected.
    pub cod_collected: bool,
    /// Movement plan.
    #[serde(default)]
    pub legs: Vec<ShipmentLeg>,
    /// When the parcel was picked up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picked_up_at: Option<DateTime<Utc>>,
    /// When the parcel was delivered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    /// When the shipping order was cancelled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Last webhook observation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_webhook_at: Option<DateTime<Utc>>,
    /// Dispatch retry counter.
    pub retry_count: u32,
    /// Append-only status history.
    pub history: Vec<HistoryEntry>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl Shipment {
    /// Create a new shipment in `created`.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sub_order_id: SubOrderId,
        shop_id: ShopId,
        tracking_number: TrackingNumber,
        provider_code: ProviderCode,
        pickup_address: Address,
        pickup_contact: Contact,
        delivery_address: Address,
        delivery_contact: Contact,
        package: PackageInfo,
        cod_amount: Money,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ShipmentId::generate(),
            sub_order_id,
            shop_id,
            tracking_number,
            provider_code,
            provider_order_id: None,
            status: UnifiedShippingStatus::Created,
            dispatch_state: DispatchState::default(),
            pickup_address,
            pickup_contact,
            delivery_address,
            delivery_contact,
            package,
            cod_amount,
            cod_collected: false,
            legs: Vec::new(),
            picked_up_at: None,
            delivered_at: None,
            cancelled_at: None,
            last_webhook_at: None,
            retry_count: 0,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a status observation under the reconciliation rule.
    ///
    /// The entry is always appended to history. The current status moves
    /// only when the shipment is not already terminal and the incoming
    /// priority is greater than or equal to the stored one; otherwise the
    /// update is history-only and the status is never downgraded.
    pub fn record_status(&mut self, entry: HistoryEntry) -> StatusApplied {
        let incoming = entry.status;
        let at = entry.at;
        self.history.push(entry);
        self.updated_at = at;

        if self.status.is_terminal() || incoming.priority() < self.status.priority() {
            return StatusApplied::HistoryOnly;
        }

        self.status = incoming;
        match incoming {
            UnifiedShippingStatus::PickedUp => self.picked_up_at = Some(at),
            UnifiedShippingStatus::Delivered => self.delivered_at = Some(at),
            UnifiedShippingStatus::Cancelled => self.cancelled_at = Some(at),
            _ => {}
        }
        StatusApplied::Updated
    }

    /// Record the COD cash as collected.
    ///
    /// # Errors
    ///
    /// Returns `CodOutsideDelivery` unless the shipment is delivered.
    pub fn mark_cod_collected(&mut self) -> Result<(), ShipmentError> {
        if !self.status.is_success() {
            return Err(ShipmentError::CodOutsideDelivery {
                status: self.status,
            });
        }
        self.cod_collected = true;
        Ok(())
    }

    /// Whether any leg still lacks a shipper assignment.
    #[must_use]
    pub fn has_unassigned_shipper_leg(&self) -> bool {
        self.legs
            .iter()
            .any(|leg| leg.requires_shipper() && leg.shipper_id.is_none())
    }
}

/// Convenience constructor for a history entry with no extras.
impl HistoryEntry {
    /// Create an entry from a unified status and its raw provider token.
    #[must_use]
    pub fn new(
        status: UnifiedShippingStatus,
        provider_status: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            status,
            provider_status: provider_status.into(),
            at,
            message: None,
            extra: BTreeMap::new(),
        }
    }

    /// Attach a human-readable note.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach a provider-specific extra field.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::Region;

    fn address() -> Address {
        Address {
            line: "1 Tràng Tiền".to_string(),
            ward: None,
            district: "Hoàn Kiếm".to_string(),
            city: "Hà Nội".to_string(),
            region: Some(Region::North),
            location: None,
        }
    }

    fn contact() -> Contact {
        Contact {
            name: "Trần B".to_string(),
            phone: "0912345678".to_string(),
        }
    }

    fn shipment() -> Shipment {
        Shipment::new(
            SubOrderId::new("sub-1"),
            ShopId::new("shop-x"),
            TrackingNumber::new("TRK-1"),
            ProviderCode::InHouse,
            address(),
            contact(),
            address(),
            contact(),
            PackageInfo {
                weight_grams: 500,
                declared_value: Money::from_vnd(350_000),
                description: None,
            },
            Money::from_vnd(350_000),
            Utc::now(),
        )
    }

    #[test]
    fn status_updates_follow_priority() {
        let mut s = shipment();
        let now = Utc::now();

        let applied = s.record_status(HistoryEntry::new(
            UnifiedShippingStatus::Delivered,
            "4",
            now,
        ));
        assert_eq!(applied, StatusApplied::Updated);
        assert_eq!(s.status, UnifiedShippingStatus::Delivered);
        assert_eq!(s.delivered_at, Some(now));
    }

    #[test]
    fn stale_update_is_history_only() {
        let mut s = shipment();
        let now = Utc::now();
        s.record_status(HistoryEntry::new(UnifiedShippingStatus::Delivered, "4", now));

        // A stray "delivering" webhook arrives after delivery.
        let applied = s.record_status(HistoryEntry::new(
            UnifiedShippingStatus::Delivering,
            "3",
            now,
        ));
        assert_eq!(applied, StatusApplied::HistoryOnly);
        assert_eq!(s.status, UnifiedShippingStatus::Delivered);
        assert_eq!(s.history.len(), 2);
    }

    #[test]
    fn terminal_shipment_only_appends() {
        let mut s = shipment();
        let now = Utc::now();
        s.record_status(HistoryEntry::new(UnifiedShippingStatus::Cancelled, "-1", now));

        // Cancelled has the highest priority but the shipment is terminal.
        let applied = s.record_status(HistoryEntry::new(
            UnifiedShippingStatus::Cancelled,
            "-1",
            now,
        ));
        assert_eq!(applied, StatusApplied::HistoryOnly);
    }

    #[test]
    fn equal_priority_update_wins() {
        let mut s = shipment();
        let now = Utc::now();
        s.record_status(HistoryEntry::new(
            UnifiedShippingStatus::Delivering,
            "3",
            now,
        ));
        let applied = s.record_status(
            HistoryEntry::new(UnifiedShippingStatus::Delivering, "3", now)
                .with_message("second attempt"),
        );
        assert_eq!(applied, StatusApplied::Updated);
    }

    #[test]
    fn cod_collection_requires_delivery() {
        let mut s = shipment();
        assert!(s.mark_cod_collected().is_err());
        assert!(!s.cod_collected);

        s.record_status(HistoryEntry::new(
            UnifiedShippingStatus::Delivered,
            "4",
            Utc::now(),
        ));
        s.mark_cod_collected().unwrap();
        assert!(s.cod_collected);
    }

    #[test]
    fn history_entry_extras() {
        let entry = HistoryEntry::new(UnifiedShippingStatus::Failed, "5", Utc::now())
            .with_message("customer unreachable")
            .with_extra("attempt", serde_json::json!(2));
        assert_eq!(entry.extra["attempt"], 2);
    }
}
