//! Shipment legs.
//!
//! A leg is one physical movement of the parcel: customer to office,
//! office to hub, hub to hub, or office to customer. Only the first and
//! last mile take an in-house shipper; hub transfers ride line-haul trucks.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{PostOfficeId, ShipperId};

/// What kind of movement a leg is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegKind {
    /// Customer (seller) to the pickup office.
    Pickup,
    /// Office-to-office or hub-to-hub transfer.
    Linehaul,
    /// Delivery office to the customer.
    Delivery,
}

/// One endpoint of a leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "office_id")]
pub enum LegPoint {
    /// The seller's or customer's address.
    Customer,
    /// A post office.
    Office(PostOfficeId),
}

/// A single movement of the parcel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentLeg {
    /// Movement kind.
    pub kind: LegKind,
    /// Where the leg starts.
    pub from: LegPoint,
    /// Where the leg ends.
    pub to: LegPoint,
    /// Office whose roster serves this leg, when a shipper is needed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub office_id: Option<PostOfficeId>,
    /// Assigned shipper, once dispatched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipper_id: Option<ShipperId>,
}

impl ShipmentLeg {
    /// Pickup leg served by the given office.
    #[must_use]
    pub fn pickup(office_id: PostOfficeId) -> Self {
        Self {
            kind: LegKind::Pickup,
            from: LegPoint::Customer,
            to: LegPoint::Office(office_id.clone()),
            office_id: Some(office_id),
            shipper_id: None,
        }
    }

    /// Delivery leg served by the given office.
    #[must_use]
    pub fn delivery(office_id: PostOfficeId) -> Self {
        Self {
            kind: LegKind::Delivery,
            from: LegPoint::Office(office_id.clone()),
            to: LegPoint::Customer,
            office_id: Some(office_id),
            shipper_id: None,
        }
    }

    /// Line-haul transfer between two offices.
    #[must_use]
    pub const fn linehaul(from: PostOfficeId, to: PostOfficeId) -> Self {
        Self {
            kind: LegKind::Linehaul,
            from: LegPoint::Office(from),
            to: LegPoint::Office(to),
            office_id: None,
            shipper_id: None,
        }
    }

    /// Whether the dispatcher must find an in-house shipper for this leg.
    #[must_use]
    pub const fn requires_shipper(&self) -> bool {
        !matches!(self.kind, LegKind::Linehaul)
    }
}
