//! In-house shippers and their daily capacity counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::shared::{GeoPoint, PostOfficeId, ShipperId, UserId};

/// Employment state of a shipper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipperStatus {
    /// Application received, not yet vetted.
    Pending,
    /// Working.
    Active,
    /// Temporarily barred.
    Suspended,
    /// Left the fleet.
    Inactive,
}

/// What the shipper rides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    /// Motorbike (the default in dense cities).
    Motorbike,
    /// Small van.
    Van,
    /// Truck, for bulky freight.
    Truck,
}

/// Which daily counter a leg consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterKind {
    /// Pickup legs.
    Pickup,
    /// Delivery legs.
    Delivery,
}

/// An in-house shipper assigned to a post office roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipper {
    /// Unique id.
    pub id: ShipperId,
    /// Backing user account.
    pub user_id: UserId,
    /// Roster the shipper belongs to.
    pub post_office_id: PostOfficeId,
    /// Vehicle.
    pub vehicle: VehicleType,
    /// Employment state.
    pub status: ShipperStatus,
    /// Whether the shipper app is connected.
    pub is_online: bool,
    /// Whether the shipper accepts new assignments.
    pub is_available: bool,
    /// Last reported position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    /// Pickup legs assigned today.
    pub current_pickup_count: u32,
    /// Delivery legs assigned today.
    pub current_delivery_count: u32,
    /// Daily cap across both counters.
    pub max_daily_orders: u32,
    /// Average customer rating, 0.0 – 5.0.
    pub rating: f64,
    /// Lifetime delivered parcels.
    pub total_delivered: u64,
    /// Last heartbeat from the shipper app.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_heartbeat_at: Option<DateTime<Utc>>,
}

impl Shipper {
    /// The current value of one counter.
    #[must_use]
    pub const fn counter(&self, kind: CounterKind) -> u32 {
        match kind {
            CounterKind::Pickup => self.current_pickup_count,
            CounterKind::Delivery => self.current_delivery_count,
        }
    }

    /// Combined load across both counters.
    #[must_use]
    pub const fn total_load(&self) -> u32 {
        self.current_pickup_count + self.current_delivery_count
    }

    /// Whether one more assignment fits under the daily cap.
    #[must_use]
    pub const fn has_capacity(&self) -> bool {
        self.total_load() + 1 <= self.max_daily_orders
    }

    /// Whether this shipper can be considered for dispatch at all.
    #[must_use]
    pub const fn is_dispatchable(&self) -> bool {
        matches!(self.status, ShipperStatus::Active) && self.is_online && self.is_available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipper(pickup: u32, delivery: u32, max: u32) -> Shipper {
        Shipper {
            id: ShipperId::new("shp-1"),
            user_id: UserId::new("u-shp-1"),
            post_office_id: PostOfficeId::new("po-1"),
            vehicle: VehicleType::Motorbike,
            status: ShipperStatus::Active,
            is_online: true,
            is_available: true,
            location: None,
            current_pickup_count: pickup,
            current_delivery_count: delivery,
            max_daily_orders: max,
            rating: 4.8,
            total_delivered: 120,
            last_heartbeat_at: Some(Utc::now()),
        }
    }

    #[test]
    fn capacity_counts_both_counters() {
        assert!(shipper(4, 5, 10).has_capacity());
        assert!(!shipper(5, 5, 10).has_capacity());
    }

    #[test]
    fn dispatchable_requires_all_flags() {
        let mut s = shipper(0, 0, 10);
        assert!(s.is_dispatchable());

        s.is_online = false;
        assert!(!s.is_dispatchable());

        s.is_online = true;
        s.status = ShipperStatus::Suspended;
        assert!(!s.is_dispatchable());
    }

    #[test]
    fn counter_selection() {
        let s = shipper(3, 7, 20);
        assert_eq!(s.counter(CounterKind::Pickup), 3);
        assert_eq!(s.counter(CounterKind::Delivery), 7);
    }
}
