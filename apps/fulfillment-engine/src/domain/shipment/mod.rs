//! Shipment domain: parcels, legs, unified statuses, and tracking history.

pub mod leg;
pub mod shipment;
pub mod status;
pub mod tracking;

pub use leg::{LegKind, LegPoint, ShipmentLeg};
pub use shipment::{
    DispatchState, HistoryEntry, PackageInfo, Shipment, ShipmentError, StatusApplied,
};
pub use status::UnifiedShippingStatus;
pub use tracking::{TrackingEvent, TrackingEventKind};
