//! Dispatch domain: post offices, hubs, and the shipper fleet.

pub mod post_office;
pub mod shipper;

pub use post_office::{OfficeType, PostOffice};
pub use shipper::{CounterKind, Shipper, ShipperStatus, VehicleType};
