//! Shared domain value objects.

pub mod actor;
pub mod address;
pub mod identifiers;
pub mod money;

pub use actor::{Actor, Role};
pub use address::{Address, Contact, GeoPoint, Region};
pub use identifiers::{
    OrderId, OrderItemId, PostOfficeId, ProviderOrderId, ShipmentId, ShipperId, ShopId,
    SubOrderId, TrackingNumber, UserId, VariantId,
};
pub use money::Money;
