//! In-memory persistence adapters for testing and development.
//!
//! Production deployments put SQL implementations behind the same ports;
//! the conditional-update semantics the dispatcher relies on are part of
//! the port contract, not of this module.

pub mod collaborators;
pub mod dispatch;
pub mod orders;
pub mod provider_configs;
pub mod shipments;

pub use collaborators::{InMemoryCatalog, InMemoryInventory, RecordingRefundPort};
pub use dispatch::{InMemoryPostOfficeRepository, InMemoryShipperRepository};
pub use orders::InMemoryOrderRepository;
pub use provider_configs::InMemoryProviderConfigRepository;
pub use shipments::InMemoryShipmentRepository;
