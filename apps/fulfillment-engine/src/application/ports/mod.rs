//! Driven ports: repositories, cache, bus, and collaborator contracts.

pub mod cache_port;
pub mod catalog_port;
pub mod dispatch_repository;
pub mod event_bus_port;
pub mod inventory_port;
pub mod order_repository;
pub mod provider_config_repository;
pub mod refund_port;
pub mod shipment_repository;
pub mod shop_directory;

pub use cache_port::CachePort;
pub use catalog_port::{CatalogPort, ProductSnapshot};
pub use dispatch_repository::{PostOfficeRepository, ShipperRepository};
pub use event_bus_port::{EventBusPort, publish_or_log};
pub use inventory_port::InventoryPort;
pub use order_repository::OrderRepository;
pub use provider_config_repository::{ProviderConfig, ProviderConfigRepository};
pub use refund_port::{RefundPort, RefundReceipt};
pub use shipment_repository::ShipmentRepository;
pub use shop_directory::{InMemoryShopDirectory, ShopDirectoryPort, ShopProfile};
