//! Shipment Repository Port (Driven Port)

use async_trait::async_trait;

use crate::domain::shared::{ProviderOrderId, ShipmentId, SubOrderId, TrackingNumber};
use crate::domain::shipment::Shipment;
use crate::error::AppError;

/// Port for shipment persistence.
#[async_trait]
pub trait ShipmentRepository: Send + Sync {
    /// Insert or update a shipment.
    async fn save(&self, shipment: &Shipment) -> Result<(), AppError>;

    /// Find a shipment by id.
    async fn find(&self, id: &ShipmentId) -> Result<Option<Shipment>, AppError>;

    /// Find a shipment by its unique tracking number.
    async fn find_by_tracking_number(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<Option<Shipment>, AppError>;

    /// Find a shipment by the provider-side order id (webhook lookups).
    async fn find_by_provider_order_id(
        &self,
        provider_order_id: &ProviderOrderId,
    ) -> Result<Option<Shipment>, AppError>;

    /// Find the shipment of a sub-order.
    async fn find_by_sub_order(
        &self,
        sub_order_id: &SubOrderId,
    ) -> Result<Option<Shipment>, AppError>;

    /// All shipments not yet in a terminal status.
    async fn list_active(&self) -> Result<Vec<Shipment>, AppError>;
}
