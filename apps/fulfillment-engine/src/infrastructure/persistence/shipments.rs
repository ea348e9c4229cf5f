//! In-memory shipment repository for testing and development.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::application::ports::ShipmentRepository;
use crate::domain::shared::{ProviderOrderId, ShipmentId, SubOrderId, TrackingNumber};
use crate::domain::shipment::Shipment;
use crate::error::AppError;

/// In-memory implementation of [`ShipmentRepository`].
///
/// Suitable for testing and development. Not for production use.
#[derive(Default)]
pub struct InMemoryShipmentRepository {
    shipments: RwLock<HashMap<ShipmentId, Shipment>>,
}

impl InMemoryShipmentRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored shipments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shipments.read().len()
    }

    /// Whether the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shipments.read().is_empty()
    }
}

#[async_trait]
impl ShipmentRepository for InMemoryShipmentRepository {
    async fn save(&self, shipment: &Shipment) -> Result<(), AppError> {
        self.shipments
            .write()
            .insert(shipment.id.clone(), shipment.clone());
        Ok(())
    }

    async fn find(&self, id: &ShipmentId) -> Result<Option<Shipment>, AppError> {
        Ok(self.shipments.read().get(id).cloned())
    }

    async fn find_by_tracking_number(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<Option<Shipment>, AppError> {
        Ok(self
            .shipments
            .read()
            .values()
            .find(|s| &s.tracking_number == tracking_number)
            .cloned())
    }

    async fn find_by_provider_order_id(
        &self,
        provider_order_id: &ProviderOrderId,
    ) -> Result<Option<Shipment>, AppError> {
        Ok(self
            .shipments
            .read()
            .values()
            .find(|s| s.provider_order_id.as_ref() == Some(provider_order_id))
            .cloned())
    }

    async fn find_by_sub_order(
        &self,
        sub_order_id: &SubOrderId,
    ) -> Result<Option<Shipment>, AppError> {
        Ok(self
            .shipments
            .read()
            .values()
            .find(|s| &s.sub_order_id == sub_order_id)
            .cloned())
    }

    async fn list_active(&self) -> Result<Vec<Shipment>, AppError> {
        let mut active: Vec<Shipment> = self
            .shipments
            .read()
            .values()
            .filter(|s| !s.status.is_terminal())
            .cloned()
            .collect();
        active.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(active)
    }
}
