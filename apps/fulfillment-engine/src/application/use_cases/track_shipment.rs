//! Tracking reads.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{OrderRepository, ShipmentRepository};
use crate::domain::shared::TrackingNumber;
use crate::domain::shipment::TrackingEvent;
use crate::error::AppError;
use crate::providers::{ShippingGateway, TrackingSnapshot};

/// Use case: read tracking state and history.
pub struct TrackShipmentUseCase {
    shipments: Arc<dyn ShipmentRepository>,
    orders: Arc<dyn OrderRepository>,
    gateway: Arc<ShippingGateway>,
}

impl TrackShipmentUseCase {
    /// Wire the use case.
    #[must_use]
    pub fn new(
        shipments: Arc<dyn ShipmentRepository>,
        orders: Arc<dyn OrderRepository>,
        gateway: Arc<ShippingGateway>,
    ) -> Self {
        Self {
            shipments,
            orders,
            gateway,
        }
    }

    /// Current tracking state via the facade (cache, retry, stale
    /// fallback all included).
    pub async fn current(
        &self,
        tracking_number: &TrackingNumber,
        cancel: &CancellationToken,
    ) -> Result<TrackingSnapshot, AppError> {
        let shipment = self
            .shipments
            .find_by_tracking_number(tracking_number)
            .await?
            .ok_or_else(|| AppError::not_found("shipment", tracking_number))?;

        self.gateway
            .get_tracking(
                &shipment.shop_id,
                shipment.provider_code,
                tracking_number,
                cancel,
            )
            .await
    }

    /// The order-timeline events of the shipment's sub-order.
    pub async fn history(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<Vec<TrackingEvent>, AppError> {
        let shipment = self
            .shipments
            .find_by_tracking_number(tracking_number)
            .await?
            .ok_or_else(|| AppError::not_found("shipment", tracking_number))?;
        self.orders.list_tracking_events(&shipment.sub_order_id).await
    }
}
