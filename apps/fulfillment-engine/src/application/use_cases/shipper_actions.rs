//! Shipper-side actions: pickup, deliver, fail, availability, heartbeat.
//!
//! In-house status truth comes from these actions (external carriers
//! report through webhooks instead). Every change lands in the durable
//! tracking history, on the event bus, and on the push channel.

use chrono::Utc;
use std::sync::Arc;

use crate::application::ports::{
    EventBusPort, OrderRepository, ShipmentRepository, ShipperRepository, publish_or_log,
};
use crate::domain::dispatch::Shipper;
use crate::domain::order::{DomainEvent, SubOrder, SubOrderStatus};
use crate::domain::shared::{Actor, ShipmentId};
use crate::domain::shipment::{
    HistoryEntry, LegKind, Shipment, StatusApplied, TrackingEvent, TrackingEventKind,
    UnifiedShippingStatus,
};
use crate::error::AppError;
use crate::realtime::{ChannelKey, PushHub, PushMessage};

/// Shipper operations.
pub struct ShipperActionsUseCase {
    orders: Arc<dyn OrderRepository>,
    shipments: Arc<dyn ShipmentRepository>,
    shippers: Arc<dyn ShipperRepository>,
    bus: Arc<dyn EventBusPort>,
    hub: Arc<PushHub>,
}

impl ShipperActionsUseCase {
    /// Wire the use case.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        shipments: Arc<dyn ShipmentRepository>,
        shippers: Arc<dyn ShipperRepository>,
        bus: Arc<dyn EventBusPort>,
        hub: Arc<PushHub>,
    ) -> Self {
        Self {
            orders,
            shipments,
            shippers,
            bus,
            hub,
        }
    }

    async fn load_shipment_for(
        &self,
        actor: &Actor,
        shipment_id: &ShipmentId,
        leg_kind: LegKind,
    ) -> Result<(Shipment, Shipper), AppError> {
        let shipment = self
            .shipments
            .find(shipment_id)
            .await?
            .ok_or_else(|| AppError::not_found("shipment", shipment_id))?;
        let shipper = self
            .shippers
            .find_by_user(&actor.user_id)
            .await?
            .ok_or_else(|| AppError::forbidden("actor is not a shipper"))?;

        let assigned = shipment
            .legs
            .iter()
            .any(|leg| leg.kind == leg_kind && leg.shipper_id.as_ref() == Some(&shipper.id));
        if !assigned && !actor.is_privileged() {
            return Err(AppError::forbidden("shipment leg is assigned to someone else"));
        }
        Ok((shipment, shipper))
    }

    async fn apply_status(
        &self,
        shipment: &mut Shipment,
        entry: HistoryEntry,
    ) -> Result<StatusApplied, AppError> {
        let applied = shipment.record_status(entry);
        self.shipments.save(shipment).await?;

        if applied == StatusApplied::Updated {
            publish_or_log(
                &*self.bus,
                &DomainEvent::ShipmentStatusChanged {
                    shipment_id: shipment.id.clone(),
                    tracking_number: shipment.tracking_number.clone(),
                    status: shipment.status,
                    at: shipment.updated_at,
                },
            )
            .await;
            self.hub.publish(
                &ChannelKey::shipment(shipment.id.as_str()),
                &PushMessage::shipment_status(serde_json::json!({
                    "shipment_id": shipment.id,
                    "tracking_number": shipment.tracking_number,
                    "status": shipment.status,
                })),
            );
        }
        Ok(applied)
    }

    async fn sub_order_of(&self, shipment: &Shipment) -> Result<SubOrder, AppError> {
        self.orders
            .find_sub_order(&shipment.sub_order_id)
            .await?
            .ok_or_else(|| AppError::not_found("sub-order", &shipment.sub_order_id))
    }

    async fn publish_order_change(&self, sub_order: &SubOrder) {
        let order_status = match self.orders.find_order(&sub_order.order_id).await {
            Ok(Some(order)) => order.status,
            _ => crate::domain::order::OrderStatus::Processing,
        };
        publish_or_log(
            &*self.bus,
            &DomainEvent::OrderStatusChanged {
                order_id: sub_order.order_id.clone(),
                sub_order_id: Some(sub_order.id.clone()),
                order_status,
                sub_order_status: Some(sub_order.status),
                at: sub_order.updated_at,
            },
        )
        .await;
        self.hub.publish(
            &ChannelKey::order(sub_order.order_id.as_str()),
            &PushMessage::order_status(serde_json::json!({
                "order_id": sub_order.order_id,
                "sub_order_id": sub_order.id,
                "status": sub_order.status,
            })),
        );
    }

    /// Shipper picked the parcel up from the seller.
    pub async fn pickup(
        &self,
        actor: &Actor,
        shipment_id: &ShipmentId,
    ) -> Result<Shipment, AppError> {
        let (mut shipment, _shipper) = self
            .load_shipment_for(actor, shipment_id, LegKind::Pickup)
            .await?;
        let now = Utc::now();

        self.apply_status(
            &mut shipment,
            HistoryEntry::new(UnifiedShippingStatus::PickedUp, "picked_up", now),
        )
        .await?;

        let mut sub_order = self.sub_order_of(&shipment).await?;
        sub_order.transition_to(SubOrderStatus::Shipping, now)?;
        self.orders.save_sub_order(&sub_order).await?;
        self.orders
            .append_tracking_event(&TrackingEvent::new(
                sub_order.id.clone(),
                TrackingEventKind::StatusChanged,
                "Shipper đã lấy hàng".to_string(),
                actor.role,
                now,
            ))
            .await?;
        self.publish_order_change(&sub_order).await;

        Ok(shipment)
    }

    /// Shipper handed the parcel to the customer. COD cash is collected
    /// with the handover.
    pub async fn deliver(
        &self,
        actor: &Actor,
        shipment_id: &ShipmentId,
    ) -> Result<Shipment, AppError> {
        let (mut shipment, mut shipper) = self
            .load_shipment_for(actor, shipment_id, LegKind::Delivery)
            .await?;
        let now = Utc::now();

        self.apply_status(
            &mut shipment,
            HistoryEntry::new(UnifiedShippingStatus::Delivered, "delivered", now),
        )
        .await?;
        if !shipment.cod_amount.is_zero() {
            shipment.mark_cod_collected()?;
            self.shipments.save(&shipment).await?;
        }

        let mut sub_order = self.sub_order_of(&shipment).await?;
        sub_order.mark_delivered(now)?;
        self.orders.save_sub_order(&sub_order).await?;
        self.orders
            .append_tracking_event(&TrackingEvent::new(
                sub_order.id.clone(),
                TrackingEventKind::StatusChanged,
                "Giao hàng thành công".to_string(),
                actor.role,
                now,
            ))
            .await?;
        self.publish_order_change(&sub_order).await;

        shipper.total_delivered += 1;
        self.shippers.save(&shipper).await?;

        Ok(shipment)
    }

    /// A delivery attempt failed. The sub-order stays `shipping`; ops
    /// decides between retry and return.
    pub async fn fail(
        &self,
        actor: &Actor,
        shipment_id: &ShipmentId,
        reason: &str,
    ) -> Result<Shipment, AppError> {
        let (mut shipment, _shipper) = self
            .load_shipment_for(actor, shipment_id, LegKind::Delivery)
            .await?;
        let now = Utc::now();

        self.apply_status(
            &mut shipment,
            HistoryEntry::new(UnifiedShippingStatus::Failed, "failed", now)
                .with_message(reason.to_string()),
        )
        .await?;

        let sub_order = self.sub_order_of(&shipment).await?;
        self.orders
            .append_tracking_event(&TrackingEvent::new(
                sub_order.id.clone(),
                TrackingEventKind::DeliveryFailed,
                format!("Giao hàng thất bại: {reason}"),
                actor.role,
                now,
            ))
            .await?;

        Ok(shipment)
    }

    /// Resolve the shipper record behind an actor.
    pub async fn current_shipper(&self, actor: &Actor) -> Result<Shipper, AppError> {
        self.shippers
            .find_by_user(&actor.user_id)
            .await?
            .ok_or_else(|| AppError::forbidden("actor is not a shipper"))
    }

    /// Shipper toggles availability / online flags from the app.
    pub async fn set_availability(
        &self,
        actor: &Actor,
        is_online: bool,
        is_available: bool,
    ) -> Result<Shipper, AppError> {
        let mut shipper = self
            .shippers
            .find_by_user(&actor.user_id)
            .await?
            .ok_or_else(|| AppError::forbidden("actor is not a shipper"))?;
        shipper.is_online = is_online;
        shipper.is_available = is_available;
        shipper.last_heartbeat_at = Some(Utc::now());
        self.shippers.save(&shipper).await?;
        Ok(shipper)
    }
}
