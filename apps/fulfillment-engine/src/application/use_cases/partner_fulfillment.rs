//! Partner-side fulfillment: confirm, process, pack, cancel.
//!
//! Packing is the seam between the order state machine and the shipment
//! lifecycle: it creates the shipment at the shop's default carrier (the
//! in-house fleet when none is configured) and, for in-house parcels,
//! runs the dispatcher.

use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    EventBusPort, InventoryPort, OrderRepository, ProviderConfigRepository, ShipmentRepository,
    ShopDirectoryPort, publish_or_log,
};
use crate::dispatch::ShipperDispatcher;
use crate::domain::order::{DomainEvent, Order, OrderStatus, SubOrder, SubOrderStatus};
use crate::domain::shared::{Actor, Money, SubOrderId};
use crate::domain::shipment::{
    PackageInfo, Shipment, TrackingEvent, TrackingEventKind,
};
use crate::error::AppError;
use crate::providers::{CreateShipmentRequest, ProviderCode, ShippingGateway};

/// Partner fulfillment operations.
pub struct PartnerFulfillmentUseCase {
    orders: Arc<dyn OrderRepository>,
    shipments: Arc<dyn ShipmentRepository>,
    shops: Arc<dyn ShopDirectoryPort>,
    configs: Arc<dyn ProviderConfigRepository>,
    inventory: Arc<dyn InventoryPort>,
    gateway: Arc<ShippingGateway>,
    dispatcher: Arc<ShipperDispatcher>,
    bus: Arc<dyn EventBusPort>,
}

impl PartnerFulfillmentUseCase {
    /// Wire the use case.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        shipments: Arc<dyn ShipmentRepository>,
        shops: Arc<dyn ShopDirectoryPort>,
        configs: Arc<dyn ProviderConfigRepository>,
        inventory: Arc<dyn InventoryPort>,
        gateway: Arc<ShippingGateway>,
        dispatcher: Arc<ShipperDispatcher>,
        bus: Arc<dyn EventBusPort>,
    ) -> Self {
        Self {
            orders,
            shipments,
            shops,
            configs,
            inventory,
            gateway,
            dispatcher,
            bus,
        }
    }

    async fn load_authorized(
        &self,
        actor: &Actor,
        sub_order_id: &SubOrderId,
    ) -> Result<(SubOrder, Order), AppError> {
        let sub_order = self
            .orders
            .find_sub_order(sub_order_id)
            .await?
            .ok_or_else(|| AppError::not_found("sub-order", sub_order_id))?;
        if !actor.owns_shop(&sub_order.shop_id) {
            return Err(AppError::forbidden("sub-order belongs to another shop"));
        }
        let order = self
            .orders
            .find_order(&sub_order.order_id)
            .await?
            .ok_or_else(|| AppError::not_found("order", &sub_order.order_id))?;
        Ok((sub_order, order))
    }

    async fn publish_sub_order_change(&self, order: &Order, sub_order: &SubOrder) {
        publish_or_log(
            &*self.bus,
            &DomainEvent::OrderStatusChanged {
                order_id: order.id.clone(),
                sub_order_id: Some(sub_order.id.clone()),
                order_status: order.status,
                sub_order_status: Some(sub_order.status),
                at: sub_order.updated_at,
            },
        )
        .await;
    }

    /// Seller confirms the sub-order. The first confirmation of a COD
    /// order also confirms the order itself (no payment will arrive to do
    /// it).
    pub async fn confirm(
        &self,
        actor: &Actor,
        sub_order_id: &SubOrderId,
    ) -> Result<SubOrder, AppError> {
        let (mut sub_order, mut order) = self.load_authorized(actor, sub_order_id).await?;
        let now = Utc::now();

        sub_order.transition_to(SubOrderStatus::Confirmed, now)?;
        self.orders.save_sub_order(&sub_order).await?;
        self.orders
            .append_tracking_event(&TrackingEvent::new(
                sub_order.id.clone(),
                TrackingEventKind::StatusChanged,
                "Shop đã xác nhận đơn".to_string(),
                actor.role,
                now,
            ))
            .await?;

        if order.status == OrderStatus::PendingPayment && order.payment_method.is_cod() {
            order.transition_to(OrderStatus::Confirmed, now)?;
            self.orders.save_order(&order).await?;
        }

        self.publish_sub_order_change(&order, &sub_order).await;
        Ok(sub_order)
    }

    /// Seller starts preparing the parcel.
    pub async fn start_processing(
        &self,
        actor: &Actor,
        sub_order_id: &SubOrderId,
    ) -> Result<SubOrder, AppError> {
        let (mut sub_order, order) = self.load_authorized(actor, sub_order_id).await?;
        let now = Utc::now();

        sub_order.transition_to(SubOrderStatus::Processing, now)?;
        self.orders.save_sub_order(&sub_order).await?;

        self.publish_sub_order_change(&order, &sub_order).await;
        Ok(sub_order)
    }

    /// Seller packed the parcel: `processing -> ready_to_ship`, shipment
    /// created at the shop's default carrier, in-house parcels dispatched.
    ///
    /// # Errors
    ///
    /// Besides transition/ownership failures, `NO_SHIPPER_AVAILABLE` when
    /// in-house dispatch finds nobody; the sub-order stays ready to ship
    /// and an admin retry re-runs dispatch.
    pub async fn pack(
        &self,
        actor: &Actor,
        sub_order_id: &SubOrderId,
        cancel: &CancellationToken,
    ) -> Result<Shipment, AppError> {
        let (mut sub_order, order) = self.load_authorized(actor, sub_order_id).await?;

        // Validate the transition before anything leaves the process; a
        // carrier order for an unpackable sub-order is unrecoverable.
        crate::domain::order::SubOrderStateMachine::validate_transition(
            sub_order.status,
            SubOrderStatus::ReadyToShip,
        )?;

        let shop = self
            .shops
            .find_shop(&sub_order.shop_id)
            .await?
            .ok_or_else(|| AppError::not_found("shop", &sub_order.shop_id))?;

        let items = self.orders.list_items_by_sub_order(&sub_order.id).await?;
        let weight_grams: u32 = items
            .iter()
            .map(|item| item.weight_grams * item.quantity)
            .sum();
        let package = PackageInfo {
            weight_grams: weight_grams.max(100),
            declared_value: sub_order.subtotal,
            description: items
                .first()
                .map(|item| format!("{} x{}", item.product_name, items.len())),
        };

        // COD collects the sub-order total at the door; prepaid parcels
        // carry no cash.
        let cod_amount = if order.payment_method.is_cod() {
            sub_order.total
        } else {
            Money::ZERO
        };

        let provider_code = match self.configs.find_default(&sub_order.shop_id).await? {
            Some(config) => config.provider_code,
            None => ProviderCode::InHouse,
        };

        let created = self
            .gateway
            .create_order(
                provider_code,
                &CreateShipmentRequest {
                    shop_id: sub_order.shop_id.clone(),
                    reference: sub_order.id.to_string(),
                    pickup_address: shop.pickup_address.clone(),
                    pickup_contact: shop.pickup_contact.clone(),
                    delivery_address: order.shipping.address.clone(),
                    delivery_contact: crate::domain::shared::Contact {
                        name: order.shipping.name.clone(),
                        phone: order.shipping.phone.clone(),
                    },
                    package: package.clone(),
                    cod_amount,
                },
                cancel,
            )
            .await?;

        let now = Utc::now();
        let mut shipment = Shipment::new(
            sub_order.id.clone(),
            sub_order.shop_id.clone(),
            created.tracking_number,
            provider_code,
            shop.pickup_address,
            shop.pickup_contact,
            order.shipping.address.clone(),
            crate::domain::shared::Contact {
                name: order.shipping.name.clone(),
                phone: order.shipping.phone.clone(),
            },
            package,
            cod_amount,
            now,
        );
        shipment.provider_order_id = created.provider_order_id;
        self.shipments.save(&shipment).await?;

        sub_order.transition_to(SubOrderStatus::ReadyToShip, now)?;
        self.orders.save_sub_order(&sub_order).await?;
        self.orders
            .append_tracking_event(&TrackingEvent::new(
                sub_order.id.clone(),
                TrackingEventKind::StatusChanged,
                format!("Đã đóng gói, mã vận đơn {}", shipment.tracking_number),
                actor.role,
                now,
            ))
            .await?;
        self.publish_sub_order_change(&order, &sub_order).await;

        if provider_code.is_in_house() {
            self.dispatcher.dispatch(&mut shipment).await?;
        }
        Ok(shipment)
    }

    /// Seller cancels a sub-order before it ships. Releases its stock;
    /// when every sibling is already cancelled, the order follows.
    pub async fn cancel(
        &self,
        actor: &Actor,
        sub_order_id: &SubOrderId,
        reason: &str,
    ) -> Result<SubOrder, AppError> {
        let (mut sub_order, mut order) = self.load_authorized(actor, sub_order_id).await?;
        let now = Utc::now();

        sub_order.transition_to(SubOrderStatus::Cancelled, now)?;
        self.orders.save_sub_order(&sub_order).await?;
        self.orders
            .append_tracking_event(&TrackingEvent::new(
                sub_order.id.clone(),
                TrackingEventKind::StatusChanged,
                format!("Shop đã hủy đơn: {reason}"),
                actor.role,
                now,
            ))
            .await?;

        for item in self.orders.list_items_by_sub_order(&sub_order.id).await? {
            self.inventory
                .release(&order.id, &item.variant_id, item.quantity)
                .await?;
        }

        let siblings = self.orders.list_sub_orders_by_order(&order.id).await?;
        if siblings
            .iter()
            .all(|s| s.status == SubOrderStatus::Cancelled)
            && !order.status.is_terminal()
        {
            order.transition_to(OrderStatus::Cancelled, now)?;
            self.orders.save_order(&order).await?;
            publish_or_log(
                &*self.bus,
                &DomainEvent::OrderCancelled {
                    order_id: order.id.clone(),
                    reason: format!("all sub-orders cancelled: {reason}"),
                    at: now,
                },
            )
            .await;
        }

        self.publish_sub_order_change(&order, &sub_order).await;
        Ok(sub_order)
    }
}
