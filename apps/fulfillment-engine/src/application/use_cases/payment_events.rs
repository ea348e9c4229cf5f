//! Payment-driven transitions.
//!
//! The core consumes `payment.succeeded` / `payment.failed` from the
//! payments queue; it never talks to payment providers directly. Both
//! handlers are idempotent: the bus delivers at least once.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::application::ports::{
    EventBusPort, InventoryPort, OrderRepository, publish_or_log,
};
use crate::domain::order::{DomainEvent, OrderStatus, PaymentStatus, SubOrderStatus};
use crate::domain::shared::OrderId;
use crate::domain::shipment::{TrackingEvent, TrackingEventKind};
use crate::error::AppError;

/// Consumer of payment outcomes.
pub struct PaymentEventHandler {
    orders: Arc<dyn OrderRepository>,
    inventory: Arc<dyn InventoryPort>,
    bus: Arc<dyn EventBusPort>,
}

impl PaymentEventHandler {
    /// Wire the handler.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        inventory: Arc<dyn InventoryPort>,
        bus: Arc<dyn EventBusPort>,
    ) -> Self {
        Self {
            orders,
            inventory,
            bus,
        }
    }

    /// Payment captured: payment -> paid, order -> processing, every
    /// sub-order (re)set to pending, `PaymentConfirmed` tracking events.
    ///
    /// # Errors
    ///
    /// `NOT_FOUND` for an unknown order.
    pub async fn on_payment_succeeded(
        &self,
        order_id: &OrderId,
        at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut order = self
            .orders
            .find_order(order_id)
            .await?
            .ok_or_else(|| AppError::not_found("order", order_id))?;

        if order.payment_status == PaymentStatus::Paid {
            // Redelivered event.
            return Ok(());
        }

        order.mark_paid(at);
        order.transition_to(OrderStatus::Processing, at)?;
        self.orders.save_order(&order).await?;

        for mut sub_order in self.orders.list_sub_orders_by_order(order_id).await? {
            // Payment fans every sub-order back to the seller queue.
            sub_order.status = SubOrderStatus::Pending;
            sub_order.updated_at = at;
            self.orders.save_sub_order(&sub_order).await?;
            self.orders
                .append_tracking_event(&TrackingEvent::new(
                    sub_order.id.clone(),
                    TrackingEventKind::PaymentConfirmed,
                    "Thanh toán thành công".to_string(),
                    crate::domain::shared::Role::System,
                    at,
                ))
                .await?;
        }

        publish_or_log(
            &*self.bus,
            &DomainEvent::OrderStatusChanged {
                order_id: order.id.clone(),
                sub_order_id: None,
                order_status: order.status,
                sub_order_status: None,
                at,
            },
        )
        .await;
        Ok(())
    }

    /// Payment failed: payment -> failed, order -> payment_failed, and
    /// every reservation released.
    ///
    /// # Errors
    ///
    /// `NOT_FOUND` for an unknown order.
    pub async fn on_payment_failed(
        &self,
        order_id: &OrderId,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut order = self
            .orders
            .find_order(order_id)
            .await?
            .ok_or_else(|| AppError::not_found("order", order_id))?;

        if order.status == OrderStatus::PaymentFailed {
            return Ok(());
        }

        order.mark_payment_failed(at);
        order.transition_to(OrderStatus::PaymentFailed, at)?;
        self.orders.save_order(&order).await?;

        for sub_order in self.orders.list_sub_orders_by_order(order_id).await? {
            for item in self.orders.list_items_by_sub_order(&sub_order.id).await? {
                self.inventory
                    .release(order_id, &item.variant_id, item.quantity)
                    .await?;
            }
        }

        tracing::warn!(order_id = %order_id, reason, "payment failed, stock released");
        publish_or_log(
            &*self.bus,
            &DomainEvent::OrderStatusChanged {
                order_id: order.id.clone(),
                sub_order_id: None,
                order_status: order.status,
                sub_order_status: None,
                at,
            },
        )
        .await;
        Ok(())
    }
}
