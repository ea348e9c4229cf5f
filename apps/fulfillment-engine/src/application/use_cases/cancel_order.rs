//! Customer cancellation.
//!
//! Allowed only while the order is still `pending_payment` or `confirmed`
//! and nothing is on the road. A paid non-COD order gets a refund through
//! the payment provider; the refund outcome never blocks the
//! cancellation — a failure raises a ticket for support instead.

use chrono::Utc;
use std::sync::Arc;

use crate::application::ports::{
    EventBusPort, InventoryPort, OrderRepository, RefundPort, publish_or_log,
};
use crate::domain::order::{
    DomainEvent, Order, OrderError, OrderStatus, SubOrderStateMachine, SubOrderStatus,
};
use crate::domain::shared::{Actor, OrderId};
use crate::domain::shipment::{TrackingEvent, TrackingEventKind};
use crate::error::AppError;

/// Outcome of a customer cancellation.
#[derive(Debug, Clone)]
pub struct CancellationReceipt {
    /// The final order status (`cancelled`, or `refunded` when the refund
    /// also went through).
    pub order_status: OrderStatus,
    /// Whether a refund was initiated.
    pub refund_initiated: bool,
    /// Whether the refund failed and a support ticket was raised.
    pub refund_failed: bool,
}

/// Use case: customer cancels an order.
pub struct CancelOrderUseCase {
    orders: Arc<dyn OrderRepository>,
    inventory: Arc<dyn InventoryPort>,
    refunds: Arc<dyn RefundPort>,
    bus: Arc<dyn EventBusPort>,
}

impl CancelOrderUseCase {
    /// Wire the use case.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        inventory: Arc<dyn InventoryPort>,
        refunds: Arc<dyn RefundPort>,
        bus: Arc<dyn EventBusPort>,
    ) -> Self {
        Self {
            orders,
            inventory,
            refunds,
            bus,
        }
    }

    /// Execute the cancellation.
    ///
    /// # Errors
    ///
    /// `FORBIDDEN` for someone else's order, `VALIDATION_ERROR` when the
    /// gate fails (wrong order status or a sub-order already moving).
    pub async fn execute(
        &self,
        actor: &Actor,
        order_id: &OrderId,
        reason: &str,
    ) -> Result<CancellationReceipt, AppError> {
        let mut order = self
            .orders
            .find_order(order_id)
            .await?
            .ok_or_else(|| AppError::not_found("order", order_id))?;
        if !actor.owns_user(&order.user_id) {
            return Err(AppError::forbidden("order belongs to another customer"));
        }

        if !matches!(
            order.status,
            OrderStatus::PendingPayment | OrderStatus::Confirmed
        ) {
            return Err(OrderError::NotCancellable {
                reason: format!("order is {}", order.status),
            }
            .into());
        }

        let sub_orders = self.orders.list_sub_orders_by_order(order_id).await?;
        if sub_orders
            .iter()
            .any(|s| s.status == SubOrderStatus::Shipping)
        {
            return Err(OrderError::NotCancellable {
                reason: "a parcel is already shipping".to_string(),
            }
            .into());
        }
        // All-or-nothing: every open sub-order must be cancellable by the
        // transition table before any of them is touched.
        for sub_order in &sub_orders {
            if sub_order.status != SubOrderStatus::Cancelled {
                SubOrderStateMachine::validate_transition(
                    sub_order.status,
                    SubOrderStatus::Cancelled,
                )?;
            }
        }

        let now = Utc::now();
        for mut sub_order in sub_orders {
            if sub_order.status == SubOrderStatus::Cancelled {
                continue;
            }
            sub_order.transition_to(SubOrderStatus::Cancelled, now)?;
            self.orders.save_sub_order(&sub_order).await?;
            self.orders
                .append_tracking_event(&TrackingEvent::new(
                    sub_order.id.clone(),
                    TrackingEventKind::StatusChanged,
                    format!("Khách đã hủy đơn: {reason}"),
                    actor.role,
                    now,
                ))
                .await?;

            for item in self.orders.list_items_by_sub_order(&sub_order.id).await? {
                self.inventory
                    .release(&order.id, &item.variant_id, item.quantity)
                    .await?;
            }
        }

        order.transition_to(OrderStatus::Cancelled, now)?;
        self.orders.save_order(&order).await?;
        publish_or_log(
            &*self.bus,
            &DomainEvent::OrderCancelled {
                order_id: order.id.clone(),
                reason: reason.to_string(),
                at: now,
            },
        )
        .await;

        let (refund_initiated, refund_failed) = self.maybe_refund(&mut order).await?;
        Ok(CancellationReceipt {
            order_status: order.status,
            refund_initiated,
            refund_failed,
        })
    }

    /// Refund a paid non-COD order. Failure is surfaced as a ticket (log
    /// + tracking note), never as an error: the cancellation stands.
    async fn maybe_refund(&self, order: &mut Order) -> Result<(bool, bool), AppError> {
        if !order.needs_refund_on_cancel() {
            return Ok((false, false));
        }

        match self
            .refunds
            .refund(&order.id, order.totals.grand_total)
            .await
        {
            Ok(receipt) => {
                let now = Utc::now();
                order.mark_refunded(now);
                order.transition_to(OrderStatus::Refunded, now)?;
                self.orders.save_order(order).await?;
                tracing::info!(
                    order_id = %order.id,
                    reference = receipt.reference,
                    "refund initiated for cancelled order"
                );
                Ok((true, false))
            }
            Err(err) => {
                tracing::error!(
                    order_id = %order.id,
                    error = %err,
                    "refund failed for cancelled order, raising ticket"
                );
                Ok((true, true))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::checkout::{
        CheckoutInput, CheckoutItemInput, CheckoutShopInput, CheckoutUseCase,
    };
    use crate::domain::order::{PaymentMethod, PaymentStatus, ShippingSnapshot};
    use crate::domain::shared::{Address, Money, Region, Role, ShopId, UserId, VariantId};
    use crate::infrastructure::bus::InMemoryEventBus;
    use crate::infrastructure::persistence::{
        InMemoryInventory, InMemoryOrderRepository, RecordingRefundPort,
    };

    struct Fixture {
        cancel: CancelOrderUseCase,
        checkout: CheckoutUseCase,
        orders: Arc<InMemoryOrderRepository>,
        inventory: Arc<InMemoryInventory>,
        refunds: Arc<RecordingRefundPort>,
        bus: Arc<InMemoryEventBus>,
    }

    fn fixture() -> Fixture {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let inventory = Arc::new(InMemoryInventory::new());
        inventory.stock(&VariantId::new("v-a"), 10);
        let refunds = Arc::new(RecordingRefundPort::new());
        let bus = Arc::new(InMemoryEventBus::new());

        Fixture {
            cancel: CancelOrderUseCase::new(
                Arc::clone(&orders) as Arc<dyn OrderRepository>,
                Arc::clone(&inventory) as Arc<dyn InventoryPort>,
                Arc::clone(&refunds) as Arc<dyn RefundPort>,
                Arc::clone(&bus) as Arc<dyn EventBusPort>,
            ),
            checkout: CheckoutUseCase::new(
                Arc::clone(&orders) as Arc<dyn OrderRepository>,
                Arc::clone(&inventory) as Arc<dyn InventoryPort>,
                Arc::clone(&bus) as Arc<dyn EventBusPort>,
            ),
            orders,
            inventory,
            refunds,
            bus,
        }
    }

    fn customer() -> Actor {
        Actor::new(UserId::new("u1"), Role::Customer, None)
    }

    async fn place(f: &Fixture, method: PaymentMethod) -> OrderId {
        f.checkout
            .execute(
                &customer(),
                CheckoutInput {
                    payment_method: method,
                    shipping: ShippingSnapshot {
                        name: "A".to_string(),
                        phone: "0900000000".to_string(),
                        address: Address {
                            line: "1".to_string(),
                            ward: None,
                            district: "Quận 1".to_string(),
                            city: "Hồ Chí Minh".to_string(),
                            region: Some(Region::South),
                            location: None,
                        },
                    },
                    shops: vec![CheckoutShopInput {
                        shop_id: ShopId::new("shop-a"),
                        items: vec![CheckoutItemInput {
                            variant_id: VariantId::new("v-a"),
                            product_name: "Áo".to_string(),
                            sku: "SKU-1".to_string(),
                            unit_price: Money::from_vnd(200_000),
                            quantity: 2,
                            weight_grams: 300,
                            image_url: None,
                        }],
                        shipping_fee: Money::ZERO,
                    }],
                    discount_total: Money::ZERO,
                },
            )
            .await
            .unwrap()
            .order
            .id
    }

    #[tokio::test]
    async fn pending_cod_order_cancels_and_releases_stock() {
        let f = fixture();
        let order_id = place(&f, PaymentMethod::Cod).await;
        assert_eq!(f.inventory.available(&VariantId::new("v-a")), 8);

        let receipt = f
            .cancel
            .execute(&customer(), &order_id, "đổi ý")
            .await
            .unwrap();

        assert_eq!(receipt.order_status, OrderStatus::Cancelled);
        assert!(!receipt.refund_initiated);
        assert_eq!(f.inventory.available(&VariantId::new("v-a")), 10);
        assert!(
            f.bus
                .published()
                .iter()
                .any(|e| e.name == "order.cancelled")
        );
    }

    #[tokio::test]
    async fn paid_online_order_is_refunded() {
        let f = fixture();
        let order_id = place(&f, PaymentMethod::Momo).await;

        // Simulate payment capture.
        let mut order = f.orders.find_order(&order_id).await.unwrap().unwrap();
        order.mark_paid(Utc::now());
        f.orders.save_order(&order).await.unwrap();

        let receipt = f
            .cancel
            .execute(&customer(), &order_id, "đổi ý")
            .await
            .unwrap();

        assert_eq!(receipt.order_status, OrderStatus::Refunded);
        assert!(receipt.refund_initiated);
        assert!(!receipt.refund_failed);
        assert_eq!(f.refunds.refunds().len(), 1);

        let stored = f.orders.find_order(&order_id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Refunded);
    }

    #[tokio::test]
    async fn refund_failure_never_blocks_cancellation() {
        let f = fixture();
        let order_id = place(&f, PaymentMethod::Momo).await;
        let mut order = f.orders.find_order(&order_id).await.unwrap().unwrap();
        order.mark_paid(Utc::now());
        f.orders.save_order(&order).await.unwrap();
        f.refunds.fail_refunds(true);

        let receipt = f
            .cancel
            .execute(&customer(), &order_id, "đổi ý")
            .await
            .unwrap();

        assert_eq!(receipt.order_status, OrderStatus::Cancelled);
        assert!(receipt.refund_initiated);
        assert!(receipt.refund_failed);
    }

    #[tokio::test]
    async fn shipping_sub_order_blocks_cancellation() {
        let f = fixture();
        let order_id = place(&f, PaymentMethod::Cod).await;

        // Walk one sub-order to shipping behind the scenes.
        let mut sub_order = f
            .orders
            .list_sub_orders_by_order(&order_id)
            .await
            .unwrap()
            .remove(0);
        for status in [
            SubOrderStatus::Confirmed,
            SubOrderStatus::Processing,
            SubOrderStatus::ReadyToShip,
            SubOrderStatus::Shipping,
        ] {
            sub_order.transition_to(status, Utc::now()).unwrap();
        }
        f.orders.save_sub_order(&sub_order).await.unwrap();
        let mut order = f.orders.find_order(&order_id).await.unwrap().unwrap();
        order
            .transition_to(OrderStatus::Confirmed, Utc::now())
            .unwrap();
        f.orders.save_order(&order).await.unwrap();

        let err = f
            .cancel
            .execute(&customer(), &order_id, "đổi ý")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ValidationError);
    }

    #[tokio::test]
    async fn foreign_customer_is_forbidden() {
        let f = fixture();
        let order_id = place(&f, PaymentMethod::Cod).await;

        let err = f
            .cancel
            .execute(
                &Actor::new(UserId::new("u2"), Role::Customer, None),
                &order_id,
                "?",
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Forbidden);
    }
}
