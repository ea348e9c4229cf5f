//! Return flow: request, approval, receipt back at the seller, refund.
//!
//! Runs on the sub-order table's return branch. A return can only be
//! requested while the delivery's 7-day window is open.

use chrono::Utc;
use std::sync::Arc;

use crate::application::ports::{
    EventBusPort, OrderRepository, RefundPort, publish_or_log,
};
use crate::domain::order::{DomainEvent, SubOrder, SubOrderStatus};
use crate::domain::shared::{Actor, SubOrderId};
use crate::domain::shipment::{TrackingEvent, TrackingEventKind};
use crate::error::AppError;

/// Use case: the return branch of the sub-order lifecycle.
pub struct ReturnFlowUseCase {
    orders: Arc<dyn OrderRepository>,
    refunds: Arc<dyn RefundPort>,
    bus: Arc<dyn EventBusPort>,
}

impl ReturnFlowUseCase {
    /// Wire the use case.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        refunds: Arc<dyn RefundPort>,
        bus: Arc<dyn EventBusPort>,
    ) -> Self {
        Self {
            orders,
            refunds,
            bus,
        }
    }

    async fn load(&self, sub_order_id: &SubOrderId) -> Result<SubOrder, AppError> {
        self.orders
            .find_sub_order(sub_order_id)
            .await?
            .ok_or_else(|| AppError::not_found("sub-order", sub_order_id))
    }

    async fn transition_and_note(
        &self,
        actor: &Actor,
        mut sub_order: SubOrder,
        to: SubOrderStatus,
        note: String,
    ) -> Result<SubOrder, AppError> {
        let now = Utc::now();
        sub_order.transition_to(to, now)?;
        self.orders.save_sub_order(&sub_order).await?;
        self.orders
            .append_tracking_event(&TrackingEvent::new(
                sub_order.id.clone(),
                TrackingEventKind::StatusChanged,
                note,
                actor.role,
                now,
            ))
            .await?;

        let order_status = self
            .orders
            .find_order(&sub_order.order_id)
            .await?
            .map(|o| o.status)
            .ok_or_else(|| AppError::not_found("order", &sub_order.order_id))?;
        publish_or_log(
            &*self.bus,
            &DomainEvent::OrderStatusChanged {
                order_id: sub_order.order_id.clone(),
                sub_order_id: Some(sub_order.id.clone()),
                order_status,
                sub_order_status: Some(sub_order.status),
                at: now,
            },
        )
        .await;
        Ok(sub_order)
    }

    /// Customer asks to return a delivered parcel. Only inside the return
    /// window.
    pub async fn request(
        &self,
        actor: &Actor,
        sub_order_id: &SubOrderId,
        reason: &str,
    ) -> Result<SubOrder, AppError> {
        let sub_order = self.load(sub_order_id).await?;
        let order = self
            .orders
            .find_order(&sub_order.order_id)
            .await?
            .ok_or_else(|| AppError::not_found("order", &sub_order.order_id))?;
        if !actor.owns_user(&order.user_id) {
            return Err(AppError::forbidden("order belongs to another customer"));
        }

        let now = Utc::now();
        match sub_order.return_deadline {
            Some(deadline) if now <= deadline => {}
            Some(_) => {
                return Err(AppError::validation("return window has closed"));
            }
            None => {
                return Err(AppError::validation("sub-order was never delivered"));
            }
        }

        self.transition_and_note(
            actor,
            sub_order,
            SubOrderStatus::ReturnRequested,
            format!("Yêu cầu trả hàng: {reason}"),
        )
        .await
    }

    /// Seller approves the return.
    pub async fn approve(
        &self,
        actor: &Actor,
        sub_order_id: &SubOrderId,
    ) -> Result<SubOrder, AppError> {
        let sub_order = self.load(sub_order_id).await?;
        if !actor.owns_shop(&sub_order.shop_id) {
            return Err(AppError::forbidden("sub-order belongs to another shop"));
        }
        self.transition_and_note(
            actor,
            sub_order,
            SubOrderStatus::ReturnApproved,
            "Shop đã chấp nhận trả hàng".to_string(),
        )
        .await
    }

    /// Seller (or its ops) rejects the request; the sub-order completes.
    pub async fn reject(
        &self,
        actor: &Actor,
        sub_order_id: &SubOrderId,
        reason: &str,
    ) -> Result<SubOrder, AppError> {
        let sub_order = self.load(sub_order_id).await?;
        if !actor.owns_shop(&sub_order.shop_id) {
            return Err(AppError::forbidden("sub-order belongs to another shop"));
        }
        self.transition_and_note(
            actor,
            sub_order,
            SubOrderStatus::Completed,
            format!("Từ chối trả hàng: {reason}"),
        )
        .await
    }

    /// Parcel arrived back at the seller.
    pub async fn mark_returned(
        &self,
        actor: &Actor,
        sub_order_id: &SubOrderId,
    ) -> Result<SubOrder, AppError> {
        let sub_order = self.load(sub_order_id).await?;
        if !actor.owns_shop(&sub_order.shop_id) && !actor.is_privileged() {
            return Err(AppError::forbidden("sub-order belongs to another shop"));
        }
        self.transition_and_note(
            actor,
            sub_order,
            SubOrderStatus::Returned,
            "Đã nhận lại hàng hoàn".to_string(),
        )
        .await
    }

    /// Refund a returned sub-order through the payment provider.
    pub async fn refund(
        &self,
        actor: &Actor,
        sub_order_id: &SubOrderId,
    ) -> Result<SubOrder, AppError> {
        let sub_order = self.load(sub_order_id).await?;
        if !actor.is_privileged() {
            return Err(AppError::forbidden("only ops can refund returns"));
        }
        // Money moves only after the table says the parcel is back.
        crate::domain::order::SubOrderStateMachine::validate_transition(
            sub_order.status,
            SubOrderStatus::Refunded,
        )?;

        self.refunds
            .refund(&sub_order.order_id, sub_order.total)
            .await?;
        self.transition_and_note(
            actor,
            sub_order,
            SubOrderStatus::Refunded,
            "Đã hoàn tiền".to_string(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use crate::domain::order::{
        Order, OrderTotals, PaymentMethod, ShippingSnapshot,
    };
    use crate::domain::shared::{Address, Money, Region, Role, ShopId, UserId};
    use crate::infrastructure::bus::InMemoryEventBus;
    use crate::infrastructure::persistence::{InMemoryOrderRepository, RecordingRefundPort};

    struct Fixture {
        flow: ReturnFlowUseCase,
        orders: Arc<InMemoryOrderRepository>,
        refunds: Arc<RecordingRefundPort>,
    }

    fn fixture() -> Fixture {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let refunds = Arc::new(RecordingRefundPort::new());
        let bus = Arc::new(InMemoryEventBus::new());
        Fixture {
            flow: ReturnFlowUseCase::new(
                Arc::clone(&orders) as Arc<dyn OrderRepository>,
                Arc::clone(&refunds) as Arc<dyn RefundPort>,
                bus as Arc<dyn EventBusPort>,
            ),
            orders,
            refunds,
        }
    }

    async fn delivered_sub_order(f: &Fixture) -> SubOrder {
        let now = Utc::now();
        let order = Order::new(
            UserId::new("u1"),
            "CHM-RET".to_string(),
            OrderTotals::new(Money::from_vnd(300_000), Money::ZERO, Money::ZERO).unwrap(),
            PaymentMethod::Momo,
            ShippingSnapshot {
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
            now,
        );
        f.orders.save_order(&order).await.unwrap();

        let mut sub_order = SubOrder::new(
            order.id.clone(),
            ShopId::new("shop-x"),
            Money::from_vnd(300_000),
            Money::ZERO,
            now,
        );
        for status in [
            SubOrderStatus::Confirmed,
            SubOrderStatus::Processing,
            SubOrderStatus::ReadyToShip,
            SubOrderStatus::Shipping,
        ] {
            sub_order.transition_to(status, now).unwrap();
        }
        sub_order.mark_delivered(now).unwrap();
        f.orders.save_sub_order(&sub_order).await.unwrap();
        sub_order
    }

    fn customer() -> Actor {
        Actor::new(UserId::new("u1"), Role::Customer, None)
    }

    fn partner() -> Actor {
        Actor::new(
            UserId::new("p1"),
            Role::Partner,
            Some(ShopId::new("shop-x")),
        )
    }

    fn admin() -> Actor {
        Actor::new(UserId::new("root"), Role::Admin, None)
    }

    #[tokio::test]
    async fn full_return_path_ends_refunded() {
        let f = fixture();
        let sub_order = delivered_sub_order(&f).await;

        f.flow
            .request(&customer(), &sub_order.id, "sai kích cỡ")
            .await
            .unwrap();
        f.flow.approve(&partner(), &sub_order.id).await.unwrap();
        f.flow
            .mark_returned(&partner(), &sub_order.id)
            .await
            .unwrap();
        let refunded = f.flow.refund(&admin(), &sub_order.id).await.unwrap();

        assert_eq!(refunded.status, SubOrderStatus::Refunded);
        assert_eq!(f.refunds.refunds().len(), 1);
    }

    #[tokio::test]
    async fn rejection_completes_the_sub_order() {
        let f = fixture();
        let sub_order = delivered_sub_order(&f).await;

        f.flow
            .request(&customer(), &sub_order.id, "đổi ý")
            .await
            .unwrap();
        let completed = f
            .flow
            .reject(&partner(), &sub_order.id, "đã qua kiểm tra")
            .await
            .unwrap();
        assert_eq!(completed.status, SubOrderStatus::Completed);
    }

    #[tokio::test]
    async fn request_after_window_is_rejected() {
        let f = fixture();
        let mut sub_order = delivered_sub_order(&f).await;
        sub_order.return_deadline = Some(Utc::now() - Duration::days(1));
        f.orders.save_sub_order(&sub_order).await.unwrap();

        let err = f
            .flow
            .request(&customer(), &sub_order.id, "muộn")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ValidationError);
    }

    #[tokio::test]
    async fn foreign_shop_cannot_approve() {
        let f = fixture();
        let sub_order = delivered_sub_order(&f).await;
        f.flow
            .request(&customer(), &sub_order.id, "lý do")
            .await
            .unwrap();

        let other = Actor::new(
            UserId::new("p2"),
            Role::Partner,
            Some(ShopId::new("shop-y")),
        );
        let err = f.flow.approve(&other, &sub_order.id).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn refund_requires_returned_state() {
        let f = fixture();
        let sub_order = delivered_sub_order(&f).await;
        // Straight to refund from delivered: the table refuses.
        let err = f.flow.refund(&admin(), &sub_order.id).await.unwrap_err();
        assert_eq!(
            err.kind(),
            crate::error::ErrorKind::InvalidStatusTransition
        );
    }
}
