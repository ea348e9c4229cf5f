//! In-memory order repository for testing and development.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::application::ports::OrderRepository;
use crate::domain::order::{Order, OrderItem, SubOrder};
use crate::domain::shared::{OrderId, ShopId, SubOrderId, UserId};
use crate::domain::shipment::TrackingEvent;
use crate::error::AppError;

/// In-memory implementation of [`OrderRepository`].
///
/// Suitable for testing and development. Not for production use.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<OrderId, Order>>,
    sub_orders: RwLock<HashMap<SubOrderId, SubOrder>>,
    items: RwLock<HashMap<SubOrderId, Vec<OrderItem>>>,
    tracking: RwLock<HashMap<SubOrderId, Vec<TrackingEvent>>>,
}

impl InMemoryOrderRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.read().len()
    }

    /// Whether the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.read().is_empty()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save_order(&self, order: &Order) -> Result<(), AppError> {
        self.orders.write().insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, AppError> {
        Ok(self.orders.read().get(id).cloned())
    }

    async fn find_order_by_number(&self, number: &str) -> Result<Option<Order>, AppError> {
        Ok(self
            .orders
            .read()
            .values()
            .find(|o| o.order_number == number)
            .cloned())
    }

    async fn list_orders_by_user(&self, user_id: &UserId) -> Result<Vec<Order>, AppError> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .values()
            .filter(|o| &o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn save_sub_order(&self, sub_order: &SubOrder) -> Result<(), AppError> {
        self.sub_orders
            .write()
            .insert(sub_order.id.clone(), sub_order.clone());
        Ok(())
    }

    async fn find_sub_order(&self, id: &SubOrderId) -> Result<Option<SubOrder>, AppError> {
        Ok(self.sub_orders.read().get(id).cloned())
    }

    async fn list_sub_orders_by_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<SubOrder>, AppError> {
        let mut sub_orders: Vec<SubOrder> = self
            .sub_orders
            .read()
            .values()
            .filter(|s| &s.order_id == order_id)
            .cloned()
            .collect();
        sub_orders.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(sub_orders)
    }

    async fn list_sub_orders_by_shop(&self, shop_id: &ShopId) -> Result<Vec<SubOrder>, AppError> {
        let mut sub_orders: Vec<SubOrder> = self
            .sub_orders
            .read()
            .values()
            .filter(|s| &s.shop_id == shop_id && s.is_open())
            .cloned()
            .collect();
        sub_orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sub_orders)
    }

    async fn save_items(&self, items: &[OrderItem]) -> Result<(), AppError> {
        let mut map = self.items.write();
        for item in items {
            map.entry(item.sub_order_id.clone())
                .or_default()
                .push(item.clone());
        }
        Ok(())
    }

    async fn list_items_by_sub_order(
        &self,
        sub_order_id: &SubOrderId,
    ) -> Result<Vec<OrderItem>, AppError> {
        Ok(self
            .items
            .read()
            .get(sub_order_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append_tracking_event(&self, event: &TrackingEvent) -> Result<(), AppError> {
        self.tracking
            .write()
            .entry(event.sub_order_id.clone())
            .or_default()
            .push(event.clone());
        Ok(())
    }

    async fn list_tracking_events(
        &self,
        sub_order_id: &SubOrderId,
    ) -> Result<Vec<TrackingEvent>, AppError> {
        Ok(self
            .tracking
            .read()
            .get(sub_order_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::order::{OrderTotals, PaymentMethod, ShippingSnapshot};
    use crate::domain::shared::{Address, Money, Region};

    fn order(user: &str) -> Order {
        Order::new(
            UserId::new(user),
            format!("CHM-{}", uuid::Uuid::new_v4().simple()),
            OrderTotals::new(Money::from_vnd(100_000), Money::ZERO, Money::ZERO).unwrap(),
            PaymentMethod::Cod,
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
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn save_and_find_order() {
        let repo = InMemoryOrderRepository::new();
        let o = order("u1");
        repo.save_order(&o).await.unwrap();

        assert!(repo.find_order(&o.id).await.unwrap().is_some());
        assert!(
            repo.find_order_by_number(&o.order_number)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn list_orders_by_user_filters() {
        let repo = InMemoryOrderRepository::new();
        repo.save_order(&order("u1")).await.unwrap();
        repo.save_order(&order("u1")).await.unwrap();
        repo.save_order(&order("u2")).await.unwrap();

        assert_eq!(repo.list_orders_by_user(&UserId::new("u1")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn sub_orders_group_by_order() {
        let repo = InMemoryOrderRepository::new();
        let o = order("u1");
        let a = SubOrder::new(
            o.id.clone(),
            ShopId::new("shop-a"),
            Money::from_vnd(50_000),
            Money::ZERO,
            Utc::now(),
        );
        let b = SubOrder::new(
            o.id.clone(),
            ShopId::new("shop-b"),
            Money::from_vnd(50_000),
            Money::ZERO,
            Utc::now(),
        );
        repo.save_sub_order(&a).await.unwrap();
        repo.save_sub_order(&b).await.unwrap();

        assert_eq!(repo.list_sub_orders_by_order(&o.id).await.unwrap().len(), 2);
        assert_eq!(
            repo.list_sub_orders_by_shop(&ShopId::new("shop-a"))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn tracking_log_is_append_only_per_sub_order() {
        let repo = InMemoryOrderRepository::new();
        let sub = SubOrderId::new("sub-1");
        for i in 0..3 {
            repo.append_tracking_event(&TrackingEvent::new(
                sub.clone(),
                crate::domain::shipment::TrackingEventKind::Note,
                format!("event {i}"),
                crate::domain::shared::Role::System,
                Utc::now(),
            ))
            .await
            .unwrap();
        }
        let events = repo.list_tracking_events(&sub).await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].description, "event 0");
    }
}
