//! Order Repository Port (Driven Port)
//!
//! Typed access to orders, sub-orders, items, and tracking events.

use async_trait::async_trait;

use crate::domain::order::{Order, OrderItem, SubOrder};
use crate::domain::shared::{OrderId, ShopId, SubOrderId, UserId};
use crate::domain::shipment::TrackingEvent;
use crate::error::AppError;

/// Port for order persistence.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert or update an order.
    async fn save_order(&self, order: &Order) -> Result<(), AppError>;

    /// Find an order by id.
    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, AppError>;

    /// Find an order by its customer-facing order number.
    async fn find_order_by_number(&self, number: &str) -> Result<Option<Order>, AppError>;

    /// List a customer's orders, newest first.
    async fn list_orders_by_user(&self, user_id: &UserId) -> Result<Vec<Order>, AppError>;

    /// Insert or update a sub-order.
    async fn save_sub_order(&self, sub_order: &SubOrder) -> Result<(), AppError>;

    /// Find a sub-order by id.
    async fn find_sub_order(&self, id: &SubOrderId) -> Result<Option<SubOrder>, AppError>;

    /// All sub-orders of an order.
    async fn list_sub_orders_by_order(&self, order_id: &OrderId)
    -> Result<Vec<SubOrder>, AppError>;

    /// Open sub-orders of a shop, newest first.
    async fn list_sub_orders_by_shop(&self, shop_id: &ShopId) -> Result<Vec<SubOrder>, AppError>;

    /// Insert item snapshots.
    async fn save_items(&self, items: &[OrderItem]) -> Result<(), AppError>;

    /// Item snapshots of a sub-order.
    async fn list_items_by_sub_order(
        &self,
        sub_order_id: &SubOrderId,
    ) -> Result<Vec<OrderItem>, AppError>;

    /// Append a tracking event. The log is append-only.
    async fn append_tracking_event(&self, event: &TrackingEvent) -> Result<(), AppError>;

    /// Tracking events of a sub-order, oldest first.
    async fn list_tracking_events(
        &self,
        sub_order_id: &SubOrderId,
    ) -> Result<Vec<TrackingEvent>, AppError>;
}
