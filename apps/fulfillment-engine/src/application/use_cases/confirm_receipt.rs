//! Receipt confirmation and the aggregate completion rule.
//!
//! Every delivered sub-order completes and earns coins; the order itself
//! completes exactly when every sub-order is settled and at least one was
//! fulfilled. `OrderCompleted` goes out once, guarded by the order
//! transition.

use chrono::Utc;
use std::sync::Arc;

use crate::application::ports::{EventBusPort, OrderRepository, publish_or_log};
use crate::domain::order::rewards::coin_reward;
use crate::domain::order::{DomainEvent, OrderStateMachine, OrderStatus, SubOrderStatus};
use crate::domain::shared::{Actor, OrderId};
use crate::domain::shipment::{TrackingEvent, TrackingEventKind};
use crate::error::AppError;

/// Outcome of a receipt confirmation.
#[derive(Debug, Clone)]
pub struct ReceiptOutcome {
    /// Sub-orders moved to `completed` by this call.
    pub completed_sub_orders: usize,
    /// Coins granted across them.
    pub coins_granted: u32,
    /// Whether the order reached `completed`.
    pub order_completed: bool,
}

/// Use case: customer confirms receipt of delivered parcels.
pub struct ConfirmReceiptUseCase {
    orders: Arc<dyn OrderRepository>,
    bus: Arc<dyn EventBusPort>,
}

impl ConfirmReceiptUseCase {
    /// Wire the use case.
    #[must_use]
    pub fn new(orders: Arc<dyn OrderRepository>, bus: Arc<dyn EventBusPort>) -> Self {
        Self { orders, bus }
    }

    /// Execute the confirmation.
    ///
    /// # Errors
    ///
    /// `FORBIDDEN` for someone else's order, `VALIDATION_ERROR` when
    /// nothing is delivered.
    pub async fn execute(
        &self,
        actor: &Actor,
        order_id: &OrderId,
    ) -> Result<ReceiptOutcome, AppError> {
        let mut order = self
            .orders
            .find_order(order_id)
            .await?
            .ok_or_else(|| AppError::not_found("order", order_id))?;
        if !actor.owns_user(&order.user_id) {
            return Err(AppError::forbidden("order belongs to another customer"));
        }

        let now = Utc::now();
        let mut sub_orders = self.orders.list_sub_orders_by_order(order_id).await?;
        let mut completed = 0usize;
        let mut coins = 0u32;

        for sub_order in &mut sub_orders {
            if sub_order.status != SubOrderStatus::Delivered {
                continue;
            }
            sub_order.transition_to(SubOrderStatus::Completed, now)?;
            self.orders.save_sub_order(sub_order).await?;

            let reward = coin_reward(sub_order.total);
            coins += reward;
            completed += 1;
            self.orders
                .append_tracking_event(&TrackingEvent::new(
                    sub_order.id.clone(),
                    TrackingEventKind::RewardGranted,
                    format!("Nhận hàng thành công, +{reward} xu"),
                    actor.role,
                    now,
                ))
                .await?;
        }

        if completed == 0 {
            return Err(AppError::validation("no delivered sub-order to confirm"));
        }

        let statuses: Vec<SubOrderStatus> = sub_orders.iter().map(|s| s.status).collect();
        let mut order_completed = false;
        if OrderStateMachine::is_aggregate_complete(&statuses) && !order.status.is_terminal() {
            order.transition_to(OrderStatus::Completed, now)?;
            self.orders.save_order(&order).await?;
            publish_or_log(
                &*self.bus,
                &DomainEvent::OrderCompleted {
                    order_id: order.id.clone(),
                    at: now,
                },
            )
            .await;
            order_completed = true;
        }

        Ok(ReceiptOutcome {
            completed_sub_orders: completed,
            coins_granted: coins,
            order_completed,
        })
    }
}
