//! In-memory event bus.
//!
//! Implements [`EventBusPort`] for development and tests: every publish is
//! appended to a per-queue log (the "durable" side) and fanned out to live
//! subscribers. Delivery to subscribers is at-least-once from the caller's
//! point of view; consumers are expected to be idempotent.
//!
//! Also carries the reconciliation pass that repairs publishes lost after
//! a commit: it re-emits current status events from persisted truth.

use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

use async_trait::async_trait;

use crate::application::ports::{EventBusPort, OrderRepository, ShipmentRepository};
use crate::domain::order::{DomainEvent, QueueName};
use crate::error::AppError;

/// One message as it went onto a queue.
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    /// Queue the message went to.
    pub queue: QueueName,
    /// Dotted event name.
    pub name: &'static str,
    /// Versioned JSON envelope.
    pub envelope: Value,
}

/// In-memory implementation of [`EventBusPort`].
#[derive(Default)]
pub struct InMemoryEventBus {
    log: RwLock<Vec<PublishedEvent>>,
    subscribers: RwLock<HashMap<QueueName, Vec<mpsc::UnboundedSender<PublishedEvent>>>>,
    fail_publishes: AtomicBool,
}

impl InMemoryEventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a queue. Messages published after this call are
    /// delivered in publish order.
    #[must_use]
    pub fn subscribe(&self, queue: QueueName) -> mpsc::UnboundedReceiver<PublishedEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.write().entry(queue).or_default().push(tx);
        rx
    }

    /// Everything published so far, in order.
    #[must_use]
    pub fn published(&self) -> Vec<PublishedEvent> {
        self.log.read().clone()
    }

    /// Messages published to one queue.
    #[must_use]
    pub fn published_to(&self, queue: QueueName) -> Vec<PublishedEvent> {
        self.log
            .read()
            .iter()
            .filter(|m| m.queue == queue)
            .cloned()
            .collect()
    }

    /// Make subsequent publishes fail (tests of the publish-after-commit
    /// contract).
    pub fn fail_next_publishes(&self, fail: bool) {
        self.fail_publishes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventBusPort for InMemoryEventBus {
    async fn publish(&self, event: &DomainEvent) -> Result<(), AppError> {
        if self.fail_publishes.load(Ordering::SeqCst) {
            return Err(AppError::internal("bus connection lost"));
        }

        let message = PublishedEvent {
            queue: event.queue(),
            name: event.name(),
            envelope: event.to_envelope(),
        };
        self.log.write().push(message.clone());

        let mut subscribers = self.subscribers.write();
        if let Some(list) = subscribers.get_mut(&message.queue) {
            list.retain(|tx| tx.send(message.clone()).is_ok());
        }
        Ok(())
    }
}

/// Periodic repair for publishes that failed after a DB commit: re-emits
/// the current status of every open order and active shipment from
/// persisted truth. Consumers dedupe by (entity, status, at).
pub struct EventReconciliationJob {
    orders: Arc<dyn OrderRepository>,
    shipments: Arc<dyn ShipmentRepository>,
    bus: Arc<dyn EventBusPort>,
}

impl EventReconciliationJob {
    /// Wire the job.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        shipments: Arc<dyn ShipmentRepository>,
        bus: Arc<dyn EventBusPort>,
    ) -> Self {
        Self {
            orders,
            shipments,
            bus,
        }
    }

    /// Re-emit status events for all active shipments and their orders.
    ///
    /// Returns the number of events emitted.
    pub async fn run_once(&self) -> Result<usize, AppError> {
        let mut emitted = 0;

        for shipment in self.shipments.list_active().await? {
            self.bus
                .publish(&DomainEvent::ShipmentStatusChanged {
                    shipment_id: shipment.id.clone(),
                    tracking_number: shipment.tracking_number.clone(),
                    status: shipment.status,
                    at: shipment.updated_at,
                })
                .await?;
            emitted += 1;

            if let Some(sub_order) = self.orders.find_sub_order(&shipment.sub_order_id).await? {
                if let Some(order) = self.orders.find_order(&sub_order.order_id).await? {
                    self.bus
                        .publish(&DomainEvent::OrderStatusChanged {
                            order_id: order.id.clone(),
                            sub_order_id: Some(sub_order.id.clone()),
                            order_status: order.status,
                            sub_order_status: Some(sub_order.status),
                            at: Utc::now(),
                        })
                        .await?;
                    emitted += 1;
                }
            }
        }
        Ok(emitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::OrderId;

    fn event() -> DomainEvent {
        DomainEvent::OrderCompleted {
            order_id: OrderId::new("ord-1"),
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn publish_appends_to_the_log() {
        let bus = InMemoryEventBus::new();
        bus.publish(&event()).await.unwrap();

        let published = bus.published_to(QueueName::Orders);
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].name, "order.completed");
        assert_eq!(published[0].envelope["schema"], "order.completed.v1");
    }

    #[tokio::test]
    async fn subscribers_receive_in_publish_order() {
        let bus = InMemoryEventBus::new();
        let mut rx = bus.subscribe(QueueName::Orders);

        bus.publish(&event()).await.unwrap();
        bus.publish(&DomainEvent::OrderCancelled {
            order_id: OrderId::new("ord-2"),
            reason: "customer".to_string(),
            at: Utc::now(),
        })
        .await
        .unwrap();

        assert_eq!(rx.recv().await.unwrap().name, "order.completed");
        assert_eq!(rx.recv().await.unwrap().name, "order.cancelled");
    }

    #[tokio::test]
    async fn queue_isolation() {
        let bus = InMemoryEventBus::new();
        let mut rx = bus.subscribe(QueueName::Shipments);
        bus.publish(&event()).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn failing_bus_surfaces_errors() {
        let bus = InMemoryEventBus::new();
        bus.fail_next_publishes(true);
        assert!(bus.publish(&event()).await.is_err());
        assert!(bus.published().is_empty());

        bus.fail_next_publishes(false);
        assert!(bus.publish(&event()).await.is_ok());
    }
}
