//! Event Bus Port (Driven Port)
//!
//! Durable publish of domain events. Delivery is at-least-once; consumers
//! declare their own prefetch and ack semantics and must be idempotent.
//! Producers publish only after the owning DB mutation commits.

use async_trait::async_trait;

use crate::domain::order::DomainEvent;
use crate::error::AppError;

/// Port for publishing domain events.
#[async_trait]
pub trait EventBusPort: Send + Sync {
    /// Publish one event on its queue.
    async fn publish(&self, event: &DomainEvent) -> Result<(), AppError>;
}

/// Publish after commit; a failure never fails the user-visible flow.
///
/// The failure is logged and left for the periodic reconciliation pass,
/// which re-emits from persisted truth.
pub async fn publish_or_log(bus: &dyn EventBusPort, event: &DomainEvent) {
    if let Err(err) = bus.publish(event).await {
        tracing::error!(
            event = event.name(),
            error = %err,
            "event publish failed after commit; reconciliation will re-emit"
        );
    }
}
