//! Webhook intake.
//!
//! Signature validation happens in the gateway before any state read.
//! Intake is serialized per tracking number (the cache key doubles as the
//! coordination key), idempotent by `(provider, provider order id,
//! status, at)`, and rate limited per provider. The stored status is
//! never downgraded: a late webhook with a lower priority is appended to
//! history only.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    CachePort, EventBusPort, OrderRepository, ShipmentRepository, publish_or_log,
};
use crate::domain::order::{DomainEvent, SubOrderStatus};
use crate::domain::shipment::{HistoryEntry, StatusApplied, UnifiedShippingStatus};
use crate::error::{AppError, ErrorKind};
use crate::realtime::{ChannelKey, PushHub, PushMessage};
use crate::providers::{ShippingGateway, WebhookEvent};
use crate::sync::KeyedLocks;

/// Requests per provider per minute before `RATE_LIMITED`.
const RATE_LIMIT_PER_MINUTE: u64 = 600;
/// How long an idempotency key is remembered.
const IDEMPOTENCY_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Outcome of one webhook.
#[derive(Debug, Clone)]
pub struct WebhookOutcome {
    /// The normalized event.
    pub event: WebhookEvent,
    /// Whether the shipment's current status moved.
    pub status_updated: bool,
    /// Whether this delivery was a duplicate (no side effect).
    pub duplicate: bool,
}

/// Use case: process one provider webhook.
pub struct ProcessWebhookUseCase {
    gateway: Arc<ShippingGateway>,
    shipments: Arc<dyn ShipmentRepository>,
    orders: Arc<dyn OrderRepository>,
    cache: Arc<dyn CachePort>,
    bus: Arc<dyn EventBusPort>,
    hub: Arc<PushHub>,
    locks: KeyedLocks,
}

impl ProcessWebhookUseCase {
    /// Wire the use case.
    #[must_use]
    pub fn new(
        gateway: Arc<ShippingGateway>,
        shipments: Arc<dyn ShipmentRepository>,
        orders: Arc<dyn OrderRepository>,
        cache: Arc<dyn CachePort>,
        bus: Arc<dyn EventBusPort>,
        hub: Arc<PushHub>,
    ) -> Self {
        Self {
            gateway,
            shipments,
            orders,
            cache,
            bus,
            hub,
            locks: KeyedLocks::new(),
        }
    }

    /// Execute one webhook delivery.
    ///
    /// # Errors
    ///
    /// `INVALID_SIGNATURE` (before any state read), `INVALID_PROVIDER`,
    /// `RATE_LIMITED`, parse failures as `PROVIDER_ERROR`, and
    /// `NOT_FOUND` when no shipment matches the payload.
    pub async fn execute(
        &self,
        provider_raw: &str,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookOutcome, AppError> {
        let rate_key = format!("rate:webhook:{}", provider_raw.to_lowercase());
        if self
            .cache
            .incr(&rate_key, Duration::from_secs(60))
            .await?
            > RATE_LIMIT_PER_MINUTE
        {
            return Err(AppError::new(
                ErrorKind::RateLimited,
                format!("provider {provider_raw} exceeded webhook rate limit"),
            ));
        }

        // Validates the signature and normalizes the payload; no state
        // has been read yet when an invalid signature bounces here.
        let event = self
            .gateway
            .process_webhook(provider_raw, payload, signature)
            .await?;

        // Serialize per tracking number: the cache key is the
        // coordination key.
        let lock_key = event
            .tracking_number
            .as_ref()
            .map_or_else(|| event.provider_order_id.to_string(), ToString::to_string);
        let lock = self.locks.lock_for(&lock_key);
        let _guard = lock.lock().await;

        let idempotency_key = format!(
            "webhook:{}:{}:{}:{}",
            event.provider,
            event.provider_order_id,
            event.provider_status,
            event.occurred_at.timestamp(),
        );
        if self.cache.incr(&idempotency_key, IDEMPOTENCY_TTL).await? > 1 {
            return Ok(WebhookOutcome {
                event,
                status_updated: false,
                duplicate: true,
            });
        }

        let mut shipment = match self
            .shipments
            .find_by_provider_order_id(&event.provider_order_id)
            .await?
        {
            Some(shipment) => shipment,
            None => match &event.tracking_number {
                Some(tracking_number) => self
                    .shipments
                    .find_by_tracking_number(tracking_number)
                    .await?
                    .ok_or_else(|| AppError::not_found("shipment", tracking_number))?,
                None => {
                    return Err(AppError::not_found(
                        "shipment",
                        &event.provider_order_id,
                    ));
                }
            },
        };

        let mut entry = HistoryEntry::new(
            event.status,
            event.provider_status.clone(),
            event.occurred_at,
        );
        if let Some(message) = &event.message {
            entry = entry.with_message(message.clone());
        }
        for (key, value) in &event.extra {
            entry = entry.with_extra(key.clone(), value.clone());
        }

        let applied = shipment.record_status(entry);
        shipment.last_webhook_at = Some(Utc::now());
        self.shipments.save(&shipment).await?;

        if applied == StatusApplied::Updated {
            publish_or_log(
                &*self.bus,
                &DomainEvent::ShipmentStatusChanged {
                    shipment_id: shipment.id.clone(),
                    tracking_number: shipment.tracking_number.clone(),
                    status: shipment.status,
                    at: event.occurred_at,
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
            self.advance_sub_order(&shipment, event.status).await?;
        }

        Ok(WebhookOutcome {
            event,
            status_updated: applied == StatusApplied::Updated,
            duplicate: false,
        })
    }

    /// External carriers drive sub-order fulfillment through webhooks:
    /// pickup starts shipping, delivery opens the return window.
    async fn advance_sub_order(
        &self,
        shipment: &crate::domain::shipment::Shipment,
        status: UnifiedShippingStatus,
    ) -> Result<(), AppError> {
        let target = match status {
            UnifiedShippingStatus::PickedUp => SubOrderStatus::Shipping,
            UnifiedShippingStatus::Delivered => SubOrderStatus::Delivered,
            _ => return Ok(()),
        };

        let Some(mut sub_order) = self.orders.find_sub_order(&shipment.sub_order_id).await? else {
            return Ok(());
        };
        if sub_order.status == target {
            return Ok(());
        }

        let now = Utc::now();
        let result = if target == SubOrderStatus::Delivered {
            sub_order.mark_delivered(now)
        } else {
            sub_order.transition_to(target, now)
        };
        match result {
            Ok(()) => {
                self.orders.save_sub_order(&sub_order).await?;
                let order_status = match self.orders.find_order(&sub_order.order_id).await? {
                    Some(order) => order.status,
                    None => return Ok(()),
                };
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
            }
            Err(err) => {
                // A webhook racing ahead of the seller flow is data, not
                // an outage; record and move on.
                tracing::warn!(
                    sub_order_id = %sub_order.id,
                    status = %status,
                    error = %err,
                    "webhook could not advance sub-order"
                );
            }
        }
        Ok(())
    }
}
