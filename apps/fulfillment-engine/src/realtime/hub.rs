//! The in-process push channel.
//!
//! Single-process fan-out of ephemeral events to interested connections,
//! keyed by entity id. Every subscriber gets a bounded queue of
//! [`SUBSCRIBER_QUEUE_CAPACITY`]; a subscriber that cannot drain is
//! disconnected, never blocked on.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Bounded per-subscriber queue depth.
pub const SUBSCRIBER_QUEUE_CAPACITY: usize = 64;

/// What entity a channel belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// One shipment's live feed (location + status).
    Shipment,
    /// One order's status feed.
    Order,
}

/// A channel key: entity kind plus id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelKey {
    /// Entity kind.
    pub kind: ChannelKind,
    /// Entity id.
    pub id: String,
}

impl ChannelKey {
    /// Channel for a shipment.
    #[must_use]
    pub fn shipment(id: impl Into<String>) -> Self {
        Self {
            kind: ChannelKind::Shipment,
            id: id.into(),
        }
    }

    /// Channel for an order.
    #[must_use]
    pub fn order(id: impl Into<String>) -> Self {
        Self {
            kind: ChannelKind::Order,
            id: id.into(),
        }
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ChannelKind::Shipment => "shipment",
            ChannelKind::Order => "order",
        };
        write!(f, "{kind}:{}", self.id)
    }
}

/// The wire envelope pushed to clients: `{event, payload}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    /// Event name (`shipper:location`, `shipment:status`, `order:status`).
    pub event: String,
    /// Event payload.
    pub payload: Value,
}

impl PushMessage {
    /// A shipper location sample.
    #[must_use]
    pub fn shipper_location(payload: Value) -> Self {
        Self {
            event: "shipper:location".to_string(),
            payload,
        }
    }

    /// A shipment status change.
    #[must_use]
    pub fn shipment_status(payload: Value) -> Self {
        Self {
            event: "shipment:status".to_string(),
            payload,
        }
    }

    /// An order status change.
    #[must_use]
    pub fn order_status(payload: Value) -> Self {
        Self {
            event: "order:status".to_string(),
            payload,
        }
    }
}

struct Subscriber {
    id: u64,
    tx: mpsc::Sender<PushMessage>,
}

/// The hub: a broadcast map keyed by entity id.
#[derive(Default)]
pub struct PushHub {
    channels: RwLock<HashMap<ChannelKey, Vec<Subscriber>>>,
    next_id: AtomicU64,
}

impl PushHub {
    /// Create an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a channel.
    #[must_use]
    pub fn subscribe(&self, key: ChannelKey) -> mpsc::Receiver<PushMessage> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_CAPACITY);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.channels
            .write()
            .entry(key)
            .or_default()
            .push(Subscriber { id, tx });
        rx
    }

    /// Publish a message to a channel's subscribers.
    ///
    /// Full or closed subscriber queues are dropped from the channel; the
    /// return value is how many subscribers received the message.
    pub fn publish(&self, key: &ChannelKey, message: &PushMessage) -> usize {
        let mut channels = self.channels.write();
        let Some(subscribers) = channels.get_mut(key) else {
            return 0;
        };

        let mut delivered = 0;
        subscribers.retain(|subscriber| {
            match subscriber.tx.try_send(message.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        channel = %key,
                        subscriber = subscriber.id,
                        "dropping slow push subscriber"
                    );
                    false
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });
        if subscribers.is_empty() {
            channels.remove(key);
        }
        delivered
    }

    /// Subscribers currently attached to a channel.
    #[must_use]
    pub fn subscriber_count(&self, key: &ChannelKey) -> usize {
        self.channels.read().get(key).map_or(0, Vec::len)
    }

    /// Channels with at least one subscriber.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.read().len()
    }
}
