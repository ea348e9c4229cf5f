//! Real-time pipeline: the in-process push hub and GPS ingestion.

pub mod hub;
pub mod location;

pub use hub::{ChannelKey, ChannelKind, PushHub, PushMessage, SUBSCRIBER_QUEUE_CAPACITY};
pub use location::{LOCATION_TTL, LocationPipeline, LocationSample, TRACE_CAPACITY};
