//! Shipper GPS ingestion.
//!
//! Samples arrive at roughly 1 Hz from the shipper app. Each one is kept
//! as the last-known location in the cache (30 s TTL), broadcast to the
//! shipment's live channel, and appended to a per-shipper in-memory ring
//! buffer for spot-debug traces. Samples are ephemeral by design; nothing
//! here is durable.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::CachePort;
use crate::domain::shared::{ShipmentId, ShipperId};
use crate::error::AppError;

use super::hub::{ChannelKey, PushHub, PushMessage};

/// Last-known location TTL beyond the last sample.
pub const LOCATION_TTL: Duration = Duration::from_secs(30);
/// Ring buffer depth per shipper.
pub const TRACE_CAPACITY: usize = 100;

/// One GPS sample from the shipper app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Heading in degrees, when the device reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    /// Speed in km/h, when the device reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Reported accuracy in meters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Shipment the shipper is currently moving, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_id: Option<ShipmentId>,
    /// Sample time.
    pub at: DateTime<Utc>,
}

/// Ingests location samples and fans them out.
pub struct LocationPipeline {
    cache: Arc<dyn CachePort>,
    hub: Arc<PushHub>,
    traces: RwLock<HashMap<ShipperId, VecDeque<LocationSample>>>,
}

impl LocationPipeline {
    /// Wire the pipeline.
    #[must_use]
    pub fn new(cache: Arc<dyn CachePort>, hub: Arc<PushHub>) -> Self {
        Self {
            cache,
            hub,
            traces: RwLock::new(HashMap::new()),
        }
    }

    fn location_key(shipper_id: &ShipperId) -> String {
        format!("shipper:location:{shipper_id}")
    }

    /// Ingest one sample: cache it, broadcast it, buffer it.
    pub async fn ingest(
        &self,
        shipper_id: &ShipperId,
        sample: LocationSample,
    ) -> Result<(), AppError> {
        let payload = serde_json::to_value(&sample)
            .map_err(|e| AppError::internal(format!("location serialization failed: {e}")))?;

        self.cache
            .set(&Self::location_key(shipper_id), payload.clone(), LOCATION_TTL)
            .await?;

        if let Some(shipment_id) = &sample.shipment_id {
            let mut enriched = payload;
            if let Some(object) = enriched.as_object_mut() {
                object.insert(
                    "shipper_id".to_string(),
                    serde_json::Value::String(shipper_id.to_string()),
                );
            }
            self.hub.publish(
                &ChannelKey::shipment(shipment_id.as_str()),
                &PushMessage::shipper_location(enriched),
            );
        }

        let mut traces = self.traces.write();
        let buffer = traces.entry(shipper_id.clone()).or_default();
        if buffer.len() == TRACE_CAPACITY {
            buffer.pop_front();
        }
        buffer.push_back(sample);
        Ok(())
    }

    /// Last cached location of a shipper, when still fresh.
    pub async fn last_known(&self, shipper_id: &ShipperId) -> Result<Option<LocationSample>, AppError> {
        let Some(value) = self.cache.get(&Self::location_key(shipper_id)).await? else {
            return Ok(None);
        };
        Ok(serde_json::from_value(value).ok())
    }

    /// Recent trace of a shipper, oldest first. Debug surface only.
    #[must_use]
    pub fn recent_trace(&self, shipper_id: &ShipperId) -> Vec<LocationSample> {
        self.traces
            .read()
            .get(shipper_id)
            .map(|buffer| buffer.iter().cloned().collect())
            .unwrap_or_default()
    }
}
