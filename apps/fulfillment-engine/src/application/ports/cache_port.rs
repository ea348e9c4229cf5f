//! Cache / KV Port (Driven Port)
//!
//! TTL'd values: fee quotes, tracking snapshots, product snapshots,
//! rate-limit counters, last-known shipper locations. Operations are
//! individually race-safe: `set` is last-write-wins, `del` unconditional.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::error::AppError;

/// Port for the shared cache.
#[async_trait]
pub trait CachePort: Send + Sync {
    /// Get a value, `None` on miss or expiry.
    async fn get(&self, key: &str) -> Result<Option<Value>, AppError>;

    /// Set a value with a TTL. Last write wins.
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), AppError>;

    /// Delete a key unconditionally.
    async fn del(&self, key: &str) -> Result<(), AppError>;

    /// Increment a counter, creating it with the TTL on first touch.
    /// Returns the post-increment value. Used for rate limiting.
    async fn incr(&self, key: &str, ttl: Duration) -> Result<u64, AppError>;
}
