//! In-memory TTL cache.
//!
//! Implements [`CachePort`] for development and tests. Expired entries are
//! evicted lazily on read. Each operation takes the map lock once, so
//! `set` is last-write-wins and `del` unconditional, matching the port's
//! race-safety contract.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::application::ports::CachePort;
use crate::error::AppError;

#[derive(Clone)]
struct Entry {
    value: Value,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory implementation of [`CachePort`].
#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    /// Whether the cache has no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CachePort for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Value>, AppError> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // Expired: evict under the write lock.
        self.entries.write().remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), AppError> {
        self.entries.write().insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), AppError> {
        self.entries.write().remove(key);
        Ok(())
    }

    async fn incr(&self, key: &str, ttl: Duration) -> Result<u64, AppError> {
        let now = Instant::now();
        let mut entries = self.entries.write();

        let next = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => entry.value.as_u64().unwrap_or(0) + 1,
            _ => 1,
        };
        let expires_at = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) && next > 1 => entry.expires_at,
            _ => now + ttl,
        };
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::from(next),
                expires_at,
            },
        );
        Ok(next)
    }
}
