//! Keyed async locks.
//!
//! Serializes work per entity id: dispatch per shipment, webhook intake
//! per tracking number. The in-process lock is an optimization; cross-
//! process correctness rests on conditional updates at the store.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A map of named async mutexes, created on first use.
#[derive(Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    /// Create an empty lock map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the lock for a key.
    #[must_use]
    pub fn lock_for(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }

    /// Number of distinct keys seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// Whether any key has been locked yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}
