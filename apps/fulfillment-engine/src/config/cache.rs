//! Cache settings.

use std::time::Duration;

use crate::providers::facade::{FEE_CACHE_TTL, TRACKING_CACHE_TTL};
use crate::realtime::LOCATION_TTL;

/// Cache TTLs, loaded from environment variables (seconds).
#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    /// Fee quote TTL (`FEE_CACHE_TTL_SECS`).
    pub fee_ttl: Duration,
    /// Tracking snapshot TTL (`TRACKING_CACHE_TTL_SECS`).
    pub tracking_ttl: Duration,
    /// Last-known shipper location TTL (`LOCATION_TTL_SECS`).
    pub location_ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            fee_ttl: FEE_CACHE_TTL,
            tracking_ttl: TRACKING_CACHE_TTL,
            location_ttl: LOCATION_TTL,
        }
    }
}

impl CacheSettings {
    /// Load from environment, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            fee_ttl: env_secs("FEE_CACHE_TTL_SECS").unwrap_or(defaults.fee_ttl),
            tracking_ttl: env_secs("TRACKING_CACHE_TTL_SECS").unwrap_or(defaults.tracking_ttl),
            location_ttl: env_secs("LOCATION_TTL_SECS").unwrap_or(defaults.location_ttl),
        }
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_component_constants() {
        let settings = CacheSettings::default();
        assert_eq!(settings.fee_ttl, Duration::from_secs(300));
        assert_eq!(settings.tracking_ttl, Duration::from_secs(120));
        assert_eq!(settings.location_ttl, Duration::from_secs(30));
    }
}
