//! Event bus settings.

/// Bus connection configuration.
#[derive(Debug, Clone)]
pub struct BusSettings {
    /// Broker URL (`BUS_URL`). The in-memory adapter ignores it; an AMQP
    /// adapter dials it.
    pub url: String,
    /// Seconds between reconciliation passes (`RECONCILE_INTERVAL_SECS`).
    pub reconcile_interval_secs: u64,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            url: "amqp://localhost:5672".to_string(),
            reconcile_interval_secs: 300,
        }
    }
}

impl BusSettings {
    /// Load from environment, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("BUS_URL").unwrap_or(defaults.url),
            reconcile_interval_secs: std::env::var("RECONCILE_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.reconcile_interval_secs),
        }
    }
}
