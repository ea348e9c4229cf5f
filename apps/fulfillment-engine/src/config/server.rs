//! HTTP server settings.

use std::net::SocketAddr;

/// Server binding configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// API bind address (`BIND_ADDR`, default `0.0.0.0:8080`).
    pub bind_addr: SocketAddr,
    /// Prometheus scrape address (`METRICS_ADDR`), when metrics are on.
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            metrics_addr: None,
        }
    }
}

impl ServerSettings {
    /// Load from environment, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: std::env::var("BIND_ADDR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.bind_addr),
            metrics_addr: std::env::var("METRICS_ADDR")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = ServerSettings::default();
        assert_eq!(settings.bind_addr.port(), 8080);
        assert!(settings.metrics_addr.is_none());
    }
}
