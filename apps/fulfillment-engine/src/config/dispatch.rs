//! Dispatch settings.

use crate::dispatch::RegionCutover;
use crate::domain::shared::Region;

/// Dispatch and daily-reset configuration.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Per-region counter reset cut-overs. Vietnam spans one timezone
    /// today (`UTC+7`); the per-region offsets stay configurable
    /// (`RESET_UTC_OFFSET_<REGION>`, `RESET_HOUR_<REGION>`).
    pub cutovers: Vec<RegionCutover>,
    /// Seconds between reset polls (`RESET_POLL_INTERVAL_SECS`).
    pub poll_interval_secs: u64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            cutovers: [Region::North, Region::Central, Region::South]
                .into_iter()
                .map(|region| RegionCutover {
                    region,
                    utc_offset_hours: 7,
                    cutover_hour: 0,
                })
                .collect(),
            poll_interval_secs: 60,
        }
    }
}

impl DispatchSettings {
    /// Load from environment, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let cutovers = defaults
            .cutovers
            .into_iter()
            .map(|cutover| {
                let suffix = cutover.region.as_str().to_uppercase();
                RegionCutover {
                    region: cutover.region,
                    utc_offset_hours: env_i32(&format!("RESET_UTC_OFFSET_{suffix}"))
                        .unwrap_or(cutover.utc_offset_hours),
                    cutover_hour: env_u32(&format!("RESET_HOUR_{suffix}"))
                        .unwrap_or(cutover.cutover_hour),
                }
            })
            .collect();
        Self {
            cutovers,
            poll_interval_secs: env_u64("RESET_POLL_INTERVAL_SECS")
                .unwrap_or(defaults.poll_interval_secs),
        }
    }
}

fn env_i32(key: &str) -> Option<i32> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_covers_all_regions() {
        let settings = DispatchSettings::default();
        assert_eq!(settings.cutovers.len(), 3);
        assert!(settings.cutovers.iter().all(|c| c.utc_offset_hours == 7));
    }
}
