//! Environment-driven configuration.

pub mod bus;
pub mod cache;
pub mod dispatch;
pub mod providers;
pub mod server;

pub use bus::BusSettings;
pub use cache::CacheSettings;
pub use dispatch::DispatchSettings;
pub use providers::{CarrierSettings, ProvidersSettings};
pub use server::ServerSettings;

/// The whole application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Cache TTLs.
    pub cache: CacheSettings,
    /// Event bus settings.
    pub bus: BusSettings,
    /// Dispatch / daily reset settings.
    pub dispatch: DispatchSettings,
    /// Carrier settings and vault secret.
    pub providers: ProvidersSettings,
}

impl AppConfig {
    /// Load everything from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            server: ServerSettings::from_env(),
            cache: CacheSettings::from_env(),
            bus: BusSettings::from_env(),
            dispatch: DispatchSettings::from_env(),
            providers: ProvidersSettings::from_env(),
        }
    }
}
