//! Carrier endpoint and system credential settings.
//!
//! Per-shop credentials live encrypted in the provider config store;
//! these are the process-level pieces: endpoints, webhook secrets,
//! sandbox flags, the vault secret, and the system accounts used for
//! webhook validation where no shop is known yet.

use crate::providers::{CarrierEndpoint, ProviderCreds};

/// One carrier's process-level settings.
#[derive(Debug, Clone)]
pub struct CarrierSettings {
    /// Endpoint and webhook secret.
    pub endpoint: CarrierEndpoint,
    /// System account for webhook-time provider construction.
    pub system_creds: ProviderCreds,
}

/// All carrier settings plus the vault secret.
#[derive(Clone)]
pub struct ProvidersSettings {
    /// GHTK settings.
    pub ghtk: CarrierSettings,
    /// GHN settings.
    pub ghn: CarrierSettings,
    /// Viettel Post settings.
    pub viettel_post: CarrierSettings,
    /// Secret the credential vault derives keys from (`VAULT_SECRET`).
    pub vault_secret: String,
    /// Retry attempts per provider call (`PROVIDER_RETRY_MAX`).
    pub retry_max_attempts: u32,
}

impl std::fmt::Debug for ProvidersSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvidersSettings")
            .field("ghtk", &self.ghtk.endpoint.base_url)
            .field("ghn", &self.ghn.endpoint.base_url)
            .field("viettel_post", &self.viettel_post.endpoint.base_url)
            .field("vault_secret", &"[REDACTED]")
            .field("retry_max_attempts", &self.retry_max_attempts)
            .finish()
    }
}

impl ProvidersSettings {
    /// Load from environment. Missing values fall back to sandbox
    /// endpoints and empty system accounts (fine for development, where
    /// only the in-house fleet runs).
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            ghtk: CarrierSettings {
                endpoint: CarrierEndpoint {
                    base_url: env_or("GHTK_BASE_URL", "https://services-staging.ghtk.vn"),
                    webhook_secret: env_or("GHTK_WEBHOOK_SECRET", ""),
                    sandbox: env_flag("GHTK_SANDBOX"),
                },
                system_creds: ProviderCreds::Ghtk {
                    api_token: env_or("GHTK_API_TOKEN", ""),
                },
            },
            ghn: CarrierSettings {
                endpoint: CarrierEndpoint {
                    base_url: env_or("GHN_BASE_URL", "https://dev-online-gateway.ghn.vn"),
                    webhook_secret: env_or("GHN_WEBHOOK_SECRET", ""),
                    sandbox: env_flag("GHN_SANDBOX"),
                },
                system_creds: ProviderCreds::Ghn {
                    token: env_or("GHN_TOKEN", ""),
                    shop_code: env_or("GHN_SHOP_CODE", ""),
                },
            },
            viettel_post: CarrierSettings {
                endpoint: CarrierEndpoint {
                    base_url: env_or("VTP_BASE_URL", "https://partner-testing.viettelpost.vn"),
                    webhook_secret: env_or("VTP_WEBHOOK_SECRET", ""),
                    sandbox: env_flag("VTP_SANDBOX"),
                },
                system_creds: ProviderCreds::ViettelPost {
                    username: env_or("VTP_USERNAME", ""),
                    password: env_or("VTP_PASSWORD", ""),
                },
            },
            vault_secret: env_or("VAULT_SECRET", "dev-only-vault-secret"),
            retry_max_attempts: std::env::var("PROVIDER_RETRY_MAX")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_flag(key: &str) -> bool {
    std::env::var(key).is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}
