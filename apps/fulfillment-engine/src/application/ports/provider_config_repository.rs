//! Provider Configuration Port (Driven Port)
//!
//! Per-shop carrier settings. Credentials are stored encrypted; the vault
//! decrypts them on read.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::shared::ShopId;
use crate::error::AppError;
use crate::providers::ProviderCode;

/// Carrier settings for one shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Owning shop.
    pub shop_id: ShopId,
    /// The carrier.
    pub provider_code: ProviderCode,
    /// Credentials blob, AES-256-CBC encrypted and base64 encoded.
    pub encrypted_credentials: String,
    /// Whether the shop offers this carrier at checkout.
    pub is_enabled: bool,
    /// Whether this is the shop's default carrier. At most one per shop.
    pub is_default: bool,
}

/// Port for provider configuration persistence.
#[async_trait]
pub trait ProviderConfigRepository: Send + Sync {
    /// Find the config of one (shop, carrier) pair.
    async fn find(
        &self,
        shop_id: &ShopId,
        code: ProviderCode,
    ) -> Result<Option<ProviderConfig>, AppError>;

    /// Enabled carriers of a shop.
    async fn list_enabled(&self, shop_id: &ShopId) -> Result<Vec<ProviderConfig>, AppError>;

    /// The shop's default carrier, when set.
    async fn find_default(&self, shop_id: &ShopId) -> Result<Option<ProviderConfig>, AppError>;

    /// Insert or update a config. Setting `is_default` clears the flag on
    /// the shop's other carriers.
    async fn save(&self, config: &ProviderConfig) -> Result<(), AppError>;
}
