//! In-memory provider configuration repository.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::application::ports::{ProviderConfig, ProviderConfigRepository};
use crate::domain::shared::ShopId;
use crate::error::AppError;
use crate::providers::ProviderCode;

/// In-memory implementation of [`ProviderConfigRepository`].
#[derive(Default)]
pub struct InMemoryProviderConfigRepository {
    configs: RwLock<HashMap<(ShopId, ProviderCode), ProviderConfig>>,
}

impl InMemoryProviderConfigRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProviderConfigRepository for InMemoryProviderConfigRepository {
    async fn find(
        &self,
        shop_id: &ShopId,
        code: ProviderCode,
    ) -> Result<Option<ProviderConfig>, AppError> {
        Ok(self
            .configs
            .read()
            .get(&(shop_id.clone(), code))
            .cloned())
    }

    async fn list_enabled(&self, shop_id: &ShopId) -> Result<Vec<ProviderConfig>, AppError> {
        let mut enabled: Vec<ProviderConfig> = self
            .configs
            .read()
            .values()
            .filter(|c| &c.shop_id == shop_id && c.is_enabled)
            .cloned()
            .collect();
        enabled.sort_by_key(|c| c.provider_code.as_str());
        Ok(enabled)
    }

    async fn find_default(&self, shop_id: &ShopId) -> Result<Option<ProviderConfig>, AppError> {
        Ok(self
            .configs
            .read()
            .values()
            .find(|c| &c.shop_id == shop_id && c.is_default && c.is_enabled)
            .cloned())
    }

    async fn save(&self, config: &ProviderConfig) -> Result<(), AppError> {
        let mut configs = self.configs.write();
        if config.is_default {
            // At most one default per shop.
            for existing in configs.values_mut() {
                if existing.shop_id == config.shop_id {
                    existing.is_default = false;
                }
            }
        }
        configs.insert(
            (config.shop_id.clone(), config.provider_code),
            config.clone(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(shop: &str, code: ProviderCode, is_default: bool) -> ProviderConfig {
        ProviderConfig {
            shop_id: ShopId::new(shop),
            provider_code: code,
            encrypted_credentials: "blob".to_string(),
            is_enabled: true,
            is_default,
        }
    }

    #[tokio::test]
    async fn at_most_one_default_per_shop() {
        let repo = InMemoryProviderConfigRepository::new();
        repo.save(&config("shop-x", ProviderCode::Ghtk, true))
            .await
            .unwrap();
        repo.save(&config("shop-x", ProviderCode::Ghn, true))
            .await
            .unwrap();

        let default = repo
            .find_default(&ShopId::new("shop-x"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(default.provider_code, ProviderCode::Ghn);

        let ghtk = repo
            .find(&ShopId::new("shop-x"), ProviderCode::Ghtk)
            .await
            .unwrap()
            .unwrap();
        assert!(!ghtk.is_default);
    }

    #[tokio::test]
    async fn list_enabled_skips_disabled() {
        let repo = InMemoryProviderConfigRepository::new();
        repo.save(&config("shop-x", ProviderCode::Ghtk, false))
            .await
            .unwrap();
        let mut disabled = config("shop-x", ProviderCode::Ghn, false);
        disabled.is_enabled = false;
        repo.save(&disabled).await.unwrap();

        let enabled = repo.list_enabled(&ShopId::new("shop-x")).await.unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].provider_code, ProviderCode::Ghtk);
    }
}
