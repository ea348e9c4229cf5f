//! Cached product reads for the storefront surface.

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{CachePort, CatalogPort, ProductSnapshot};
use crate::error::AppError;

/// Product snapshots cache for a minute.
const PRODUCT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Read-through product reader.
pub struct CachedProductReader {
    catalog: Arc<dyn CatalogPort>,
    cache: Arc<dyn CachePort>,
}

impl CachedProductReader {
    /// Wire the reader.
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogPort>, cache: Arc<dyn CachePort>) -> Self {
        Self { catalog, cache }
    }

    /// Find a product by id or slug, through the cache.
    pub async fn get(&self, id_or_slug: &str) -> Result<Option<ProductSnapshot>, AppError> {
        let key = format!("product:{id_or_slug}");
        if let Some(cached) = self.cache.get(&key).await? {
            if let Ok(product) = serde_json::from_value(cached) {
                return Ok(Some(product));
            }
        }

        let Some(product) = self.catalog.find_product(id_or_slug).await? else {
            return Ok(None);
        };
        if let Ok(value) = serde_json::to_value(&product) {
            let _ = self.cache.set(&key, value, PRODUCT_CACHE_TTL).await;
        }
        Ok(Some(product))
    }
}
