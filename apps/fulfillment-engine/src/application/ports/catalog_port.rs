//! Catalog Read Port (Collaborator Contract)
//!
//! The catalog lives outside the core; the fulfillment surface only needs
//! cached product reads for the storefront product endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{Money, ShopId, VariantId};
use crate::error::AppError;

/// A read-only product snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Product id.
    pub id: String,
    /// URL slug.
    pub slug: String,
    /// Selling shop.
    pub shop_id: ShopId,
    /// Display name.
    pub name: String,
    /// Default variant.
    pub variant_id: VariantId,
    /// Current price (flash-sale overrides already applied upstream).
    pub price: Money,
    /// Primary image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Port into the catalog collaborator.
#[async_trait]
pub trait CatalogPort: Send + Sync {
    /// Find a product by id or slug.
    async fn find_product(&self, id_or_slug: &str) -> Result<Option<ProductSnapshot>, AppError>;
}
