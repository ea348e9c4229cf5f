//! Shop Directory Port (Collaborator Contract)
//!
//! Shop CRUD lives outside the core; fulfillment only needs the pickup
//! address and contact of a shop to build shipments.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{Address, Contact, ShopId, UserId};
use crate::error::AppError;

/// The slice of a shop the core needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopProfile {
    /// Shop id.
    pub id: ShopId,
    /// Owning partner account.
    pub partner_user_id: UserId,
    /// Display name.
    pub name: String,
    /// Warehouse / pickup address.
    pub pickup_address: Address,
    /// Pickup contact.
    pub pickup_contact: Contact,
}

/// Port into the shop directory collaborator.
#[async_trait]
pub trait ShopDirectoryPort: Send + Sync {
    /// Find a shop's fulfillment profile.
    async fn find_shop(&self, shop_id: &ShopId) -> Result<Option<ShopProfile>, AppError>;
}

/// In-memory shop directory for testing and development.
#[derive(Default)]
pub struct InMemoryShopDirectory {
    shops: parking_lot::RwLock<Vec<ShopProfile>>,
}

impl InMemoryShopDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a shop.
    pub fn seed(&self, shop: ShopProfile) {
        self.shops.write().push(shop);
    }
}

#[async_trait]
impl ShopDirectoryPort for InMemoryShopDirectory {
    async fn find_shop(&self, shop_id: &ShopId) -> Result<Option<ShopProfile>, AppError> {
        Ok(self
            .shops
            .read()
            .iter()
            .find(|s| &s.id == shop_id)
            .cloned())
    }
}
