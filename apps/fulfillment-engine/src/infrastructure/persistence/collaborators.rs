//! In-memory collaborator adapters: inventory, refunds, catalog.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

use crate::application::ports::{
    CatalogPort, InventoryPort, ProductSnapshot, RefundPort, RefundReceipt,
};
use crate::domain::shared::{Money, OrderId, VariantId};
use crate::error::{AppError, ErrorKind};

/// In-memory inventory with idempotent reserve/release by (order, variant).
#[derive(Default)]
pub struct InMemoryInventory {
    stock: RwLock<HashMap<VariantId, u32>>,
    reservations: RwLock<HashSet<(OrderId, VariantId)>>,
    releases: RwLock<HashSet<(OrderId, VariantId)>>,
}

impl InMemoryInventory {
    /// Create an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the available stock of a variant.
    pub fn stock(&self, variant_id: &VariantId, qty: u32) {
        self.stock.write().insert(variant_id.clone(), qty);
    }

    /// Remaining stock of a variant.
    #[must_use]
    pub fn available(&self, variant_id: &VariantId) -> u32 {
        self.stock.read().get(variant_id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl InventoryPort for InMemoryInventory {
    async fn reserve(
        &self,
        order_id: &OrderId,
        variant_id: &VariantId,
        qty: u32,
    ) -> Result<(), AppError> {
        let key = (order_id.clone(), variant_id.clone());
        if self.reservations.read().contains(&key) {
            return Ok(());
        }

        let mut stock = self.stock.write();
        let available = stock.get(variant_id).copied().unwrap_or(0);
        if available < qty {
            return Err(AppError::new(
                ErrorKind::InsufficientStock,
                format!("variant {variant_id}: {available} in stock, {qty} requested"),
            ));
        }
        stock.insert(variant_id.clone(), available - qty);
        self.reservations.write().insert(key);
        Ok(())
    }

    async fn release(
        &self,
        order_id: &OrderId,
        variant_id: &VariantId,
        qty: u32,
    ) -> Result<(), AppError> {
        let key = (order_id.clone(), variant_id.clone());
        // Idempotent: only a reservation not yet released goes back.
        if !self.reservations.read().contains(&key) || !self.releases.write().insert(key) {
            return Ok(());
        }
        let mut stock = self.stock.write();
        let available = stock.get(variant_id).copied().unwrap_or(0);
        stock.insert(variant_id.clone(), available + qty);
        Ok(())
    }

    async fn confirm(
        &self,
        order_id: &OrderId,
        variant_id: &VariantId,
        _qty: u32,
    ) -> Result<(), AppError> {
        let key = (order_id.clone(), variant_id.clone());
        if !self.reservations.read().contains(&key) {
            return Err(AppError::conflict(format!(
                "no reservation for order {order_id} variant {variant_id}"
            )));
        }
        Ok(())
    }
}

/// Recording refund adapter; scriptable to fail.
#[derive(Default)]
pub struct RecordingRefundPort {
    refunds: RwLock<Vec<(OrderId, Money)>>,
    fail: RwLock<bool>,
}

impl RecordingRefundPort {
    /// Create an adapter that accepts every refund.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent refunds fail.
    pub fn fail_refunds(&self, fail: bool) {
        *self.fail.write() = fail;
    }

    /// Refunds initiated so far.
    #[must_use]
    pub fn refunds(&self) -> Vec<(OrderId, Money)> {
        self.refunds.read().clone()
    }
}

#[async_trait]
impl RefundPort for RecordingRefundPort {
    async fn refund(&self, order_id: &OrderId, amount: Money) -> Result<RefundReceipt, AppError> {
        if *self.fail.read() {
            return Err(AppError::new(
                ErrorKind::ProviderError,
                "payment provider refused the refund",
            ));
        }
        self.refunds.write().push((order_id.clone(), amount));
        Ok(RefundReceipt {
            reference: format!("rf-{}", uuid::Uuid::new_v4().simple()),
            amount,
            at: Utc::now(),
        })
    }
}

/// In-memory catalog with seeded products.
#[derive(Default)]
pub struct InMemoryCatalog {
    products: RwLock<Vec<ProductSnapshot>>,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product.
    pub fn seed(&self, product: ProductSnapshot) {
        self.products.write().push(product);
    }
}

#[async_trait]
impl CatalogPort for InMemoryCatalog {
    async fn find_product(&self, id_or_slug: &str) -> Result<Option<ProductSnapshot>, AppError> {
        Ok(self
            .products
            .read()
            .iter()
            .find(|p| p.id == id_or_slug || p.slug == id_or_slug)
            .cloned())
    }
}
