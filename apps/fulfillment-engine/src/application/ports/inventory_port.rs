//! Inventory Port (Collaborator Contract)
//!
//! Stock is reserved at order creation and released on cancel or payment
//! failure. All three operations are idempotent by `(order, variant)`.

use async_trait::async_trait;

use crate::domain::shared::{OrderId, VariantId};
use crate::error::AppError;

/// Port into the inventory collaborator.
#[async_trait]
pub trait InventoryPort: Send + Sync {
    /// Reserve stock for an order line. Fails with `INSUFFICIENT_STOCK`.
    async fn reserve(
        &self,
        order_id: &OrderId,
        variant_id: &VariantId,
        qty: u32,
    ) -> Result<(), AppError>;

    /// Release a reservation. Idempotent: releasing twice is a no-op.
    async fn release(
        &self,
        order_id: &OrderId,
        variant_id: &VariantId,
        qty: u32,
    ) -> Result<(), AppError>;

    /// Convert a reservation into a committed decrement.
    async fn confirm(
        &self,
        order_id: &OrderId,
        variant_id: &VariantId,
        qty: u32,
    ) -> Result<(), AppError>;
}
