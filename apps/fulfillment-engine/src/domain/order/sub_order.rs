//! Per-shop sub-orders and their item snapshots.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::shared::{
    Money, OrderId, OrderItemId, ShipperId, ShopId, SubOrderId, VariantId,
};

use super::errors::OrderError;
use super::state_machine::SubOrderStateMachine;
use super::status::SubOrderStatus;

/// Days after delivery during which a return can be requested.
pub const RETURN_WINDOW_DAYS: i64 = 7;

/// A line item, snapshotted at checkout so catalog edits do not rewrite
/// history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Unique id.
    pub id: OrderItemId,
    /// Owning sub-order.
    pub sub_order_id: SubOrderId,
    /// Purchased variant.
    pub variant_id: VariantId,
    /// Product name at purchase time.
    pub product_name: String,
    /// SKU at purchase time.
    pub sku: String,
    /// Unit price at purchase time.
    pub unit_price: Money,
    /// Quantity purchased.
    pub quantity: u32,
    /// `unit_price * quantity`.
    pub total_price: Money,
    /// Unit weight in grams, for the shipment package.
    pub weight_grams: u32,
    /// Product image at purchase time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// The per-shop slice of an order; the unit of fulfillment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubOrder {
    /// Unique id.
    pub id: SubOrderId,
    /// Parent order.
    pub order_id: OrderId,
    /// Fulfilling shop.
    pub shop_id: ShopId,
    /// Sum of item totals for this shop.
    pub subtotal: Money,
    /// Shipping fee charged for this shop's parcel.
    pub shipping_fee: Money,
    /// `subtotal + shipping_fee`.
    pub total: Money,
    /// Fulfillment state.
    pub status: SubOrderStatus,
    /// Assigned in-house shipper, when dispatched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipper_id: Option<ShipperId>,
    /// End of the return window, set on delivery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_deadline: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
    /// When the parcel was delivered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
}

impl SubOrder {
    /// Create a new sub-order in `pending`.
    #[must_use]
    pub fn new(
        order_id: OrderId,
        shop_id: ShopId,
        subtotal: Money,
        shipping_fee: Money,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SubOrderId::generate(),
            order_id,
            shop_id,
            subtotal,
            shipping_fee,
            total: subtotal + shipping_fee,
            status: SubOrderStatus::Pending,
            shipper_id: None,
            return_deadline: None,
            created_at: now,
            updated_at: now,
            delivered_at: None,
        }
    }

    /// Apply a validated status transition.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSubOrderTransition` if the move is not in the table.
    pub fn transition_to(
        &mut self,
        to: SubOrderStatus,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        SubOrderStateMachine::validate_transition(self.status, to)?;
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    /// Mark the parcel delivered, opening the return window.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSubOrderTransition` unless currently `shipping`.
    pub fn mark_delivered(&mut self, now: DateTime<Utc>) -> Result<(), OrderError> {
        self.transition_to(SubOrderStatus::Delivered, now)?;
        self.delivered_at = Some(now);
        self.return_deadline = Some(now + Duration::days(RETURN_WINDOW_DAYS));
        Ok(())
    }

    /// Whether the sub-order still counts as open work for the seller.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }
}
