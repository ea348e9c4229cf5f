//! Checkout: one order in, one sub-order per shop out.
//!
//! Stock is reserved before anything is persisted; a failed reservation
//! rolls back the earlier ones (release is idempotent, so a crashed
//! rollback can be replayed).

use chrono::Utc;
use std::sync::Arc;

use crate::application::ports::{
    EventBusPort, InventoryPort, OrderRepository, publish_or_log,
};
use crate::domain::order::{
    DomainEvent, Order, OrderItem, OrderTotals, PaymentMethod, ShippingSnapshot, SubOrder,
};
use crate::domain::shared::{Actor, Money, OrderItemId, ShopId, VariantId};
use crate::domain::shipment::{TrackingEvent, TrackingEventKind};
use crate::error::AppError;

/// One line of a shop's cart slice.
#[derive(Debug, Clone)]
pub struct CheckoutItemInput {
    /// Purchased variant.
    pub variant_id: VariantId,
    /// Product name snapshot.
    pub product_name: String,
    /// SKU snapshot.
    pub sku: String,
    /// Unit price snapshot.
    pub unit_price: Money,
    /// Quantity.
    pub quantity: u32,
    /// Unit weight in grams.
    pub weight_grams: u32,
    /// Image snapshot.
    pub image_url: Option<String>,
}

/// One shop's slice of the cart.
#[derive(Debug, Clone)]
pub struct CheckoutShopInput {
    /// The shop.
    pub shop_id: ShopId,
    /// Its items.
    pub items: Vec<CheckoutItemInput>,
    /// Shipping fee quoted for this shop's parcel.
    pub shipping_fee: Money,
}

/// Validated checkout input (assembled by the storefront collaborator).
#[derive(Debug, Clone)]
pub struct CheckoutInput {
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Shipping destination snapshot.
    pub shipping: ShippingSnapshot,
    /// Per-shop cart slices.
    pub shops: Vec<CheckoutShopInput>,
    /// Discounts applied across the order.
    pub discount_total: Money,
}

/// The created order and its fan-out.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CheckoutReceipt {
    /// The order.
    pub order: Order,
    /// One sub-order per shop.
    pub sub_orders: Vec<SubOrder>,
}

/// Use case: create an order from a checkout.
pub struct CheckoutUseCase {
    orders: Arc<dyn OrderRepository>,
    inventory: Arc<dyn InventoryPort>,
    bus: Arc<dyn EventBusPort>,
}

impl CheckoutUseCase {
    /// Wire the use case.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        inventory: Arc<dyn InventoryPort>,
        bus: Arc<dyn EventBusPort>,
    ) -> Self {
        Self {
            orders,
            inventory,
            bus,
        }
    }

    /// Execute the checkout.
    ///
    /// # Errors
    ///
    /// `VALIDATION_ERROR` on an empty cart or zero quantities,
    /// `INSUFFICIENT_STOCK` when a reservation fails.
    pub async fn execute(
        &self,
        actor: &Actor,
        input: CheckoutInput,
    ) -> Result<CheckoutReceipt, AppError> {
        if input.shops.is_empty() {
            return Err(AppError::validation("checkout has no shops"));
        }
        for shop in &input.shops {
            if shop.items.is_empty() {
                return Err(AppError::validation(format!(
                    "shop {} has no items",
                    shop.shop_id
                )));
            }
            if shop.items.iter().any(|item| item.quantity == 0) {
                return Err(AppError::validation("zero-quantity item"));
            }
        }

        let now = Utc::now();
        let subtotal = input
            .shops
            .iter()
            .flat_map(|shop| shop.items.iter())
            .fold(Money::ZERO, |acc, item| {
                acc + line_total(item.unit_price, item.quantity)
            });
        let shipping_total = input
            .shops
            .iter()
            .fold(Money::ZERO, |acc, shop| acc + shop.shipping_fee);
        let totals = OrderTotals::new(subtotal, shipping_total, input.discount_total)
            .map_err(AppError::from)?;

        let order = Order::new(
            actor.user_id.clone(),
            format!("CHM{}", uuid::Uuid::new_v4().simple().to_string()[..10].to_uppercase()),
            totals,
            input.payment_method,
            input.shipping,
            now,
        );

        // Reserve everything up front; roll back on the first failure.
        let mut reserved: Vec<(VariantId, u32)> = Vec::new();
        for shop in &input.shops {
            for item in &shop.items {
                if let Err(err) = self
                    .inventory
                    .reserve(&order.id, &item.variant_id, item.quantity)
                    .await
                {
                    for (variant_id, qty) in &reserved {
                        let _ = self.inventory.release(&order.id, variant_id, *qty).await;
                    }
                    return Err(err);
                }
                reserved.push((item.variant_id.clone(), item.quantity));
            }
        }

        let mut sub_orders = Vec::with_capacity(input.shops.len());
        let mut items = Vec::new();
        for shop in &input.shops {
            let shop_subtotal = shop.items.iter().fold(Money::ZERO, |acc, item| {
                acc + line_total(item.unit_price, item.quantity)
            });
            let sub_order = SubOrder::new(
                order.id.clone(),
                shop.shop_id.clone(),
                shop_subtotal,
                shop.shipping_fee,
                now,
            );
            for item in &shop.items {
                items.push(OrderItem {
                    id: OrderItemId::generate(),
                    sub_order_id: sub_order.id.clone(),
                    variant_id: item.variant_id.clone(),
                    product_name: item.product_name.clone(),
                    sku: item.sku.clone(),
                    unit_price: item.unit_price,
                    quantity: item.quantity,
                    total_price: line_total(item.unit_price, item.quantity),
                    weight_grams: item.weight_grams,
                    image_url: item.image_url.clone(),
                });
            }
            sub_orders.push(sub_order);
        }

        self.orders.save_order(&order).await?;
        for sub_order in &sub_orders {
            self.orders.save_sub_order(sub_order).await?;
            self.orders
                .append_tracking_event(&TrackingEvent::new(
                    sub_order.id.clone(),
                    TrackingEventKind::OrderPlaced,
                    format!("Đơn hàng {} đã được tạo", order.order_number),
                    actor.role,
                    now,
                ))
                .await?;
        }
        self.orders.save_items(&items).await?;

        publish_or_log(
            &*self.bus,
            &DomainEvent::OrderStatusChanged {
                order_id: order.id.clone(),
                sub_order_id: None,
                order_status: order.status,
                sub_order_status: None,
                at: now,
            },
        )
        .await;

        Ok(CheckoutReceipt { order, sub_orders })
    }
}

fn line_total(unit_price: Money, quantity: u32) -> Money {
    unit_price * quantity
}
