//! HTTP request DTOs and actor extraction.
//!
//! Authentication happens upstream (AuthPort); each request arrives with
//! resolved `x-user-id` / `x-user-role` / `x-shop-id` headers.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::application::use_cases::{CheckoutInput, CheckoutItemInput, CheckoutShopInput};
use crate::domain::order::{PaymentMethod, ShippingSnapshot};
use crate::domain::shared::{Actor, Address, Money, Role, ShopId, UserId, VariantId};
use crate::error::AppError;
use crate::realtime::LocationSample;

/// Resolve the actor from the auth headers.
///
/// # Errors
///
/// `FORBIDDEN` when the identity headers are missing or malformed.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, AppError> {
    let user_id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::forbidden("missing x-user-id header"))?;
    let role = headers
        .get("x-user-role")
        .and_then(|v| v.to_str().ok())
        .and_then(Role::from_str_case_insensitive)
        .ok_or_else(|| AppError::forbidden("missing or unknown x-user-role header"))?;
    let shop_id = headers
        .get("x-shop-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(ShopId::new);

    Ok(Actor::new(UserId::new(user_id), role, shop_id))
}

/// One checkout line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutItemRequest {
    /// Purchased variant.
    pub variant_id: String,
    /// Product name snapshot.
    pub product_name: String,
    /// SKU snapshot.
    pub sku: String,
    /// Unit price.
    pub unit_price: Money,
    /// Quantity.
    pub quantity: u32,
    /// Unit weight in grams.
    pub weight_grams: u32,
    /// Image snapshot.
    #[serde(default)]
    pub image_url: Option<String>,
}

/// One shop slice of the checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutShopRequest {
    /// The shop.
    pub shop_id: String,
    /// Its items.
    pub items: Vec<CheckoutItemRequest>,
    /// Quoted shipping fee.
    pub shipping_fee: Money,
}

/// Checkout body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Recipient name.
    pub shipping_name: String,
    /// Recipient phone.
    pub shipping_phone: String,
    /// Destination address.
    pub shipping_address: Address,
    /// Per-shop slices.
    pub shops: Vec<CheckoutShopRequest>,
    /// Order-level discount.
    #[serde(default)]
    pub discount_total: Money,
}

impl From<CheckoutRequest> for CheckoutInput {
    fn from(request: CheckoutRequest) -> Self {
        Self {
            payment_method: request.payment_method,
            shipping: ShippingSnapshot {
                name: request.shipping_name,
                phone: request.shipping_phone,
                address: request.shipping_address,
            },
            shops: request
                .shops
                .into_iter()
                .map(|shop| CheckoutShopInput {
                    shop_id: ShopId::new(shop.shop_id),
                    items: shop
                        .items
                        .into_iter()
                        .map(|item| CheckoutItemInput {
                            variant_id: VariantId::new(item.variant_id),
                            product_name: item.product_name,
                            sku: item.sku,
                            unit_price: item.unit_price,
                            quantity: item.quantity,
                            weight_grams: item.weight_grams,
                            image_url: item.image_url,
                        })
                        .collect(),
                    shipping_fee: shop.shipping_fee,
                })
                .collect(),
            discount_total: request.discount_total,
        }
    }
}

/// Cancellation body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelRequest {
    /// Free-form reason.
    #[serde(default)]
    pub reason: String,
}

/// Fee quote body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeQuoteRequest {
    /// Shop whose carriers quote.
    pub shop_id: String,
    /// Pickup address.
    pub pickup: Address,
    /// Delivery address.
    pub delivery: Address,
    /// Parcel weight in grams.
    pub weight_grams: u32,
    /// Declared value.
    pub declared_value: Money,
    /// COD amount.
    #[serde(default)]
    pub cod_amount: Money,
}

/// Delivery failure body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailDeliveryRequest {
    /// Why the attempt failed.
    pub reason: String,
}

/// Availability toggle body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    /// App connected.
    pub is_online: bool,
    /// Accepting assignments.
    pub is_available: bool,
}

/// Location push body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationPushRequest {
    /// The GPS sample.
    #[serde(flatten)]
    pub sample: LocationSample,
}
