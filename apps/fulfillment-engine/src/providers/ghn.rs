//! Giao Hàng Nhanh adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::domain::shared::{ProviderOrderId, TrackingNumber};

use super::code::ProviderCode;
use super::http::CarrierHttpClient;
use super::{
    CarrierEndpoint, CreateShipmentRequest, CreateShipmentResponse, FeeQuote, FeeRequest,
    ProviderCreds, ProviderError, ShippingProvider, TrackingInfo, WebhookEvent, status_map,
    webhook,
};

/// GHN carrier adapter. GHN reports string status tokens and scopes every
/// call to a shop code.
#[derive(Debug)]
pub struct GhnProvider {
    http: CarrierHttpClient,
    token: String,
    shop_code: String,
    webhook_secret: String,
}

impl GhnProvider {
    /// Build the adapter from decrypted credentials and endpoint settings.
    ///
    /// # Errors
    ///
    /// Returns `InitFailed` on a credential shape mismatch.
    pub fn new(creds: &ProviderCreds, endpoint: &CarrierEndpoint) -> Result<Self, ProviderError> {
        let ProviderCreds::Ghn { token, shop_code } = creds else {
            return Err(ProviderError::InitFailed {
                code: ProviderCode::Ghn,
                message: "expected ghn credentials".to_string(),
            });
        };
        Ok(Self {
            http: CarrierHttpClient::new(endpoint.base_url.clone())?,
            token: token.clone(),
            shop_code: shop_code.clone(),
            webhook_secret: endpoint.webhook_secret.clone(),
        })
    }

    fn headers(&self) -> [(&str, &str); 2] {
        [("Token", self.token.as_str()), ("ShopId", self.shop_code.as_str())]
    }
}

#[derive(Debug, Deserialize)]
struct GhnWebhookPayload {
    #[serde(rename = "OrderCode")]
    order_code: String,
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "Time", default)]
    time: Option<DateTime<Utc>>,
    #[serde(rename = "Description", default)]
    description: Option<String>,
    #[serde(rename = "Warehouse", default)]
    warehouse: Option<String>,
}

#[async_trait]
impl ShippingProvider for GhnProvider {
    fn code(&self) -> ProviderCode {
        ProviderCode::Ghn
    }

    async fn calculate_fee(&self, request: &FeeRequest) -> Result<FeeQuote, ProviderError> {
        let body = serde_json::json!({
            "from_district": request.pickup.district,
            "from_province": request.pickup.city,
            "to_district": request.delivery.district,
            "to_province": request.delivery.city,
            "weight": request.package.weight_grams,
            "insurance_value": request.package.declared_value,
            "cod_value": request.cod_amount,
        });
        let response = self
            .http
            .post("/v2/shipping-order/fee", &self.headers(), &body)
            .await?;

        let total = response["data"]["total"]
            .as_u64()
            .ok_or_else(|| ProviderError::Parse("data.total missing".to_string()))?;
        Ok(FeeQuote {
            provider: ProviderCode::Ghn,
            fee: Decimal::from(total),
            estimated_days: response["data"]["leadtime_days"].as_u64().map(|d| d as u32),
            fallback: false,
        })
    }

    async fn create_order(
        &self,
        request: &CreateShipmentRequest,
    ) -> Result<CreateShipmentResponse, ProviderError> {
        let body = serde_json::json!({
            "client_order_code": request.reference,
            "from_name": request.pickup_contact.name,
            "from_phone": request.pickup_contact.phone,
            "from_address": request.pickup_address.line,
            "from_district": request.pickup_address.district,
            "from_province": request.pickup_address.city,
            "to_name": request.delivery_contact.name,
            "to_phone": request.delivery_contact.phone,
            "to_address": request.delivery_address.line,
            "to_district": request.delivery_address.district,
            "to_province": request.delivery_address.city,
            "cod_amount": request.cod_amount,
            "insurance_value": request.package.declared_value,
            "weight": request.package.weight_grams,
        });
        let response = self
            .http
            .post("/v2/shipping-order/create", &self.headers(), &body)
            .await?;

        let order_code = response["data"]["order_code"].as_str().unwrap_or_default();
        if order_code.is_empty() {
            return Err(ProviderError::MissingTracking {
                code: ProviderCode::Ghn,
            });
        }
        Ok(CreateShipmentResponse {
            provider_order_id: Some(ProviderOrderId::new(order_code)),
            tracking_number: TrackingNumber::new(order_code),
            fee: response["data"]["total_fee"].as_u64().map(Decimal::from),
        })
    }

    async fn cancel_order(&self, tracking_number: &TrackingNumber) -> Result<(), ProviderError> {
        self.http
            .post(
                "/v2/switch-status/cancel",
                &self.headers(),
                &serde_json::json!({ "order_codes": [tracking_number] }),
            )
            .await?;
        Ok(())
    }

    async fn get_tracking(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<TrackingInfo, ProviderError> {
        let response = self
            .http
            .post(
                "/v2/shipping-order/detail",
                &self.headers(),
                &serde_json::json!({ "order_code": tracking_number }),
            )
            .await?;

        let token = response["data"]["status"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        Ok(TrackingInfo {
            tracking_number: tracking_number.clone(),
            status: status_map::normalize(ProviderCode::Ghn, &token),
            provider_status: token,
            updated_at: response["data"]["updated_date"]
                .as_str()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(Utc::now),
            message: response["data"]["note"].as_str().map(str::to_string),
        })
    }

    fn validate_webhook(&self, payload: &[u8], signature: &str) -> Result<(), ProviderError> {
        webhook::verify(&self.webhook_secret, payload, signature)
    }

    fn parse_webhook(&self, payload: &[u8]) -> Result<WebhookEvent, ProviderError> {
        let parsed: GhnWebhookPayload =
            serde_json::from_slice(payload).map_err(|e| ProviderError::Parse(e.to_string()))?;

        let mut extra = BTreeMap::new();
        if let Some(warehouse) = parsed.warehouse {
            extra.insert("warehouse".to_string(), serde_json::Value::String(warehouse));
        }

        Ok(WebhookEvent {
            provider: ProviderCode::Ghn,
            provider_order_id: ProviderOrderId::new(parsed.order_code.clone()),
            tracking_number: Some(TrackingNumber::new(parsed.order_code)),
            status: status_map::normalize(ProviderCode::Ghn, &parsed.status),
            provider_status: parsed.status,
            occurred_at: parsed.time.unwrap_or_else(Utc::now),
            message: parsed.description,
            extra,
        })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.http.get("/v2/shop/info", &self.headers()).await?;
        Ok(())
    }
}
