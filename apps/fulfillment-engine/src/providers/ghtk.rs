//! Giao Hàng Tiết Kiệm adapter.
//!
//! GHTK reports numeric status ids and signs webhooks with HMAC-SHA256
//! over the canonical JSON body.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::shared::{ProviderOrderId, TrackingNumber};

use super::code::ProviderCode;
use super::http::CarrierHttpClient;
use super::{
    CarrierEndpoint, CreateShipmentRequest, CreateShipmentResponse, FeeQuote, FeeRequest,
    ProviderCreds, ProviderError, ShippingProvider, TrackingInfo, WebhookEvent, status_map,
    webhook,
};

const TOKEN_HEADER: &str = "X-Token";

/// GHTK carrier adapter.
#[derive(Debug)]
pub struct GhtkProvider {
    http: CarrierHttpClient,
    api_token: String,
    webhook_secret: String,
}

impl GhtkProvider {
    /// Build the adapter from decrypted credentials and endpoint settings.
    ///
    /// # Errors
    ///
    /// Returns `InitFailed` on a credential shape mismatch or client
    /// construction failure.
    pub fn new(creds: &ProviderCreds, endpoint: &CarrierEndpoint) -> Result<Self, ProviderError> {
        let ProviderCreds::Ghtk { api_token } = creds else {
            return Err(ProviderError::InitFailed {
                code: ProviderCode::Ghtk,
                message: "expected ghtk credentials".to_string(),
            });
        };
        if api_token.is_empty() {
            return Err(ProviderError::InitFailed {
                code: ProviderCode::Ghtk,
                message: "empty api token".to_string(),
            });
        }
        Ok(Self {
            http: CarrierHttpClient::new(endpoint.base_url.clone())?,
            api_token: api_token.clone(),
            webhook_secret: endpoint.webhook_secret.clone(),
        })
    }

    fn headers(&self) -> [(&str, &str); 1] {
        [(TOKEN_HEADER, self.api_token.as_str())]
    }

    /// GHTK wraps every response in `{success, message?, ...}`; a 200 with
    /// `success=false` is a business rejection, not a transport failure.
    fn ensure_success(body: &Value) -> Result<(), ProviderError> {
        if body["success"].as_bool() == Some(true) {
            Ok(())
        } else {
            Err(ProviderError::Api {
                status: 400,
                message: body["message"]
                    .as_str()
                    .unwrap_or("ghtk rejected the request")
                    .to_string(),
            })
        }
    }
}

/// Webhook body GHTK posts on every status change.
#[derive(Debug, Deserialize)]
struct GhtkWebhookPayload {
    label_id: String,
    status_id: Value,
    #[serde(default)]
    action_time: Option<DateTime<Utc>>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    partner_id: Option<String>,
}

fn status_token(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl ShippingProvider for GhtkProvider {
    fn code(&self) -> ProviderCode {
        ProviderCode::Ghtk
    }

    async fn calculate_fee(&self, request: &FeeRequest) -> Result<FeeQuote, ProviderError> {
        let body = serde_json::json!({
            "pick_province": request.pickup.city,
            "pick_district": request.pickup.district,
            "province": request.delivery.city,
            "district": request.delivery.district,
            "weight": request.package.weight_grams,
            "value": request.package.declared_value,
            "pick_money": request.cod_amount,
        });
        let response = self
            .http
            .post("/services/shipment/fee", &self.headers(), &body)
            .await?;
        Self::ensure_success(&response)?;

        let fee = response["fee"]["fee"]
            .as_u64()
            .ok_or_else(|| ProviderError::Parse("fee.fee missing".to_string()))?;
        Ok(FeeQuote {
            provider: ProviderCode::Ghtk,
            fee: Decimal::from(fee),
            estimated_days: response["fee"]["estimated_days"]
                .as_u64()
                .map(|d| d as u32),
            fallback: false,
        })
    }

    async fn create_order(
        &self,
        request: &CreateShipmentRequest,
    ) -> Result<CreateShipmentResponse, ProviderError> {
        let body = serde_json::json!({
            "order": {
                "id": request.reference,
                "pick_name": request.pickup_contact.name,
                "pick_tel": request.pickup_contact.phone,
                "pick_address": request.pickup_address.line,
                "pick_province": request.pickup_address.city,
                "pick_district": request.pickup_address.district,
                "name": request.delivery_contact.name,
                "tel": request.delivery_contact.phone,
                "address": request.delivery_address.line,
                "province": request.delivery_address.city,
                "district": request.delivery_address.district,
                "pick_money": request.cod_amount,
                "value": request.package.declared_value,
                "weight_option": "gram",
                "total_weight": request.package.weight_grams,
            },
        });
        let response = self
            .http
            .post("/services/shipment/order", &self.headers(), &body)
            .await?;
        Self::ensure_success(&response)?;

        let label = response["order"]["label"].as_str().unwrap_or_default();
        if label.is_empty() {
            return Err(ProviderError::MissingTracking {
                code: ProviderCode::Ghtk,
            });
        }
        Ok(CreateShipmentResponse {
            provider_order_id: Some(ProviderOrderId::new(label)),
            tracking_number: TrackingNumber::new(label),
            fee: response["order"]["fee"].as_u64().map(Decimal::from),
        })
    }

    async fn cancel_order(&self, tracking_number: &TrackingNumber) -> Result<(), ProviderError> {
        let response = self
            .http
            .post(
                &format!("/services/shipment/cancel/{tracking_number}"),
                &self.headers(),
                &serde_json::json!({}),
            )
            .await?;
        Self::ensure_success(&response)
    }

    async fn get_tracking(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<TrackingInfo, ProviderError> {
        let response = self
            .http
            .get(
                &format!("/services/shipment/v2/{tracking_number}"),
                &self.headers(),
            )
            .await?;
        Self::ensure_success(&response)?;

        let token = status_token(&response["order"]["status"]);
        Ok(TrackingInfo {
            tracking_number: tracking_number.clone(),
            status: status_map::normalize(ProviderCode::Ghtk, &token),
            provider_status: token,
            updated_at: response["order"]["modified"]
                .as_str()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(Utc::now),
            message: response["order"]["message"].as_str().map(str::to_string),
        })
    }

    fn validate_webhook(&self, payload: &[u8], signature: &str) -> Result<(), ProviderError> {
        webhook::verify(&self.webhook_secret, payload, signature)
    }

    fn parse_webhook(&self, payload: &[u8]) -> Result<WebhookEvent, ProviderError> {
        let parsed: GhtkWebhookPayload =
            serde_json::from_slice(payload).map_err(|e| ProviderError::Parse(e.to_string()))?;

        let token = status_token(&parsed.status_id);
        let mut extra = BTreeMap::new();
        if let Some(partner_id) = parsed.partner_id {
            extra.insert("partner_id".to_string(), Value::String(partner_id));
        }

        Ok(WebhookEvent {
            provider: ProviderCode::Ghtk,
            provider_order_id: ProviderOrderId::new(parsed.label_id.clone()),
            tracking_number: Some(TrackingNumber::new(parsed.label_id)),
            status: status_map::normalize(ProviderCode::Ghtk, &token),
            provider_status: token,
            occurred_at: parsed.action_time.unwrap_or_else(Utc::now),
            message: parsed.message,
            extra,
        })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let response = self
            .http
            .get("/services/authenticated", &self.headers())
            .await?;
        Self::ensure_success(&response)
    }
}
