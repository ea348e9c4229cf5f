//! Viettel Post adapter.

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

/// Viettel Post carrier adapter. Authenticates with a username/password
/// pair exchanged for a bearer token upstream; the sandbox accepts the
/// pair directly as headers.
#[derive(Debug)]
pub struct ViettelPostProvider {
    http: CarrierHttpClient,
    username: String,
    password: String,
    webhook_secret: String,
}

impl ViettelPostProvider {
    /// Build the adapter from decrypted credentials and endpoint settings.
    ///
    /// # Errors
    ///
    /// Returns `InitFailed` on a credential shape mismatch.
    pub fn new(creds: &ProviderCreds, endpoint: &CarrierEndpoint) -> Result<Self, ProviderError> {
        let ProviderCreds::ViettelPost { username, password } = creds else {
            return Err(ProviderError::InitFailed {
                code: ProviderCode::ViettelPost,
                message: "expected viettelpost credentials".to_string(),
            });
        };
        Ok(Self {
            http: CarrierHttpClient::new(endpoint.base_url.clone())?,
            username: username.clone(),
            password: password.clone(),
            webhook_secret: endpoint.webhook_secret.clone(),
        })
    }

    fn headers(&self) -> [(&str, &str); 2] {
        [
            ("X-Username", self.username.as_str()),
            ("X-Password", self.password.as_str()),
        ]
    }
}

#[derive(Debug, Deserialize)]
struct ViettelPostWebhookPayload {
    #[serde(rename = "ORDER_NUMBER")]
    order_number: String,
    #[serde(rename = "ORDER_STATUS")]
    order_status: Value,
    #[serde(rename = "STATUS_TIME", default)]
    status_time: Option<DateTime<Utc>>,
    #[serde(rename = "NOTE", default)]
    note: Option<String>,
    #[serde(rename = "MONEY_COLLECTION", default)]
    money_collection: Option<u64>,
}

fn status_token(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl ShippingProvider for ViettelPostProvider {
    fn code(&self) -> ProviderCode {
        ProviderCode::ViettelPost
    }

    async fn calculate_fee(&self, request: &FeeRequest) -> Result<FeeQuote, ProviderError> {
        let body = serde_json::json!({
            "SENDER_PROVINCE": request.pickup.city,
            "SENDER_DISTRICT": request.pickup.district,
            "RECEIVER_PROVINCE": request.delivery.city,
            "RECEIVER_DISTRICT": request.delivery.district,
            "PRODUCT_WEIGHT": request.package.weight_grams,
            "PRODUCT_PRICE": request.package.declared_value,
            "MONEY_COLLECTION": request.cod_amount,
        });
        let response = self
            .http
            .post("/order/getPrice", &self.headers(), &body)
            .await?;

        let fee = response["data"]["MONEY_TOTAL"]
            .as_u64()
            .ok_or_else(|| ProviderError::Parse("data.MONEY_TOTAL missing".to_string()))?;
        Ok(FeeQuote {
            provider: ProviderCode::ViettelPost,
            fee: Decimal::from(fee),
            estimated_days: response["data"]["KPI_HT"].as_u64().map(|d| d as u32),
            fallback: false,
        })
    }

    async fn create_order(
        &self,
        request: &CreateShipmentRequest,
    ) -> Result<CreateShipmentResponse, ProviderError> {
        let body = serde_json::json!({
            "ORDER_REFERENCE": request.reference,
            "SENDER_FULLNAME": request.pickup_contact.name,
            "SENDER_PHONE": request.pickup_contact.phone,
            "SENDER_ADDRESS": request.pickup_address.line,
            "SENDER_PROVINCE": request.pickup_address.city,
            "SENDER_DISTRICT": request.pickup_address.district,
            "RECEIVER_FULLNAME": request.delivery_contact.name,
            "RECEIVER_PHONE": request.delivery_contact.phone,
            "RECEIVER_ADDRESS": request.delivery_address.line,
            "RECEIVER_PROVINCE": request.delivery_address.city,
            "RECEIVER_DISTRICT": request.delivery_address.district,
            "PRODUCT_WEIGHT": request.package.weight_grams,
            "PRODUCT_PRICE": request.package.declared_value,
            "MONEY_COLLECTION": request.cod_amount,
        });
        let response = self
            .http
            .post("/order/createOrder", &self.headers(), &body)
            .await?;

        let order_number = response["data"]["ORDER_NUMBER"].as_str().unwrap_or_default();
        if order_number.is_empty() {
            return Err(ProviderError::MissingTracking {
                code: ProviderCode::ViettelPost,
            });
        }
        Ok(CreateShipmentResponse {
            provider_order_id: Some(ProviderOrderId::new(order_number)),
            tracking_number: TrackingNumber::new(order_number),
            fee: response["data"]["MONEY_TOTAL"].as_u64().map(Decimal::from),
        })
    }

    async fn cancel_order(&self, tracking_number: &TrackingNumber) -> Result<(), ProviderError> {
        self.http
            .post(
                "/order/UpdateOrder",
                &self.headers(),
                &serde_json::json!({
                    "TYPE": 4,
                    "ORDER_NUMBER": tracking_number,
                }),
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
            .get(
                &format!("/order/tracking?ORDER_NUMBER={tracking_number}"),
                &self.headers(),
            )
            .await?;

        let token = status_token(&response["data"]["ORDER_STATUS"]);
        Ok(TrackingInfo {
            tracking_number: tracking_number.clone(),
            status: status_map::normalize(ProviderCode::ViettelPost, &token),
            provider_status: token,
            updated_at: response["data"]["STATUS_TIME"]
                .as_str()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(Utc::now),
            message: response["data"]["NOTE"].as_str().map(str::to_string),
        })
    }

    fn validate_webhook(&self, payload: &[u8], signature: &str) -> Result<(), ProviderError> {
        webhook::verify(&self.webhook_secret, payload, signature)
    }

    fn parse_webhook(&self, payload: &[u8]) -> Result<WebhookEvent, ProviderError> {
        let parsed: ViettelPostWebhookPayload =
            serde_json::from_slice(payload).map_err(|e| ProviderError::Parse(e.to_string()))?;

        let token = status_token(&parsed.order_status);
        let mut extra = BTreeMap::new();
        if let Some(cod) = parsed.money_collection {
            extra.insert("money_collection".to_string(), serde_json::json!(cod));
        }

        Ok(WebhookEvent {
            provider: ProviderCode::ViettelPost,
            provider_order_id: ProviderOrderId::new(parsed.order_number.clone()),
            tracking_number: Some(TrackingNumber::new(parsed.order_number)),
            status: status_map::normalize(ProviderCode::ViettelPost, &token),
            provider_status: token,
            occurred_at: parsed.status_time.unwrap_or_else(Utc::now),
            message: parsed.note,
            extra,
        })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.http.get("/user/whoami", &self.headers()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shipment::UnifiedShippingStatus;

    fn provider() -> ViettelPostProvider {
        ViettelPostProvider::new(
            &ProviderCreds::ViettelPost {
                username: "shop@example.vn".to_string(),
                password: "secret".to_string(),
            },
            &CarrierEndpoint {
                base_url: "http://localhost:0".to_string(),
                webhook_secret: "whsec".to_string(),
                sandbox: true,
            },
        )
        .unwrap()
    }

    #[test]
    fn webhook_parses_numeric_status() {
        let p = provider();
        let payload = br#"{"ORDER_NUMBER":"VTP77","ORDER_STATUS":501,"MONEY_COLLECTION":350000}"#;
        let event = p.parse_webhook(payload).unwrap();
        assert_eq!(event.status, UnifiedShippingStatus::Delivered);
        assert_eq!(event.extra["money_collection"], 350_000);
    }

    #[test]
    fn rejects_wrong_credential_shape() {
        let err = ViettelPostProvider::new(
            &ProviderCreds::InHouse,
            &CarrierEndpoint {
                base_url: String::new(),
                webhook_secret: String::new(),
                sandbox: true,
            },
        )
        .unwrap_err();
        assert!(matches!(err, ProviderError::InitFailed { .. }));
    }
}
