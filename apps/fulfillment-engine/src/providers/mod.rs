//! Shipping Provider Facade
//!
//! A provider-agnostic surface over heterogeneous carriers plus the
//! in-house fleet. Concrete providers implement [`ShippingProvider`]; the
//! registry maps codes to constructors; the gateway aggregates fees,
//! caches tracking, validates webhooks, and degrades gracefully to stale
//! cache when a carrier is down.

pub mod code;
pub mod credentials;
pub mod facade;
pub mod ghn;
pub mod ghtk;
pub mod http;
pub mod in_house;
pub mod registry;
pub mod retry;
pub mod status_map;
pub mod viettel_post;
pub mod webhook;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::shared::{Address, Contact, Money, ProviderOrderId, ShopId, TrackingNumber};
use crate::domain::shipment::{PackageInfo, UnifiedShippingStatus};
use crate::error::{AppError, ErrorKind};

pub use code::ProviderCode;
pub use credentials::{CredentialVault, ProviderCreds};
pub use facade::{FeeOutcome, ShippingGateway, TrackingSnapshot};
pub use registry::ProviderRegistry;
pub use retry::RetryPolicy;

/// Connection settings of one external carrier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierEndpoint {
    /// API base URL (sandbox or production).
    pub base_url: String,
    /// Shared secret for webhook signatures.
    pub webhook_secret: String,
    /// Whether this endpoint is the carrier's sandbox.
    #[serde(default)]
    pub sandbox: bool,
}

/// A fee quote request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeRequest {
    /// Shop whose provider configs apply.
    pub shop_id: ShopId,
    /// Pickup address.
    pub pickup: Address,
    /// Delivery address.
    pub delivery: Address,
    /// Parcel weight and value.
    pub package: PackageInfo,
    /// Cash to collect on delivery.
    pub cod_amount: Money,
}

/// One provider's fee quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeQuote {
    /// Quoting carrier.
    pub provider: ProviderCode,
    /// The fee in VND.
    pub fee: Decimal,
    /// Estimated delivery time in days, when the carrier reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_days: Option<u32>,
    /// Set when this quote came from the in-house fallback because no
    /// configured carrier produced a fee.
    #[serde(default)]
    pub fallback: bool,
}

/// A provider that failed to quote, returned alongside successes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeFailure {
    /// Failing carrier.
    pub provider: ProviderCode,
    /// What went wrong.
    pub error: String,
}

/// Request to create a shipping order at a carrier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShipmentRequest {
    /// Shop whose provider configs apply.
    pub shop_id: ShopId,
    /// Our internal reference (sub-order id).
    pub reference: String,
    /// Pickup address.
    pub pickup_address: Address,
    /// Pickup contact.
    pub pickup_contact: Contact,
    /// Delivery address.
    pub delivery_address: Address,
    /// Delivery contact.
    pub delivery_contact: Contact,
    /// Parcel weight and value.
    pub package: PackageInfo,
    /// Cash to collect on delivery.
    pub cod_amount: Money,
}

/// Result of creating a shipping order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShipmentResponse {
    /// Carrier-side order id, when the carrier assigns one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_order_id: Option<ProviderOrderId>,
    /// Tracking number. Never empty; the gateway enforces this.
    pub tracking_number: TrackingNumber,
    /// Fee charged, when reported at creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<Decimal>,
}

/// Normalized tracking information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingInfo {
    /// Tracking number.
    pub tracking_number: TrackingNumber,
    /// Unified status.
    pub status: UnifiedShippingStatus,
    /// Raw provider token the status came from.
    pub provider_status: String,
    /// When the carrier last updated.
    pub updated_at: DateTime<Utc>,
    /// Carrier-reported note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A webhook payload after validation and normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Sending carrier.
    pub provider: ProviderCode,
    /// Carrier-side order id.
    pub provider_order_id: ProviderOrderId,
    /// Tracking number, when the carrier includes it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<TrackingNumber>,
    /// Raw status token.
    pub provider_status: String,
    /// Normalized status.
    pub status: UnifiedShippingStatus,
    /// Carrier-asserted event time.
    pub occurred_at: DateTime<Utc>,
    /// Carrier-reported note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Fields with no unified slot.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

/// Errors raised by providers and the facade.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Unknown provider code.
    #[error("unknown provider code: {code}")]
    InvalidProvider {
        /// The offending code.
        code: String,
    },

    /// Provider known but not configured (or disabled) for the shop.
    #[error("provider {code} is not configured for this shop")]
    NotConfigured {
        /// The carrier.
        code: ProviderCode,
    },

    /// Constructor failed (bad credentials shape, client build failure).
    #[error("provider {code} failed to initialize: {message}")]
    InitFailed {
        /// The carrier.
        code: ProviderCode,
        /// What went wrong.
        message: String,
    },

    /// Webhook signature did not verify.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// Carrier returned success with no tracking number.
    #[error("provider {code} returned an empty tracking number")]
    MissingTracking {
        /// The carrier.
        code: ProviderCode,
    },

    /// Carrier API returned an error status.
    #[error("provider api error ({status}): {message}")]
    Api {
        /// HTTP status.
        status: u16,
        /// Carrier message.
        message: String,
    },

    /// Transport-level failure (timeout, DNS, connection reset).
    #[error("provider network error: {0}")]
    Network(String),

    /// Response body did not parse.
    #[error("provider response parse error: {0}")]
    Parse(String),

    /// Carrier rate-limited us.
    #[error("provider rate limited")]
    RateLimited,

    /// Caller cancelled the request.
    #[error("provider call cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Whether the retry driver may try again.
    ///
    /// Only transient failures retry: network errors, 5xx, and carrier
    /// rate limiting. Signature, validation, and 4xx errors terminate
    /// immediately.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::RateLimited => true,
            Self::Api { status, .. } => *status >= 500,
            Self::InvalidProvider { .. }
            | Self::NotConfigured { .. }
            | Self::InitFailed { .. }
            | Self::InvalidSignature
            | Self::MissingTracking { .. }
            | Self::Parse(_)
            | Self::Cancelled => false,
        }
    }

    /// The surfaced error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidProvider { .. } => ErrorKind::InvalidProvider,
            Self::NotConfigured { .. } => ErrorKind::ProviderNotConfigured,
            Self::InvalidSignature => ErrorKind::InvalidSignature,
            Self::MissingTracking { .. } => ErrorKind::MissingTracking,
            Self::RateLimited => ErrorKind::RateLimited,
            Self::InitFailed { .. }
            | Self::Api { .. }
            | Self::Network(_)
            | Self::Parse(_)
            | Self::Cancelled => ErrorKind::ProviderError,
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

/// The provider-agnostic capability contract.
///
/// Concrete carriers and the in-house adapter are polymorphic over this
/// set; the facade never knows which one it is talking to.
#[async_trait]
pub trait ShippingProvider: Send + Sync {
    /// This provider's code.
    fn code(&self) -> ProviderCode;

    /// Quote a shipping fee.
    async fn calculate_fee(&self, request: &FeeRequest) -> Result<FeeQuote, ProviderError>;

    /// Create a shipping order. Must return a non-empty tracking number.
    async fn create_order(
        &self,
        request: &CreateShipmentRequest,
    ) -> Result<CreateShipmentResponse, ProviderError>;

    /// Cancel a shipping order.
    async fn cancel_order(&self, tracking_number: &TrackingNumber) -> Result<(), ProviderError>;

    /// Fetch current tracking state.
    async fn get_tracking(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<TrackingInfo, ProviderError>;

    /// Verify a webhook signature. Must run before any state read.
    fn validate_webhook(&self, payload: &[u8], signature: &str) -> Result<(), ProviderError>;

    /// Parse and normalize a validated webhook payload.
    fn parse_webhook(&self, payload: &[u8]) -> Result<WebhookEvent, ProviderError>;

    /// Cheap connectivity / credential check for the settings screen.
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

impl std::fmt::Debug for dyn ShippingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("dyn ShippingProvider")
            .field("code", &self.code())
            .finish()
    }
}
