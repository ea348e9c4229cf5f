//! The unified shipping gateway.
//!
//! Fans fee quotes out to every enabled carrier in parallel, caches fees
//! and tracking snapshots, enforces the non-empty-tracking contract on
//! order creation, validates webhooks before any state read, and degrades
//! to a stale cached snapshot when a carrier is down.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::application::ports::{CachePort, ProviderConfigRepository};
use crate::domain::shared::{Address, ShopId, TrackingNumber};
use crate::error::AppError;

use super::code::ProviderCode;
use super::credentials::{CredentialVault, ProviderCreds};
use super::registry::ProviderRegistry;
use super::retry::{RetryPolicy, with_retry};
use super::{
    CreateShipmentRequest, CreateShipmentResponse, FeeFailure, FeeQuote, FeeRequest,
    ProviderError, ShippingProvider, TrackingInfo, WebhookEvent,
};

/// Fee quotes cache for 5 minutes.
pub const FEE_CACHE_TTL: Duration = Duration::from_secs(300);
/// Tracking snapshots read through a 2-minute cache.
pub const TRACKING_CACHE_TTL: Duration = Duration::from_secs(120);
/// Last-known snapshots are kept a day for graceful degradation.
pub const STALE_SNAPSHOT_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Total wall-clock budget for one fee aggregation (3 attempts x max 2 s).
pub const FEE_AGGREGATION_BUDGET: Duration = Duration::from_secs(6);

/// Aggregated fee outcome: quotes sorted ascending, failures alongside.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeOutcome {
    /// Successful quotes, cheapest first.
    pub quotes: Vec<FeeQuote>,
    /// Providers that failed to quote. Never an error for the caller.
    pub failures: Vec<FeeFailure>,
}

/// A tracking read, possibly served stale from cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingSnapshot {
    /// The tracking state.
    #[serde(flatten)]
    pub info: TrackingInfo,
    /// Set when the provider failed and this is a cached snapshot.
    #[serde(default)]
    pub stale: bool,
    /// The provider error, attached when `stale`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The provider-agnostic gateway.
pub struct ShippingGateway {
    registry: ProviderRegistry,
    configs: Arc<dyn ProviderConfigRepository>,
    vault: CredentialVault,
    cache: Arc<dyn CachePort>,
    webhook_handlers: HashMap<ProviderCode, Arc<dyn ShippingProvider>>,
    retry: RetryPolicy,
    fee_ttl: Duration,
    tracking_ttl: Duration,
}

impl ShippingGateway {
    /// Wire the gateway.
    ///
    /// `webhook_handlers` are process-level provider instances used for
    /// webhook validation/parsing, where no shop is known yet.
    #[must_use]
    pub fn new(
        registry: ProviderRegistry,
        configs: Arc<dyn ProviderConfigRepository>,
        vault: CredentialVault,
        cache: Arc<dyn CachePort>,
        webhook_handlers: HashMap<ProviderCode, Arc<dyn ShippingProvider>>,
    ) -> Self {
        Self {
            registry,
            configs,
            vault,
            cache,
            webhook_handlers,
            retry: RetryPolicy::default(),
            fee_ttl: FEE_CACHE_TTL,
            tracking_ttl: TRACKING_CACHE_TTL,
        }
    }

    /// Override the retry policy (tests use tighter delays).
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override the cache TTLs (environment-configured deployments).
    #[must_use]
    pub const fn with_cache_ttls(mut self, fee_ttl: Duration, tracking_ttl: Duration) -> Self {
        self.fee_ttl = fee_ttl;
        self.tracking_ttl = tracking_ttl;
        self
    }

    /// Referentially transparent fee cache key. Distinguishes shop,
    /// provider, pickup city-district, delivery city-district, and weight.
    #[must_use]
    pub fn fee_cache_key(
        shop_id: &ShopId,
        code: ProviderCode,
        pickup: &Address,
        delivery: &Address,
        weight_grams: u32,
    ) -> String {
        format!(
            "fee:{shop_id}:{code}:{}:{}:{weight_grams}",
            pickup.city_district_key(),
            delivery.city_district_key(),
        )
    }

    fn tracking_cache_key(tracking_number: &TrackingNumber) -> String {
        format!("shipping:tracking:{tracking_number}")
    }

    fn stale_snapshot_key(tracking_number: &TrackingNumber) -> String {
        format!("shipping:tracking:last:{tracking_number}")
    }

    /// Build the shop-scoped provider for a code.
    ///
    /// # Errors
    ///
    /// `ProviderNotConfigured` when the shop has no enabled config (the
    /// in-house fleet needs none), `ProviderInitFailed` from constructors.
    pub async fn provider_for(
        &self,
        shop_id: &ShopId,
        code: ProviderCode,
    ) -> Result<Arc<dyn ShippingProvider>, AppError> {
        let creds = match self.configs.find(shop_id, code).await? {
            Some(config) if config.is_enabled => self
                .vault
                .decrypt(code, &config.encrypted_credentials)
                .map_err(AppError::from)?,
            Some(_) | None if code.is_in_house() => ProviderCreds::InHouse,
            Some(_) | None => {
                return Err(ProviderError::NotConfigured { code }.into());
            }
        };
        self.registry.build(code, &creds).map_err(AppError::from)
    }

    /// Ask every enabled provider for a fee, in parallel, with per-provider
    /// retry and the aggregation budget. Failures are collected, never
    /// thrown. When no provider quotes, the in-house fleet is called as an
    /// explicit fallback and its quote is tagged `fallback`.
    pub async fn calculate_fees(
        &self,
        request: &FeeRequest,
        cancel: &CancellationToken,
    ) -> Result<FeeOutcome, AppError> {
        let configs = self.configs.list_enabled(&request.shop_id).await?;

        let tasks = configs.iter().map(|config| {
            let code = config.provider_code;
            async move {
                let result = tokio::time::timeout(
                    FEE_AGGREGATION_BUDGET,
                    self.quote_one(code, request, cancel),
                )
                .await
                .unwrap_or_else(|_| {
                    Err(ProviderError::Network(
                        "fee aggregation budget exceeded".to_string(),
                    ))
                });
                (code, result)
            }
        });

        let mut quotes = Vec::new();
        let mut failures = Vec::new();
        for (code, result) in join_all(tasks).await {
            match result {
                Ok(quote) => quotes.push(quote),
                Err(err) => failures.push(FeeFailure {
                    provider: code,
                    error: err.to_string(),
                }),
            }
        }

        if quotes.is_empty() {
            match self.quote_one(ProviderCode::InHouse, request, cancel).await {
                Ok(mut quote) => {
                    quote.fallback = true;
                    quotes.push(quote);
                }
                Err(err) => failures.push(FeeFailure {
                    provider: ProviderCode::InHouse,
                    error: err.to_string(),
                }),
            }
        }

        quotes.sort_by(|a, b| a.fee.cmp(&b.fee));
        Ok(FeeOutcome { quotes, failures })
    }

    /// One provider's fee, through the cache.
    async fn quote_one(
        &self,
        code: ProviderCode,
        request: &FeeRequest,
        cancel: &CancellationToken,
    ) -> Result<FeeQuote, ProviderError> {
        let key = Self::fee_cache_key(
            &request.shop_id,
            code,
            &request.pickup,
            &request.delivery,
            request.package.weight_grams,
        );
        if let Ok(Some(cached)) = self.cache.get(&key).await {
            if let Ok(quote) = serde_json::from_value::<FeeQuote>(cached) {
                return Ok(quote);
            }
        }

        let provider = self
            .provider_for(&request.shop_id, code)
            .await
            .map_err(|e| ProviderError::InitFailed {
                code,
                message: e.to_string(),
            })?;
        let quote = with_retry(code, "calculate_fee", self.retry, cancel, |_attempt| {
            let provider = Arc::clone(&provider);
            async move { provider.calculate_fee(request).await }
        })
        .await?;

        if let Ok(value) = serde_json::to_value(&quote) {
            let _ = self.cache.set(&key, value, self.fee_ttl).await;
        }
        Ok(quote)
    }

    /// Create a shipping order. The returned tracking number is never
    /// empty; a provider violating that contract fails with
    /// `MissingTracking`.
    pub async fn create_order(
        &self,
        code: ProviderCode,
        request: &CreateShipmentRequest,
        cancel: &CancellationToken,
    ) -> Result<CreateShipmentResponse, AppError> {
        let provider = self.provider_for(&request.shop_id, code).await?;
        let response = with_retry(code, "create_order", self.retry, cancel, |_attempt| {
            let provider = Arc::clone(&provider);
            async move { provider.create_order(request).await }
        })
        .await
        .map_err(AppError::from)?;

        if response.tracking_number.as_str().trim().is_empty() {
            return Err(ProviderError::MissingTracking { code }.into());
        }
        Ok(response)
    }

    /// Cancel a shipping order at the carrier.
    pub async fn cancel_order(
        &self,
        shop_id: &ShopId,
        code: ProviderCode,
        tracking_number: &TrackingNumber,
        cancel: &CancellationToken,
    ) -> Result<(), AppError> {
        let provider = self.provider_for(shop_id, code).await?;
        with_retry(code, "cancel_order", self.retry, cancel, |_attempt| {
            let provider = Arc::clone(&provider);
            async move { provider.cancel_order(tracking_number).await }
        })
        .await
        .map_err(AppError::from)
    }

    /// Tracking read-through.
    ///
    /// Serves the 2-minute cache when fresh; fetches otherwise. Terminal
    /// statuses are not written back to the read-through cache, so a later
    /// glitch cannot overwrite the terminal observation. On provider
    /// failure the last-known snapshot is returned with `stale: true` and
    /// the error attached; with no snapshot the error propagates.
    pub async fn get_tracking(
        &self,
        shop_id: &ShopId,
        code: ProviderCode,
        tracking_number: &TrackingNumber,
        cancel: &CancellationToken,
    ) -> Result<TrackingSnapshot, AppError> {
        let fresh_key = Self::tracking_cache_key(tracking_number);
        if let Some(cached) = self.cache.get(&fresh_key).await? {
            if let Ok(info) = serde_json::from_value::<TrackingInfo>(cached) {
                return Ok(TrackingSnapshot {
                    info,
                    stale: false,
                    error: None,
                });
            }
        }

        let provider = self.provider_for(shop_id, code).await?;
        let fetched = with_retry(code, "get_tracking", self.retry, cancel, |_attempt| {
            let provider = Arc::clone(&provider);
            async move { provider.get_tracking(tracking_number).await }
        })
        .await;

        match fetched {
            Ok(info) => {
                if let Ok(value) = serde_json::to_value(&info) {
                    if !info.status.is_terminal() {
                        let _ = self
                            .cache
                            .set(&fresh_key, value.clone(), self.tracking_ttl)
                            .await;
                    }
                    let _ = self
                        .cache
                        .set(
                            &Self::stale_snapshot_key(tracking_number),
                            value,
                            STALE_SNAPSHOT_TTL,
                        )
                        .await;
                }
                Ok(TrackingSnapshot {
                    info,
                    stale: false,
                    error: None,
                })
            }
            Err(err) => {
                let last = self
                    .cache
                    .get(&Self::stale_snapshot_key(tracking_number))
                    .await?;
                if let Some(cached) = last {
                    if let Ok(info) = serde_json::from_value::<TrackingInfo>(cached) {
                        tracing::warn!(
                            tracking_number = %tracking_number,
                            error = %err,
                            "provider down, serving stale tracking snapshot"
                        );
                        return Ok(TrackingSnapshot {
                            info,
                            stale: true,
                            error: Some(err.to_string()),
                        });
                    }
                }
                Err(err.into())
            }
        }
    }

    /// Drop the read-through entry so the next read reflects
    /// webhook-asserted truth.
    pub async fn invalidate_tracking(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<(), AppError> {
        self.cache
            .del(&Self::tracking_cache_key(tracking_number))
            .await
    }

    /// Validate and parse a webhook. Signature verification runs before
    /// any state is read; the tracking cache is invalidated on success.
    pub async fn process_webhook(
        &self,
        raw_code: &str,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, AppError> {
        let code = ProviderRegistry::parse_code(raw_code)?;
        let handler = self
            .webhook_handlers
            .get(&code)
            .ok_or(ProviderError::InvalidProvider {
                code: code.as_str().to_string(),
            })?;

        handler.validate_webhook(payload, signature)?;
        let event = handler.parse_webhook(payload)?;

        if let Some(tracking_number) = &event.tracking_number {
            self.invalidate_tracking(tracking_number).await?;
        }
        Ok(event)
    }

    /// Connectivity check for the partner provider-settings screen.
    pub async fn test_connection(
        &self,
        shop_id: &ShopId,
        code: ProviderCode,
    ) -> Result<(), AppError> {
        let provider = self.provider_for(shop_id, code).await?;
        provider.test_connection().await.map_err(AppError::from)
    }
}
