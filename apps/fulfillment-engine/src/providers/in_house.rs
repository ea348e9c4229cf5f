//! The in-house carrier adapter.
//!
//! Implements the same capability contract as the external carriers so the
//! facade can treat the fleet as just another provider. Fees come from a
//! zone table instead of an API; tracking truth lives in the shipment
//! store; status changes arrive from shipper actions, never webhooks.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::application::ports::ShipmentRepository;
use crate::domain::shared::{Region, TrackingNumber};

use super::code::ProviderCode;
use super::{
    CreateShipmentRequest, CreateShipmentResponse, FeeQuote, FeeRequest, ProviderError,
    ShippingProvider, TrackingInfo, WebhookEvent,
};

/// Base fee for a same-region parcel up to [`FREE_WEIGHT_GRAMS`].
const BASE_FEE: u64 = 15_000;
/// Surcharge per started 500 g above the free weight.
const WEIGHT_STEP_FEE: u64 = 2_000;
/// Weight included in the base fee.
const FREE_WEIGHT_GRAMS: u32 = 500;
/// Surcharge for crossing into an adjacent region.
const ADJACENT_REGION_FEE: u64 = 10_000;
/// Surcharge for the north-south line.
const FAR_REGION_FEE: u64 = 20_000;

/// In-house fleet adapter.
pub struct InHouseProvider {
    shipments: Arc<dyn ShipmentRepository>,
}

impl InHouseProvider {
    /// Build the adapter over the shipment store.
    #[must_use]
    pub fn new(shipments: Arc<dyn ShipmentRepository>) -> Self {
        Self { shipments }
    }

    /// Zone + weight fee table.
    #[must_use]
    pub fn quote(pickup: Option<Region>, delivery: Option<Region>, weight_grams: u32) -> u64 {
        let mut fee = BASE_FEE;

        if weight_grams > FREE_WEIGHT_GRAMS {
            let over = weight_grams - FREE_WEIGHT_GRAMS;
            fee += u64::from(over.div_ceil(500)) * WEIGHT_STEP_FEE;
        }

        fee += match (pickup, delivery) {
            (Some(a), Some(b)) if a == b => 0,
            (Some(Region::North), Some(Region::South))
            | (Some(Region::South), Some(Region::North)) => FAR_REGION_FEE,
            (Some(_), Some(_)) => ADJACENT_REGION_FEE,
            // Unknown region quotes the base zone.
            _ => 0,
        };
        fee
    }

    /// Mint a fleet tracking number.
    #[must_use]
    pub fn mint_tracking_number() -> TrackingNumber {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        TrackingNumber::new(format!("CHM{}", &suffix[..12].to_uppercase()))
    }
}

#[async_trait]
impl ShippingProvider for InHouseProvider {
    fn code(&self) -> ProviderCode {
        ProviderCode::InHouse
    }

    async fn calculate_fee(&self, request: &FeeRequest) -> Result<FeeQuote, ProviderError> {
        let fee = Self::quote(
            request.pickup.region,
            request.delivery.region,
            request.package.weight_grams,
        );
        let cross_region = request.pickup.region.is_some()
            && request.delivery.region.is_some()
            && request.pickup.region != request.delivery.region;
        Ok(FeeQuote {
            provider: ProviderCode::InHouse,
            fee: Decimal::from(fee),
            estimated_days: Some(if cross_region { 3 } else { 1 }),
            fallback: false,
        })
    }

    async fn create_order(
        &self,
        _request: &CreateShipmentRequest,
    ) -> Result<CreateShipmentResponse, ProviderError> {
        Ok(CreateShipmentResponse {
            provider_order_id: None,
            tracking_number: Self::mint_tracking_number(),
            fee: None,
        })
    }

    async fn cancel_order(&self, _tracking_number: &TrackingNumber) -> Result<(), ProviderError> {
        // The shipment lifecycle records the cancellation; the fleet has no
        // remote order to revoke.
        Ok(())
    }

    async fn get_tracking(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<TrackingInfo, ProviderError> {
        let shipment = self
            .shipments
            .find_by_tracking_number(tracking_number)
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?
            .ok_or_else(|| ProviderError::Api {
                status: 404,
                message: format!("unknown tracking number {tracking_number}"),
            })?;

        let last = shipment.history.last();
        Ok(TrackingInfo {
            tracking_number: tracking_number.clone(),
            status: shipment.status,
            provider_status: shipment.status.as_str().to_string(),
            updated_at: shipment.updated_at,
            message: last.and_then(|entry| entry.message.clone()),
        })
    }

    fn validate_webhook(&self, _payload: &[u8], _signature: &str) -> Result<(), ProviderError> {
        // The fleet reports through shipper actions, not webhooks.
        Err(ProviderError::InvalidSignature)
    }

    fn parse_webhook(&self, _payload: &[u8]) -> Result<WebhookEvent, ProviderError> {
        Err(ProviderError::Parse(
            "the in-house carrier has no webhooks".to_string(),
        ))
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_fee_covers_light_same_region() {
        assert_eq!(
            InHouseProvider::quote(Some(Region::South), Some(Region::South), 400),
            15_000
        );
    }

    #[test]
    fn weight_surcharge_steps() {
        assert_eq!(
            InHouseProvider::quote(Some(Region::South), Some(Region::South), 501),
            17_000
        );
        assert_eq!(
            InHouseProvider::quote(Some(Region::South), Some(Region::South), 1_500),
            19_000
        );
    }

    #[test]
    fn cross_region_surcharges() {
        assert_eq!(
            InHouseProvider::quote(Some(Region::North), Some(Region::Central), 400),
            25_000
        );
        assert_eq!(
            InHouseProvider::quote(Some(Region::North), Some(Region::South), 400),
            35_000
        );
    }

    #[test]
    fn unknown_region_quotes_base_zone() {
        assert_eq!(InHouseProvider::quote(None, Some(Region::South), 400), 15_000);
    }

    #[test]
    fn minted_tracking_numbers_are_unique_and_prefixed() {
        let a = InHouseProvider::mint_tracking_number();
        let b = InHouseProvider::mint_tracking_number();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("CHM"));
    }
}
