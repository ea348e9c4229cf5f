//! Shared wiring for the end-to-end suites.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use fulfillment_engine::application::ports::{
    CachePort, EventBusPort, InMemoryShopDirectory, InventoryPort, OrderRepository,
    PostOfficeRepository, ProviderConfig, ProviderConfigRepository, RefundPort,
    ShipmentRepository, ShipperRepository, ShopDirectoryPort, ShopProfile,
};
use fulfillment_engine::application::use_cases::{
    CancelOrderUseCase, CheckoutInput, CheckoutItemInput, CheckoutShopInput, CheckoutUseCase,
    ConfirmReceiptUseCase, PartnerFulfillmentUseCase, ProcessWebhookUseCase,
    ShipperActionsUseCase, TrackShipmentUseCase,
};
use fulfillment_engine::dispatch::ShipperDispatcher;
use fulfillment_engine::domain::dispatch::{
    OfficeType, PostOffice, Shipper, ShipperStatus, VehicleType,
};
use fulfillment_engine::domain::order::{PaymentMethod, ShippingSnapshot};
use fulfillment_engine::domain::shared::{
    Actor, Address, Contact, GeoPoint, Money, PostOfficeId, Region, Role, ShipperId, ShopId,
    UserId, VariantId,
};
use fulfillment_engine::infrastructure::bus::InMemoryEventBus;
use fulfillment_engine::infrastructure::cache::InMemoryCache;
use fulfillment_engine::infrastructure::persistence::{
    InMemoryCatalog, InMemoryInventory, InMemoryOrderRepository, InMemoryPostOfficeRepository,
    InMemoryProviderConfigRepository, InMemoryShipmentRepository, InMemoryShipperRepository,
    RecordingRefundPort,
};
use fulfillment_engine::providers::ghtk::GhtkProvider;
use fulfillment_engine::providers::in_house::InHouseProvider;
use fulfillment_engine::providers::{
    CarrierEndpoint, CredentialVault, ProviderCode, ProviderCreds, ProviderRegistry, RetryPolicy,
    ShippingGateway, ShippingProvider,
};
use fulfillment_engine::realtime::{LocationPipeline, PushHub};

/// Webhook secret used by the test carrier endpoints.
pub const WEBHOOK_SECRET: &str = "whsec-test";

/// Fully wired engine over in-memory adapters.
pub struct TestWorld {
    pub orders: Arc<InMemoryOrderRepository>,
    pub shipments: Arc<InMemoryShipmentRepository>,
    pub shippers: Arc<InMemoryShipperRepository>,
    pub offices: Arc<InMemoryPostOfficeRepository>,
    pub provider_configs: Arc<InMemoryProviderConfigRepository>,
    pub inventory: Arc<InMemoryInventory>,
    pub refunds: Arc<RecordingRefundPort>,
    pub catalog: Arc<InMemoryCatalog>,
    pub shops: Arc<InMemoryShopDirectory>,
    pub cache: Arc<InMemoryCache>,
    pub bus: Arc<InMemoryEventBus>,
    pub hub: Arc<PushHub>,
    pub vault: CredentialVault,
    pub gateway: Arc<ShippingGateway>,
    pub dispatcher: Arc<ShipperDispatcher>,
    pub locations: Arc<LocationPipeline>,
    pub checkout: CheckoutUseCase,
    pub partner: PartnerFulfillmentUseCase,
    pub shipper_actions: ShipperActionsUseCase,
    pub cancel_order: CancelOrderUseCase,
    pub confirm_receipt: ConfirmReceiptUseCase,
    pub webhook: ProcessWebhookUseCase,
    pub tracking: TrackShipmentUseCase,
}

impl TestWorld {
    /// Wire everything; `ghtk_base_url` points the GHTK adapter at a mock
    /// server when given.
    #[must_use]
    pub fn new(ghtk_base_url: Option<String>) -> Self {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let shipments = Arc::new(InMemoryShipmentRepository::new());
        let shippers = Arc::new(InMemoryShipperRepository::new());
        let offices = Arc::new(InMemoryPostOfficeRepository::new());
        let provider_configs = Arc::new(InMemoryProviderConfigRepository::new());
        let inventory = Arc::new(InMemoryInventory::new());
        let refunds = Arc::new(RecordingRefundPort::new());
        let catalog = Arc::new(InMemoryCatalog::new());
        let shops = Arc::new(InMemoryShopDirectory::new());
        let cache = Arc::new(InMemoryCache::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let hub = Arc::new(PushHub::new());
        let vault = CredentialVault::new("e2e-vault-secret");

        let ghtk_endpoint = CarrierEndpoint {
            base_url: ghtk_base_url.unwrap_or_else(|| "http://localhost:0".to_string()),
            webhook_secret: WEBHOOK_SECRET.to_string(),
            sandbox: true,
        };

        let mut registry = ProviderRegistry::new();
        {
            let endpoint = ghtk_endpoint.clone();
            registry.register(ProviderCode::Ghtk, move |creds| {
                Ok(Arc::new(GhtkProvider::new(creds, &endpoint)?) as Arc<dyn ShippingProvider>)
            });
        }
        {
            let shipments = Arc::clone(&shipments) as Arc<dyn ShipmentRepository>;
            registry.register(ProviderCode::InHouse, move |_creds| {
                Ok(Arc::new(InHouseProvider::new(Arc::clone(&shipments)))
                    as Arc<dyn ShippingProvider>)
            });
        }

        let mut webhook_handlers: HashMap<ProviderCode, Arc<dyn ShippingProvider>> =
            HashMap::new();
        webhook_handlers.insert(
            ProviderCode::Ghtk,
            Arc::new(
                GhtkProvider::new(
                    &ProviderCreds::Ghtk {
                        api_token: "system-token".to_string(),
                    },
                    &ghtk_endpoint,
                )
                .expect("ghtk system provider"),
            ),
        );

        let gateway = Arc::new(
            ShippingGateway::new(
                registry,
                Arc::clone(&provider_configs) as Arc<dyn ProviderConfigRepository>,
                vault.clone(),
                Arc::clone(&cache) as Arc<dyn CachePort>,
                webhook_handlers,
            )
            .with_retry_policy(RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
                multiplier: 2,
            }),
        );

        let dispatcher = Arc::new(ShipperDispatcher::new(
            Arc::clone(&offices) as Arc<dyn PostOfficeRepository>,
            Arc::clone(&shippers) as Arc<dyn ShipperRepository>,
            Arc::clone(&shipments) as Arc<dyn ShipmentRepository>,
            Arc::clone(&bus) as Arc<dyn EventBusPort>,
        ));
        let locations = Arc::new(LocationPipeline::new(
            Arc::clone(&cache) as Arc<dyn CachePort>,
            Arc::clone(&hub),
        ));

        let checkout = CheckoutUseCase::new(
            Arc::clone(&orders) as Arc<dyn OrderRepository>,
            Arc::clone(&inventory) as Arc<dyn InventoryPort>,
            Arc::clone(&bus) as Arc<dyn EventBusPort>,
        );
        let partner = PartnerFulfillmentUseCase::new(
            Arc::clone(&orders) as Arc<dyn OrderRepository>,
            Arc::clone(&shipments) as Arc<dyn ShipmentRepository>,
            Arc::clone(&shops) as Arc<dyn ShopDirectoryPort>,
            Arc::clone(&provider_configs) as Arc<dyn ProviderConfigRepository>,
            Arc::clone(&inventory) as Arc<dyn InventoryPort>,
            Arc::clone(&gateway),
            Arc::clone(&dispatcher),
            Arc::clone(&bus) as Arc<dyn EventBusPort>,
        );
        let shipper_actions = ShipperActionsUseCase::new(
            Arc::clone(&orders) as Arc<dyn OrderRepository>,
            Arc::clone(&shipments) as Arc<dyn ShipmentRepository>,
            Arc::clone(&shippers) as Arc<dyn ShipperRepository>,
            Arc::clone(&bus) as Arc<dyn EventBusPort>,
            Arc::clone(&hub),
        );
        let cancel_order = CancelOrderUseCase::new(
            Arc::clone(&orders) as Arc<dyn OrderRepository>,
            Arc::clone(&inventory) as Arc<dyn InventoryPort>,
            Arc::clone(&refunds) as Arc<dyn RefundPort>,
            Arc::clone(&bus) as Arc<dyn EventBusPort>,
        );
        let confirm_receipt = ConfirmReceiptUseCase::new(
            Arc::clone(&orders) as Arc<dyn OrderRepository>,
            Arc::clone(&bus) as Arc<dyn EventBusPort>,
        );
        let webhook = ProcessWebhookUseCase::new(
            Arc::clone(&gateway),
            Arc::clone(&shipments) as Arc<dyn ShipmentRepository>,
            Arc::clone(&orders) as Arc<dyn OrderRepository>,
            Arc::clone(&cache) as Arc<dyn CachePort>,
            Arc::clone(&bus) as Arc<dyn EventBusPort>,
            Arc::clone(&hub),
        );
        let tracking = TrackShipmentUseCase::new(
            Arc::clone(&shipments) as Arc<dyn ShipmentRepository>,
            Arc::clone(&orders) as Arc<dyn OrderRepository>,
            Arc::clone(&gateway),
        );

        Self {
            orders,
            shipments,
            shippers,
            offices,
            provider_configs,
            inventory,
            refunds,
            catalog,
            shops,
            cache,
            bus,
            hub,
            vault,
            gateway,
            dispatcher,
            locations,
            checkout,
            partner,
            shipper_actions,
            cancel_order,
            confirm_receipt,
            webhook,
            tracking,
        }
    }

    /// Seed a local office in Hồ Chí Minh City.
    pub fn seed_hcm_office(&self, id: &str) {
        self.offices.seed(PostOffice {
            id: PostOfficeId::new(id),
            code: id.to_uppercase(),
            office_type: OfficeType::Local,
            city: "Hồ Chí Minh".to_string(),
            district: "Quận 1".to_string(),
            region: Region::South,
            location: GeoPoint::new(10.7769, 106.7009),
            parent_id: None,
        });
    }

    /// Seed an active, online, available shipper at an office.
    pub fn seed_shipper(&self, id: &str, office: &str) {
        self.shippers.seed(Shipper {
            id: ShipperId::new(id),
            user_id: UserId::new(format!("u-{id}")),
            post_office_id: PostOfficeId::new(office),
            vehicle: VehicleType::Motorbike,
            status: ShipperStatus::Active,
            is_online: true,
            is_available: true,
            location: None,
            current_pickup_count: 0,
            current_delivery_count: 0,
            max_daily_orders: 10,
            rating: 4.8,
            total_delivered: 0,
            last_heartbeat_at: Some(Utc::now()),
        });
    }

    /// Seed a shop shipping out of Hồ Chí Minh City.
    pub fn seed_shop(&self, shop_id: &str) {
        self.shops.seed(ShopProfile {
            id: ShopId::new(shop_id),
            partner_user_id: UserId::new(format!("partner-{shop_id}")),
            name: format!("Shop {shop_id}"),
            pickup_address: hcm_address(),
            pickup_contact: Contact {
                name: format!("Shop {shop_id}"),
                phone: "0900000000".to_string(),
            },
        });
    }

    /// Enable GHTK for a shop with vault-encrypted credentials.
    pub async fn enable_ghtk(&self, shop_id: &str, is_default: bool) {
        let blob = self
            .vault
            .encrypt(&ProviderCreds::Ghtk {
                api_token: "shop-token".to_string(),
            })
            .expect("encrypt ghtk creds");
        self.provider_configs
            .save(&ProviderConfig {
                shop_id: ShopId::new(shop_id),
                provider_code: ProviderCode::Ghtk,
                encrypted_credentials: blob,
                is_enabled: true,
                is_default,
            })
            .await
            .expect("save ghtk config");
    }

    /// Partner actor for a seeded shop.
    #[must_use]
    pub fn partner_actor(&self, shop_id: &str) -> Actor {
        Actor::new(
            UserId::new(format!("partner-{shop_id}")),
            Role::Partner,
            Some(ShopId::new(shop_id)),
        )
    }

    /// Shipper actor for a seeded shipper.
    #[must_use]
    pub fn shipper_actor(&self, shipper_id: &str) -> Actor {
        Actor::new(UserId::new(format!("u-{shipper_id}")), Role::Shipper, None)
    }
}

/// The default customer actor.
#[must_use]
pub fn customer() -> Actor {
    Actor::new(UserId::new("khach-1"), Role::Customer, None)
}

/// A Hồ Chí Minh City address.
#[must_use]
pub fn hcm_address() -> Address {
    Address {
        line: "12 Lê Lợi".to_string(),
        ward: None,
        district: "Quận 1".to_string(),
        city: "Hồ Chí Minh".to_string(),
        region: Some(Region::South),
        location: Some(GeoPoint::new(10.7731, 106.7030)),
    }
}

/// A single-shop COD checkout input.
#[must_use]
pub fn cod_checkout(shop_id: &str, variant: &str, total_vnd: u64) -> CheckoutInput {
    CheckoutInput {
        payment_method: PaymentMethod::Cod,
        shipping: ShippingSnapshot {
            name: "Nguyễn Văn Khách".to_string(),
            phone: "0911111111".to_string(),
            address: hcm_address(),
        },
        shops: vec![shop_cart(shop_id, variant, total_vnd)],
        discount_total: Money::ZERO,
    }
}

/// One shop's cart slice worth `total_vnd`.
#[must_use]
pub fn shop_cart(shop_id: &str, variant: &str, total_vnd: u64) -> CheckoutShopInput {
    CheckoutShopInput {
        shop_id: ShopId::new(shop_id),
        items: vec![CheckoutItemInput {
            variant_id: VariantId::new(variant),
            product_name: "Áo thun Chomart".to_string(),
            sku: format!("SKU-{variant}"),
            unit_price: Money::from_vnd(total_vnd),
            quantity: 1,
            weight_grams: 400,
            image_url: None,
        }],
        shipping_fee: Money::ZERO,
    }
}
