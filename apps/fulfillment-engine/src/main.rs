//! Fulfillment engine entry point.
//!
//! Wires the in-memory adapters behind the ports, registers the carrier
//! constructors, and runs the HTTP surface plus the background jobs
//! (daily counter reset, event reconciliation) until shutdown.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use fulfillment_engine::application::ports::{
    CachePort, CatalogPort, EventBusPort, InMemoryShopDirectory, InventoryPort, OrderRepository,
    PostOfficeRepository, ProviderConfigRepository, RefundPort, ShipmentRepository,
    ShipperRepository, ShopDirectoryPort,
};
use fulfillment_engine::application::use_cases::{
    CachedProductReader, CancelOrderUseCase, CheckoutUseCase, ConfirmReceiptUseCase,
    PartnerFulfillmentUseCase, PaymentEventHandler, ProcessWebhookUseCase, ReturnFlowUseCase,
    ShipperActionsUseCase, TrackShipmentUseCase,
};
use fulfillment_engine::config::AppConfig;
use fulfillment_engine::dispatch::{DailyResetJob, ShipperDispatcher};
use fulfillment_engine::infrastructure::bus::{EventReconciliationJob, InMemoryEventBus};
use fulfillment_engine::infrastructure::cache::InMemoryCache;
use fulfillment_engine::infrastructure::http::{AppState, create_router};
use fulfillment_engine::infrastructure::persistence::{
    InMemoryCatalog, InMemoryInventory, InMemoryOrderRepository, InMemoryPostOfficeRepository,
    InMemoryProviderConfigRepository, InMemoryShipmentRepository, InMemoryShipperRepository,
    RecordingRefundPort,
};
use fulfillment_engine::observability;
use fulfillment_engine::providers::ghn::GhnProvider;
use fulfillment_engine::providers::ghtk::GhtkProvider;
use fulfillment_engine::providers::in_house::InHouseProvider;
use fulfillment_engine::providers::viettel_post::ViettelPostProvider;
use fulfillment_engine::providers::{
    CredentialVault, ProviderCode, ProviderRegistry, RetryPolicy, ShippingGateway,
    ShippingProvider,
};
use fulfillment_engine::realtime::{LocationPipeline, PushHub};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    observability::init_tracing();

    let config = AppConfig::from_env();
    if let Some(addr) = config.server.metrics_addr {
        observability::init_metrics(addr)?;
    }

    // Stores and collaborator adapters (in-memory in this build).
    let cache = Arc::new(InMemoryCache::new());
    let bus = Arc::new(InMemoryEventBus::new());
    let orders = Arc::new(InMemoryOrderRepository::new());
    let shipments = Arc::new(InMemoryShipmentRepository::new());
    let shippers = Arc::new(InMemoryShipperRepository::new());
    let offices = Arc::new(InMemoryPostOfficeRepository::new());
    let provider_configs = Arc::new(InMemoryProviderConfigRepository::new());
    let inventory = Arc::new(InMemoryInventory::new());
    let refunds = Arc::new(RecordingRefundPort::new());
    let catalog = Arc::new(InMemoryCatalog::new());
    let shops = Arc::new(InMemoryShopDirectory::new());

    let vault = CredentialVault::new(config.providers.vault_secret.clone());

    // Carrier registry: code -> constructor.
    let mut registry = ProviderRegistry::new();
    {
        let endpoint = config.providers.ghtk.endpoint.clone();
        registry.register(ProviderCode::Ghtk, move |creds| {
            Ok(Arc::new(GhtkProvider::new(creds, &endpoint)?) as Arc<dyn ShippingProvider>)
        });
    }
    {
        let endpoint = config.providers.ghn.endpoint.clone();
        registry.register(ProviderCode::Ghn, move |creds| {
            Ok(Arc::new(GhnProvider::new(creds, &endpoint)?) as Arc<dyn ShippingProvider>)
        });
    }
    {
        let endpoint = config.providers.viettel_post.endpoint.clone();
        registry.register(ProviderCode::ViettelPost, move |creds| {
            Ok(Arc::new(ViettelPostProvider::new(creds, &endpoint)?) as Arc<dyn ShippingProvider>)
        });
    }
    {
        let shipments = Arc::clone(&shipments) as Arc<dyn ShipmentRepository>;
        registry.register(ProviderCode::InHouse, move |_creds| {
            Ok(Arc::new(InHouseProvider::new(Arc::clone(&shipments))) as Arc<dyn ShippingProvider>)
        });
    }

    // Webhook handlers run on system accounts; carriers without one stay
    // out of the map and their webhooks bounce as invalid providers.
    let mut webhook_handlers: HashMap<ProviderCode, Arc<dyn ShippingProvider>> = HashMap::new();
    if let Ok(provider) = GhtkProvider::new(
        &config.providers.ghtk.system_creds,
        &config.providers.ghtk.endpoint,
    ) {
        webhook_handlers.insert(ProviderCode::Ghtk, Arc::new(provider));
    }
    if let Ok(provider) = GhnProvider::new(
        &config.providers.ghn.system_creds,
        &config.providers.ghn.endpoint,
    ) {
        webhook_handlers.insert(ProviderCode::Ghn, Arc::new(provider));
    }
    if let Ok(provider) = ViettelPostProvider::new(
        &config.providers.viettel_post.system_creds,
        &config.providers.viettel_post.endpoint,
    ) {
        webhook_handlers.insert(ProviderCode::ViettelPost, Arc::new(provider));
    }

    let gateway = Arc::new(
        ShippingGateway::new(
            registry,
            Arc::clone(&provider_configs) as Arc<dyn ProviderConfigRepository>,
            vault,
            Arc::clone(&cache) as Arc<dyn CachePort>,
            webhook_handlers,
        )
        .with_retry_policy(RetryPolicy {
            max_attempts: config.providers.retry_max_attempts,
            ..RetryPolicy::default()
        })
        .with_cache_ttls(config.cache.fee_ttl, config.cache.tracking_ttl),
    );

    let dispatcher = Arc::new(ShipperDispatcher::new(
        Arc::clone(&offices) as Arc<dyn PostOfficeRepository>,
        Arc::clone(&shippers) as Arc<dyn ShipperRepository>,
        Arc::clone(&shipments) as Arc<dyn ShipmentRepository>,
        Arc::clone(&bus) as Arc<dyn EventBusPort>,
    ));
    let hub = Arc::new(PushHub::new());
    let locations = Arc::new(LocationPipeline::new(
        Arc::clone(&cache) as Arc<dyn CachePort>,
        Arc::clone(&hub),
    ));

    let state = Arc::new(AppState {
        products: CachedProductReader::new(
            Arc::clone(&catalog) as Arc<dyn CatalogPort>,
            Arc::clone(&cache) as Arc<dyn CachePort>,
        ),
        checkout: CheckoutUseCase::new(
            Arc::clone(&orders) as Arc<dyn OrderRepository>,
            Arc::clone(&inventory) as Arc<dyn InventoryPort>,
            Arc::clone(&bus) as Arc<dyn EventBusPort>,
        ),
        cancel_order: CancelOrderUseCase::new(
            Arc::clone(&orders) as Arc<dyn OrderRepository>,
            Arc::clone(&inventory) as Arc<dyn InventoryPort>,
            Arc::clone(&refunds) as Arc<dyn RefundPort>,
            Arc::clone(&bus) as Arc<dyn EventBusPort>,
        ),
        confirm_receipt: ConfirmReceiptUseCase::new(
            Arc::clone(&orders) as Arc<dyn OrderRepository>,
            Arc::clone(&bus) as Arc<dyn EventBusPort>,
        ),
        partner: PartnerFulfillmentUseCase::new(
            Arc::clone(&orders) as Arc<dyn OrderRepository>,
            Arc::clone(&shipments) as Arc<dyn ShipmentRepository>,
            Arc::clone(&shops) as Arc<dyn ShopDirectoryPort>,
            Arc::clone(&provider_configs) as Arc<dyn ProviderConfigRepository>,
            Arc::clone(&inventory) as Arc<dyn InventoryPort>,
            Arc::clone(&gateway),
            Arc::clone(&dispatcher),
            Arc::clone(&bus) as Arc<dyn EventBusPort>,
        ),
        returns: ReturnFlowUseCase::new(
            Arc::clone(&orders) as Arc<dyn OrderRepository>,
            Arc::clone(&refunds) as Arc<dyn RefundPort>,
            Arc::clone(&bus) as Arc<dyn EventBusPort>,
        ),
        shipper: ShipperActionsUseCase::new(
            Arc::clone(&orders) as Arc<dyn OrderRepository>,
            Arc::clone(&shipments) as Arc<dyn ShipmentRepository>,
            Arc::clone(&shippers) as Arc<dyn ShipperRepository>,
            Arc::clone(&bus) as Arc<dyn EventBusPort>,
            Arc::clone(&hub),
        ),
        webhook: ProcessWebhookUseCase::new(
            Arc::clone(&gateway),
            Arc::clone(&shipments) as Arc<dyn ShipmentRepository>,
            Arc::clone(&orders) as Arc<dyn OrderRepository>,
            Arc::clone(&cache) as Arc<dyn CachePort>,
            Arc::clone(&bus) as Arc<dyn EventBusPort>,
            Arc::clone(&hub),
        ),
        tracking: TrackShipmentUseCase::new(
            Arc::clone(&shipments) as Arc<dyn ShipmentRepository>,
            Arc::clone(&orders) as Arc<dyn OrderRepository>,
            Arc::clone(&gateway),
        ),
        gateway: Arc::clone(&gateway),
        locations,
        orders: Arc::clone(&orders) as Arc<dyn OrderRepository>,
        version: env!("CARGO_PKG_VERSION").to_string(),
    });

    let shutdown = CancellationToken::new();

    // Payments queue consumer: the core never talks to payment providers
    // directly, it reacts to their outcome events.
    {
        let handler = PaymentEventHandler::new(
            Arc::clone(&orders) as Arc<dyn OrderRepository>,
            Arc::clone(&inventory) as Arc<dyn InventoryPort>,
            Arc::clone(&bus) as Arc<dyn EventBusPort>,
        );
        let mut payments = bus.subscribe(fulfillment_engine::domain::order::QueueName::Payments);
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            loop {
                let message = tokio::select! {
                    () = shutdown.cancelled() => break,
                    message = payments.recv() => match message {
                        Some(message) => message,
                        None => break,
                    },
                };
                let Ok(event) = serde_json::from_value::<
                    fulfillment_engine::domain::order::DomainEvent,
                >(message.envelope["payload"].clone()) else {
                    tracing::warn!(schema = %message.envelope["schema"], "unparseable payment event");
                    continue;
                };
                use fulfillment_engine::domain::order::DomainEvent;
                let result = match &event {
                    DomainEvent::PaymentSucceeded { order_id, at, .. } => {
                        handler.on_payment_succeeded(order_id, *at).await
                    }
                    DomainEvent::PaymentFailed {
                        order_id,
                        reason,
                        at,
                    } => handler.on_payment_failed(order_id, reason, *at).await,
                    _ => Ok(()),
                };
                if let Err(err) = result {
                    // At-least-once: the broker redelivers, the handler is
                    // idempotent.
                    tracing::error!(event = event.name(), error = %err, "payment event failed");
                }
            }
        });
    }

    // Daily counter reset, polled per region in its own timezone.
    {
        let shippers = Arc::clone(&shippers);
        let cutovers = config.dispatch.cutovers.clone();
        let interval = Duration::from_secs(config.dispatch.poll_interval_secs);
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let job = DailyResetJob::new(&*shippers, cutovers.clone());
                if let Err(err) = job.run_once(Utc::now()).await {
                    tracing::error!(error = %err, "daily reset pass failed");
                }
            }
        });
    }

    // Event reconciliation: re-emit from persisted truth so a publish
    // lost after a commit eventually reaches consumers.
    {
        let job = EventReconciliationJob::new(
            Arc::clone(&orders) as Arc<dyn OrderRepository>,
            Arc::clone(&shipments) as Arc<dyn ShipmentRepository>,
            Arc::clone(&bus) as Arc<dyn EventBusPort>,
        );
        let interval = Duration::from_secs(config.bus.reconcile_interval_secs);
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // skip the immediate tick
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                match job.run_once().await {
                    Ok(count) if count > 0 => {
                        tracing::info!(events = count, "reconciliation pass re-emitted events");
                    }
                    Ok(_) => {}
                    Err(err) => tracing::error!(error = %err, "reconciliation pass failed"),
                }
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    tracing::info!(addr = %config.server.bind_addr, "fulfillment engine listening");

    let server_shutdown = shutdown.clone();
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutting down");
            server_shutdown.cancel();
        })
        .await
        .context("server error")?;

    Ok(())
}
