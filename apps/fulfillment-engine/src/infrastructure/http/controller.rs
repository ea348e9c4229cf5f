//! HTTP Controller (Driver Adapter)
//!
//! Axum-based REST API that delegates to the application use cases. Thin
//! request-to-contract translation only; no business rules live here.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use tokio_util::sync::CancellationToken;

use crate::application::ports::OrderRepository;
use crate::application::use_cases::{
    CachedProductReader, CancelOrderUseCase, CheckoutUseCase, ConfirmReceiptUseCase,
    PartnerFulfillmentUseCase, ProcessWebhookUseCase, ReturnFlowUseCase,
    ShipperActionsUseCase, TrackShipmentUseCase,
};
use crate::domain::shared::{OrderId, ShipmentId, SubOrderId, TrackingNumber};
use crate::error::{AppError, Surface};
use crate::providers::{FeeRequest, ShippingGateway};
use crate::realtime::LocationPipeline;

use super::request::{
    AvailabilityRequest, CancelRequest, CheckoutRequest, FailDeliveryRequest, FeeQuoteRequest,
    LocationPushRequest, actor_from_headers,
};
use super::response::{error, ok};

/// Application state shared across handlers.
pub struct AppState {
    /// Cached product reads.
    pub products: CachedProductReader,
    /// Checkout fan-out.
    pub checkout: CheckoutUseCase,
    /// Customer cancellation.
    pub cancel_order: CancelOrderUseCase,
    /// Receipt confirmation.
    pub confirm_receipt: ConfirmReceiptUseCase,
    /// Partner fulfillment.
    pub partner: PartnerFulfillmentUseCase,
    /// Return branch operations.
    pub returns: ReturnFlowUseCase,
    /// Shipper actions.
    pub shipper: ShipperActionsUseCase,
    /// Webhook intake.
    pub webhook: ProcessWebhookUseCase,
    /// Tracking reads.
    pub tracking: TrackShipmentUseCase,
    /// Fee aggregation.
    pub gateway: Arc<ShippingGateway>,
    /// GPS ingestion.
    pub locations: Arc<LocationPipeline>,
    /// Order queries.
    pub orders: Arc<dyn OrderRepository>,
    /// Application version.
    pub version: String,
}

/// Create the HTTP router with all endpoints.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/products/{id_or_slug}", get(get_product))
        .route("/api/shipping/fees", post(quote_fees))
        .route("/api/orders", post(create_order).get(list_orders))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/{id}/cancel", post(cancel_order))
        .route("/api/orders/{id}/receipt", post(confirm_receipt))
        .route(
            "/api/orders/sub-orders/{id}/return",
            post(request_return),
        )
        .route(
            "/api/partner/orders/{id}/return/approve",
            patch(approve_return),
        )
        .route(
            "/api/partner/orders/{id}/return/reject",
            patch(reject_return),
        )
        .route(
            "/api/partner/orders/{id}/return/received",
            patch(mark_return_received),
        )
        .route(
            "/api/admin/orders/{id}/return/refund",
            post(refund_return),
        )
        .route("/api/partner/orders", get(partner_orders))
        .route("/api/partner/orders/{id}/confirm", patch(partner_confirm))
        .route("/api/partner/orders/{id}/process", patch(partner_process))
        .route("/api/partner/orders/{id}/pack", patch(partner_pack))
        .route("/api/partner/orders/{id}/cancel", patch(partner_cancel))
        .route(
            "/api/partner/shipping/{provider}/test",
            post(partner_test_provider),
        )
        .route("/api/shipper/shipments/{id}/pickup", post(shipper_pickup))
        .route("/api/shipper/shipments/{id}/deliver", post(shipper_deliver))
        .route("/api/shipper/shipments/{id}/fail", post(shipper_fail))
        .route("/api/shipper/location", post(shipper_location))
        .route("/api/shipper/availability", patch(shipper_availability))
        .route("/api/shipments/{tracking_number}", get(get_tracking))
        .route(
            "/api/shipments/{tracking_number}/history",
            get(get_tracking_history),
        )
        .route(
            "/api/admin/shipping/webhook/{provider}",
            post(provider_webhook),
        )
        .with_state(state)
}

fn respond<T: serde::Serialize>(
    surface: Surface,
    result: Result<T, AppError>,
) -> Response {
    match result {
        Ok(data) => ok(data),
        Err(err) => {
            tracing::debug!(error = %err, "request failed");
            error(&err, surface)
        }
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Response {
    ok(serde_json::json!({
        "status": "healthy",
        "version": state.version,
    }))
}

async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id_or_slug): Path<String>,
) -> Response {
    let result = state.products.get(&id_or_slug).await.and_then(|found| {
        found.ok_or_else(|| AppError::not_found("product", &id_or_slug))
    });
    respond(Surface::Customer, result)
}

async fn quote_fees(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FeeQuoteRequest>,
) -> Response {
    let cancel = CancellationToken::new();
    let result = state
        .gateway
        .calculate_fees(
            &FeeRequest {
                shop_id: crate::domain::shared::ShopId::new(request.shop_id),
                pickup: request.pickup,
                delivery: request.delivery,
                package: crate::domain::shipment::PackageInfo {
                    weight_grams: request.weight_grams,
                    declared_value: request.declared_value,
                    description: None,
                },
                cod_amount: request.cod_amount,
            },
            &cancel,
        )
        .await;
    respond(Surface::Customer, result)
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CheckoutRequest>,
) -> Response {
    let result = match actor_from_headers(&headers) {
        Ok(actor) => state.checkout.execute(&actor, request.into()).await,
        Err(err) => Err(err),
    };
    respond(Surface::Customer, result)
}

async fn list_orders(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let result = match actor_from_headers(&headers) {
        Ok(actor) => state.orders.list_orders_by_user(&actor.user_id).await,
        Err(err) => Err(err),
    };
    respond(Surface::Customer, result)
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let result = async {
        let actor = actor_from_headers(&headers)?;
        let order_id = OrderId::new(id);
        let order = state
            .orders
            .find_order(&order_id)
            .await?
            .ok_or_else(|| AppError::not_found("order", &order_id))?;
        if !actor.owns_user(&order.user_id) {
            return Err(AppError::forbidden("order belongs to another customer"));
        }
        let sub_orders = state.orders.list_sub_orders_by_order(&order_id).await?;
        Ok(serde_json::json!({
            "order": order,
            "sub_orders": sub_orders,
        }))
    }
    .await;
    respond(Surface::Customer, result)
}

async fn cancel_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<CancelRequest>,
) -> Response {
    let result = match actor_from_headers(&headers) {
        Ok(actor) => {
            state
                .cancel_order
                .execute(&actor, &OrderId::new(id), &request.reason)
                .await
                .map(|receipt| {
                    serde_json::json!({
                        "status": receipt.order_status,
                        "refund_initiated": receipt.refund_initiated,
                        "refund_failed": receipt.refund_failed,
                    })
                })
        }
        Err(err) => Err(err),
    };
    respond(Surface::Customer, result)
}

async fn confirm_receipt(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let result = match actor_from_headers(&headers) {
        Ok(actor) => state
            .confirm_receipt
            .execute(&actor, &OrderId::new(id))
            .await
            .map(|outcome| {
                serde_json::json!({
                    "completed_sub_orders": outcome.completed_sub_orders,
                    "coins_granted": outcome.coins_granted,
                    "order_completed": outcome.order_completed,
                })
            }),
        Err(err) => Err(err),
    };
    respond(Surface::Customer, result)
}

async fn request_return(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<CancelRequest>,
) -> Response {
    let result = match actor_from_headers(&headers) {
        Ok(actor) => {
            state
                .returns
                .request(&actor, &SubOrderId::new(id), &request.reason)
                .await
        }
        Err(err) => Err(err),
    };
    respond(Surface::Customer, result)
}

async fn approve_return(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let result = match actor_from_headers(&headers) {
        Ok(actor) => state.returns.approve(&actor, &SubOrderId::new(id)).await,
        Err(err) => Err(err),
    };
    respond(Surface::Partner, result)
}

async fn reject_return(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<CancelRequest>,
) -> Response {
    let result = match actor_from_headers(&headers) {
        Ok(actor) => {
            state
                .returns
                .reject(&actor, &SubOrderId::new(id), &request.reason)
                .await
        }
        Err(err) => Err(err),
    };
    respond(Surface::Partner, result)
}

async fn mark_return_received(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let result = match actor_from_headers(&headers) {
        Ok(actor) => {
            state
                .returns
                .mark_returned(&actor, &SubOrderId::new(id))
                .await
        }
        Err(err) => Err(err),
    };
    respond(Surface::Partner, result)
}

async fn refund_return(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let result = match actor_from_headers(&headers) {
        Ok(actor) => state.returns.refund(&actor, &SubOrderId::new(id)).await,
        Err(err) => Err(err),
    };
    respond(Surface::Admin, result)
}

async fn partner_orders(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let result = async {
        let actor = actor_from_headers(&headers)?;
        let shop_id = actor
            .shop_id
            .clone()
            .ok_or_else(|| AppError::forbidden("partner has no shop"))?;
        state.orders.list_sub_orders_by_shop(&shop_id).await
    }
    .await;
    respond(Surface::Partner, result)
}

async fn partner_confirm(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let result = match actor_from_headers(&headers) {
        Ok(actor) => state.partner.confirm(&actor, &SubOrderId::new(id)).await,
        Err(err) => Err(err),
    };
    respond(Surface::Partner, result)
}

async fn partner_process(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let result = match actor_from_headers(&headers) {
        Ok(actor) => {
            state
                .partner
                .start_processing(&actor, &SubOrderId::new(id))
                .await
        }
        Err(err) => Err(err),
    };
    respond(Surface::Partner, result)
}

async fn partner_pack(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let cancel = CancellationToken::new();
    let result = match actor_from_headers(&headers) {
        Ok(actor) => {
            state
                .partner
                .pack(&actor, &SubOrderId::new(id), &cancel)
                .await
        }
        Err(err) => Err(err),
    };
    respond(Surface::Partner, result)
}

async fn partner_cancel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<CancelRequest>,
) -> Response {
    let result = match actor_from_headers(&headers) {
        Ok(actor) => {
            state
                .partner
                .cancel(&actor, &SubOrderId::new(id), &request.reason)
                .await
        }
        Err(err) => Err(err),
    };
    respond(Surface::Partner, result)
}

async fn partner_test_provider(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(provider): Path<String>,
) -> Response {
    let result = async {
        let actor = actor_from_headers(&headers)?;
        let shop_id = actor
            .shop_id
            .clone()
            .ok_or_else(|| AppError::forbidden("partner has no shop"))?;
        let code = crate::providers::ProviderRegistry::parse_code(&provider)?;
        state.gateway.test_connection(&shop_id, code).await?;
        Ok(serde_json::json!({"connected": true}))
    }
    .await;
    respond(Surface::Partner, result)
}

async fn shipper_pickup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let result = match actor_from_headers(&headers) {
        Ok(actor) => state.shipper.pickup(&actor, &ShipmentId::new(id)).await,
        Err(err) => Err(err),
    };
    respond(Surface::Shipper, result)
}

async fn shipper_deliver(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let result = match actor_from_headers(&headers) {
        Ok(actor) => state.shipper.deliver(&actor, &ShipmentId::new(id)).await,
        Err(err) => Err(err),
    };
    respond(Surface::Shipper, result)
}

async fn shipper_fail(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<FailDeliveryRequest>,
) -> Response {
    let result = match actor_from_headers(&headers) {
        Ok(actor) => {
            state
                .shipper
                .fail(&actor, &ShipmentId::new(id), &request.reason)
                .await
        }
        Err(err) => Err(err),
    };
    respond(Surface::Shipper, result)
}

async fn shipper_location(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<LocationPushRequest>,
) -> Response {
    let result = async {
        let actor = actor_from_headers(&headers)?;
        let shipper = state.shipper.current_shipper(&actor).await?;
        state.locations.ingest(&shipper.id, request.sample).await?;
        Ok(serde_json::json!({"accepted": true}))
    }
    .await;
    respond(Surface::Shipper, result)
}

async fn shipper_availability(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<AvailabilityRequest>,
) -> Response {
    let result = match actor_from_headers(&headers) {
        Ok(actor) => {
            state
                .shipper
                .set_availability(&actor, request.is_online, request.is_available)
                .await
        }
        Err(err) => Err(err),
    };
    respond(Surface::Shipper, result)
}

async fn get_tracking(
    State(state): State<Arc<AppState>>,
    Path(tracking_number): Path<String>,
) -> Response {
    let cancel = CancellationToken::new();
    let result = state
        .tracking
        .current(&TrackingNumber::new(tracking_number), &cancel)
        .await;
    respond(Surface::Customer, result)
}

async fn get_tracking_history(
    State(state): State<Arc<AppState>>,
    Path(tracking_number): Path<String>,
) -> Response {
    let result = state
        .tracking
        .history(&TrackingNumber::new(tracking_number))
        .await;
    respond(Surface::Customer, result)
}

async fn provider_webhook(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get("x-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let result = state
        .webhook
        .execute(&provider, &body, signature)
        .await
        .map(|outcome| {
            serde_json::json!({
                "status_updated": outcome.status_updated,
                "duplicate": outcome.duplicate,
            })
        });
    respond(Surface::Admin, result)
}
