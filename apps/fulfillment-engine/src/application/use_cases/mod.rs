//! Application use cases, one per driver-side operation family.

pub mod cancel_order;
pub mod checkout;
pub mod confirm_receipt;
pub mod partner_fulfillment;
pub mod payment_events;
pub mod process_webhook;
pub mod product_read;
pub mod return_flow;
pub mod shipper_actions;
pub mod track_shipment;

pub use cancel_order::{CancelOrderUseCase, CancellationReceipt};
pub use checkout::{
    CheckoutInput, CheckoutItemInput, CheckoutReceipt, CheckoutShopInput, CheckoutUseCase,
};
pub use confirm_receipt::{ConfirmReceiptUseCase, ReceiptOutcome};
pub use partner_fulfillment::PartnerFulfillmentUseCase;
pub use payment_events::PaymentEventHandler;
pub use process_webhook::{ProcessWebhookUseCase, WebhookOutcome};
pub use product_read::CachedProductReader;
pub use return_flow::ReturnFlowUseCase;
pub use shipper_actions::ShipperActionsUseCase;
pub use track_shipment::TrackShipmentUseCase;
