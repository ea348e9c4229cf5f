//! Logistics dispatch and order-fulfillment core for the Chomart
//! marketplace.
//!
//! Coordinates a customer order across seller fulfillment, in-house
//! last-mile delivery, and external carrier integration:
//!
//! - **Order state machine** — validated order/sub-order transitions,
//!   per-shop fan-out, payment-driven moves, aggregate completion.
//! - **Shipper dispatch** — office resolution, leg planning, ranked
//!   candidate selection behind an atomic capacity gate, journaled daily
//!   counter resets.
//! - **Shipping gateway** — one contract over external carriers and the
//!   in-house fleet: fee aggregation with caching and fallback, webhook
//!   validation, status normalization, retry with backoff, stale-cache
//!   degradation.
//! - **Realtime pipeline** — GPS ingestion into cache + ring buffer and
//!   an in-process push hub; durable status events on the bus.

pub mod application;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod observability;
pub mod providers;
pub mod realtime;
pub mod sync;
