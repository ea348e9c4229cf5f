//! HTTP surface: router, request DTOs, response envelope.

pub mod controller;
pub mod request;
pub mod response;

pub use controller::{AppState, create_router};
pub use response::{ApiEnvelope, ApiError};
