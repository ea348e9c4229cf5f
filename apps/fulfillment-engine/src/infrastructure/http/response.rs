//! HTTP response envelope.
//!
//! Every endpoint answers `{success, data?, error?}`; error bodies carry
//! the stable code plus a message localized for the requesting surface.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Surface};

/// The `{success, data?, error?}` wire envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Whether the request succeeded.
    pub success: bool,
    /// Payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

/// Error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Stable language-neutral code.
    pub code: String,
    /// Localized human message.
    pub message: String,
}

impl<T> ApiEnvelope<T> {
    /// Successful envelope.
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Render a success payload.
pub fn ok<T: Serialize>(data: T) -> Response {
    Json(ApiEnvelope::ok(data)).into_response()
}

/// Render an error for a surface.
pub fn error(err: &AppError, surface: Surface) -> Response {
    let status =
        StatusCode::from_u16(err.kind().http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body: ApiEnvelope<()> = ApiEnvelope {
        success: false,
        data: None,
        error: Some(ApiError {
            code: err.kind().code().to_string(),
            message: err.kind().localized_message(surface).to_string(),
        }),
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn envelope_skips_absent_fields() {
        let json = serde_json::to_string(&ApiEnvelope::ok(serde_json::json!({"a": 1}))).unwrap();
        assert!(json.contains(r#""success":true"#));
        assert!(!json.contains("error"));
    }

    #[test]
    fn error_body_is_localized_per_surface() {
        let err = AppError::new(ErrorKind::NoShipperAvailable, "none at po-1");

        let body: ApiEnvelope<()> = ApiEnvelope {
            success: false,
            data: None,
            error: Some(ApiError {
                code: err.kind().code().to_string(),
                message: err.kind().localized_message(Surface::Admin).to_string(),
            }),
        };
        assert_eq!(body.error.as_ref().unwrap().code, "NO_SHIPPER_AVAILABLE");
        assert_eq!(body.error.unwrap().message, "No shipper available");
    }
}
