//! Rich error handling for the fulfillment engine.
//!
//! Every failure surfaced to a client carries a stable string code, an HTTP
//! status, and a human message. Codes are language-neutral; messages are
//! localized per surface (Vietnamese on the customer/partner/shipper
//! surfaces, English on the admin surface).
//!
//! # HTTP status mapping
//!
//! | Code | Status |
//! |------|--------|
//! | `NOT_FOUND` | 404 |
//! | `FORBIDDEN` | 403 |
//! | `VALIDATION_ERROR` | 400 |
//! | `INVALID_STATUS_TRANSITION` | 409 |
//! | `INSUFFICIENT_STOCK` | 409 |
//! | `INVALID_PROVIDER` | 400 |
//! | `PROVIDER_NOT_CONFIGURED` | 400 |
//! | `PROVIDER_ERROR` | 502 |
//! | `INVALID_SIGNATURE` | 401 |
//! | `MISSING_TRACKING` | 502 |
//! | `NO_SHIPPER_AVAILABLE` | 409 |
//! | `ALREADY_ASSIGNED` | 409 |
//! | `CONFLICT` | 409 |
//! | `RATE_LIMITED` | 429 |
//! | `INTERNAL` | 500 |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::order::OrderError;
use crate::domain::shipment::ShipmentError;

/// Which client surface a response is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Surface {
    /// Buying customers (Vietnamese).
    #[default]
    Customer,
    /// Selling partners (Vietnamese).
    Partner,
    /// Shipper app (Vietnamese).
    Shipper,
    /// Platform admins (English).
    Admin,
}

/// Error kinds surfaced by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Entity not found.
    NotFound,
    /// Actor does not own the resource.
    Forbidden,
    /// Malformed or inconsistent input.
    ValidationError,
    /// A state-machine transition outside the allowed table.
    InvalidStatusTransition,
    /// Stock reservation failed.
    InsufficientStock,
    /// Unknown shipping provider code.
    InvalidProvider,
    /// Provider known but not configured for the shop.
    ProviderNotConfigured,
    /// External provider call failed.
    ProviderError,
    /// Webhook signature did not verify.
    InvalidSignature,
    /// Provider returned no tracking number.
    MissingTracking,
    /// Dispatch found no eligible shipper.
    NoShipperAvailable,
    /// A shipper is already assigned to the leg.
    AlreadyAssigned,
    /// Concurrent-update conflict.
    ConflictError,
    /// Too many requests.
    RateLimited,
    /// Unexpected server error.
    Internal,
}

impl ErrorKind {
    /// Stable language-neutral code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidStatusTransition => "INVALID_STATUS_TRANSITION",
            Self::InsufficientStock => "INSUFFICIENT_STOCK",
            Self::InvalidProvider => "INVALID_PROVIDER",
            Self::ProviderNotConfigured => "PROVIDER_NOT_CONFIGURED",
            Self::ProviderError => "PROVIDER_ERROR",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::MissingTracking => "MISSING_TRACKING",
            Self::NoShipperAvailable => "NO_SHIPPER_AVAILABLE",
            Self::AlreadyAssigned => "ALREADY_ASSIGNED",
            Self::ConflictError => "CONFLICT",
            Self::RateLimited => "RATE_LIMITED",
            Self::Internal => "INTERNAL",
        }
    }

    /// HTTP status for this kind.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Forbidden => 403,
            Self::ValidationError | Self::InvalidProvider | Self::ProviderNotConfigured => 400,
            Self::InvalidStatusTransition
            | Self::InsufficientStock
            | Self::NoShipperAvailable
            | Self::AlreadyAssigned
            | Self::ConflictError => 409,
            Self::ProviderError | Self::MissingTracking => 502,
            Self::InvalidSignature => 401,
            Self::RateLimited => 429,
            Self::Internal => 500,
        }
    }

    /// Default Vietnamese message.
    #[must_use]
    pub const fn message_vi(&self) -> &'static str {
        match self {
            Self::NotFound => "Không tìm thấy dữ liệu",
            Self::Forbidden => "Bạn không có quyền thực hiện thao tác này",
            Self::ValidationError => "Dữ liệu không hợp lệ",
            Self::InvalidStatusTransition => "Trạng thái đơn hàng không cho phép thao tác này",
            Self::InsufficientStock => "Sản phẩm không đủ hàng",
            Self::InvalidProvider => "Đơn vị vận chuyển không hợp lệ",
            Self::ProviderNotConfigured => "Đơn vị vận chuyển chưa được cấu hình",
            Self::ProviderError => "Đơn vị vận chuyển đang gặp sự cố",
            Self::InvalidSignature => "Chữ ký không hợp lệ",
            Self::MissingTracking => "Thiếu mã vận đơn từ đơn vị vận chuyển",
            Self::NoShipperAvailable => "Hiện không có shipper khả dụng",
            Self::AlreadyAssigned => "Đơn đã được phân công shipper",
            Self::ConflictError => "Dữ liệu đã thay đổi, vui lòng thử lại",
            Self::RateLimited => "Quá nhiều yêu cầu, vui lòng thử lại sau",
            Self::Internal => "Lỗi hệ thống",
        }
    }

    /// Default English message.
    #[must_use]
    pub const fn message_en(&self) -> &'static str {
        match self {
            Self::NotFound => "Not found",
            Self::Forbidden => "You are not allowed to perform this action",
            Self::ValidationError => "Invalid request data",
            Self::InvalidStatusTransition => "Status does not allow this operation",
            Self::InsufficientStock => "Insufficient stock",
            Self::InvalidProvider => "Unknown shipping provider",
            Self::ProviderNotConfigured => "Shipping provider is not configured",
            Self::ProviderError => "Shipping provider error",
            Self::MissingTracking => "Provider returned no tracking number",
            Self::InvalidSignature => "Invalid webhook signature",
            Self::NoShipperAvailable => "No shipper available",
            Self::AlreadyAssigned => "Shipment already assigned",
            Self::ConflictError => "Conflicting update, please retry",
            Self::RateLimited => "Too many requests",
            Self::Internal => "Internal server error",
        }
    }

    /// Localized message for a surface.
    #[must_use]
    pub const fn localized_message(&self, surface: Surface) -> &'static str {
        match surface {
            Surface::Admin => self.message_en(),
            Surface::Customer | Surface::Partner | Surface::Shipper => self.message_vi(),
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// An error with kind, detail, and key-value context.
#[derive(Debug, Clone, Error)]
pub struct AppError {
    kind: ErrorKind,
    detail: String,
    context: Vec<(String, String)>,
}

impl AppError {
    /// Create a new error.
    #[must_use]
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            context: Vec::new(),
        }
    }

    /// Add context to the error.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }

    /// Get the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the detail message (developer-facing, English).
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Get the context pairs.
    #[must_use]
    pub fn context(&self) -> &[(String, String)] {
        &self.context
    }

    /// Not-found error for an entity id.
    #[must_use]
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::new(ErrorKind::NotFound, format!("{entity} {id} not found"))
            .with_context("entity", entity)
    }

    /// Ownership failure.
    #[must_use]
    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, detail)
    }

    /// Validation failure.
    #[must_use]
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, detail)
    }

    /// Concurrent-update conflict.
    #[must_use]
    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConflictError, detail)
    }

    /// Unexpected internal failure.
    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, detail)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind.code(), self.detail)
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let kind = match &err {
            OrderError::InvalidSubOrderTransition { .. }
            | OrderError::InvalidOrderTransition { .. } => ErrorKind::InvalidStatusTransition,
            OrderError::Forbidden => ErrorKind::Forbidden,
            OrderError::NotCancellable { .. } | OrderError::InvalidTotals { .. } => {
                ErrorKind::ValidationError
            }
            OrderError::NotFound { .. } => ErrorKind::NotFound,
        };
        Self::new(kind, err.to_string())
    }
}

impl From<ShipmentError> for AppError {
    fn from(err: ShipmentError) -> Self {
        let kind = match &err {
            ShipmentError::AlreadyTerminal { .. } => ErrorKind::InvalidStatusTransition,
            ShipmentError::CodOutsideDelivery { .. } => ErrorKind::ValidationError,
        };
        Self::new(kind, err.to_string())
    }
}
