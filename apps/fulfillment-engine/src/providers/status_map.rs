//! Static per-provider status mapping.
//!
//! Translates raw carrier status tokens into the unified set. Unknown
//! tokens default to `created` (logged, never an error) so a carrier
//! rolling out a new status cannot break intake.

use crate::domain::shipment::UnifiedShippingStatus;

use super::code::ProviderCode;

/// GHTK numeric status ids.
const GHTK_MAP: &[(&str, UnifiedShippingStatus)] = &[
    ("-1", UnifiedShippingStatus::Cancelled),
    ("1", UnifiedShippingStatus::Created),
    ("2", UnifiedShippingStatus::Assigned),
    ("10", UnifiedShippingStatus::PickedUp),
    ("3", UnifiedShippingStatus::Delivering),
    ("4", UnifiedShippingStatus::Delivered),
    ("5", UnifiedShippingStatus::Failed),
    ("6", UnifiedShippingStatus::Returning),
    ("7", UnifiedShippingStatus::Returned),
];

/// GHN string tokens.
const GHN_MAP: &[(&str, UnifiedShippingStatus)] = &[
    ("ready_to_pick", UnifiedShippingStatus::Created),
    ("picking", UnifiedShippingStatus::Assigned),
    ("picked", UnifiedShippingStatus::PickedUp),
    ("delivering", UnifiedShippingStatus::Delivering),
    ("delivered", UnifiedShippingStatus::Delivered),
    ("delivery_fail", UnifiedShippingStatus::Failed),
    ("return", UnifiedShippingStatus::Returning),
    ("returned", UnifiedShippingStatus::Returned),
    ("cancel", UnifiedShippingStatus::Cancelled),
];

/// Viettel Post numeric codes.
const VIETTEL_POST_MAP: &[(&str, UnifiedShippingStatus)] = &[
    ("-100", UnifiedShippingStatus::Created),
    ("100", UnifiedShippingStatus::Assigned),
    ("200", UnifiedShippingStatus::PickedUp),
    ("300", UnifiedShippingStatus::Delivering),
    ("501", UnifiedShippingStatus::Delivered),
    ("502", UnifiedShippingStatus::Failed),
    ("505", UnifiedShippingStatus::Returning),
    ("507", UnifiedShippingStatus::Returned),
    ("503", UnifiedShippingStatus::Cancelled),
];

/// The in-house fleet already speaks unified tokens.
const IN_HOUSE_MAP: &[(&str, UnifiedShippingStatus)] = &[
    ("created", UnifiedShippingStatus::Created),
    ("assigned", UnifiedShippingStatus::Assigned),
    ("picked_up", UnifiedShippingStatus::PickedUp),
    ("delivering", UnifiedShippingStatus::Delivering),
    ("delivered", UnifiedShippingStatus::Delivered),
    ("failed", UnifiedShippingStatus::Failed),
    ("returning", UnifiedShippingStatus::Returning),
    ("returned", UnifiedShippingStatus::Returned),
    ("cancelled", UnifiedShippingStatus::Cancelled),
];

/// The mapping table of one provider.
#[must_use]
pub const fn mapping(code: ProviderCode) -> &'static [(&'static str, UnifiedShippingStatus)] {
    match code {
        ProviderCode::Ghtk => GHTK_MAP,
        ProviderCode::Ghn => GHN_MAP,
        ProviderCode::ViettelPost => VIETTEL_POST_MAP,
        ProviderCode::InHouse => IN_HOUSE_MAP,
    }
}

/// Normalize a raw provider token into the unified set.
///
/// Unknown tokens fall back to `created` and are logged.
#[must_use]
pub fn normalize(code: ProviderCode, raw: &str) -> UnifiedShippingStatus {
    let token = raw.trim();
    for (candidate, status) in mapping(code) {
        if token.eq_ignore_ascii_case(candidate) {
            return *status;
        }
    }
    tracing::warn!(provider = %code, token = raw, "unknown provider status token, defaulting to created");
    UnifiedShippingStatus::Created
}
