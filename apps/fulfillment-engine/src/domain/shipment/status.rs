//! The unified, provider-agnostic shipment status set.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The nine unified shipment states.
///
/// Priorities are monotonic along the normal path but not strictly ordered
/// across failure branches; reconciliation of racing updates compares
/// priorities and never downgrades the stored status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnifiedShippingStatus {
    /// Shipping order created at the carrier.
    Created,
    /// A shipper/courier was assigned.
    Assigned,
    /// Parcel picked up from the seller.
    PickedUp,
    /// Out for delivery.
    Delivering,
    /// Delivered to the customer.
    Delivered,
    /// A delivery attempt failed.
    Failed,
    /// Parcel on its way back to the seller.
    Returning,
    /// Parcel returned to the seller.
    Returned,
    /// Shipping order cancelled.
    Cancelled,
}

impl UnifiedShippingStatus {
    /// All statuses, in priority order.
    pub const ALL: [Self; 9] = [
        Self::Created,
        Self::Assigned,
        Self::PickedUp,
        Self::Delivering,
        Self::Delivered,
        Self::Failed,
        Self::Returning,
        Self::Returned,
        Self::Cancelled,
    ];

    /// Reconciliation rank. A racing update wins only when its priority is
    /// greater than or equal to the stored one.
    #[must_use]
    pub const fn priority(&self) -> u8 {
        match self {
            Self::Created => 1,
            Self::Assigned => 2,
            Self::PickedUp => 3,
            Self::Delivering => 4,
            Self::Delivered => 5,
            Self::Failed => 6,
            Self::Returning => 7,
            Self::Returned => 8,
            Self::Cancelled => 9,
        }
    }

    /// No further transitions are permitted from a terminal status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Returned | Self::Cancelled)
    }

    /// The one successful outcome.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Failure-branch statuses. Disjoint from [`Self::is_success`].
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::Failed | Self::Returning | Self::Returned | Self::Cancelled
        )
    }

    /// Status token used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Assigned => "assigned",
            Self::PickedUp => "picked_up",
            Self::Delivering => "delivering",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
            Self::Returning => "returning",
            Self::Returned => "returned",
            Self::Cancelled => "cancelled",
        }
    }

    /// Display string on the customer and shipper surfaces.
    #[must_use]
    pub const fn display_vi(&self) -> &'static str {
        match self {
            Self::Created => "Đã tạo đơn",
            Self::Assigned => "Đã phân công shipper",
            Self::PickedUp => "Đã lấy hàng",
            Self::Delivering => "Đang giao hàng",
            Self::Delivered => "Giao hàng thành công",
            Self::Failed => "Giao hàng thất bại",
            Self::Returning => "Đang hoàn hàng",
            Self::Returned => "Đã hoàn hàng",
            Self::Cancelled => "Đã hủy",
        }
    }
}

impl fmt::Display for UnifiedShippingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priorities_are_one_through_nine() {
        let mut seen: Vec<u8> = UnifiedShippingStatus::ALL
            .iter()
            .map(UnifiedShippingStatus::priority)
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn terminal_set() {
        for s in UnifiedShippingStatus::ALL {
            let expected = matches!(
                s,
                UnifiedShippingStatus::Delivered
                    | UnifiedShippingStatus::Returned
                    | UnifiedShippingStatus::Cancelled
            );
            assert_eq!(s.is_terminal(), expected, "terminal mismatch for {s}");
        }
    }

    #[test]
    fn success_and_failure_are_mutually_exclusive() {
        for s in UnifiedShippingStatus::ALL {
            assert!(
                !(s.is_success() && s.is_failure()),
                "{s} is both success and failure"
            );
        }
        assert!(UnifiedShippingStatus::Delivered.is_success());
        assert!(UnifiedShippingStatus::Failed.is_failure());
    }

    #[test]
    fn delivered_outranks_delivering() {
        assert!(
            UnifiedShippingStatus::Delivered.priority()
                > UnifiedShippingStatus::Delivering.priority()
        );
    }

    #[test]
    fn serde_tokens() {
        let json = serde_json::to_string(&UnifiedShippingStatus::PickedUp).unwrap();
        assert_eq!(json, "\"picked_up\"");
    }

    #[test]
    fn vietnamese_labels_are_present() {
        for s in UnifiedShippingStatus::ALL {
            assert!(!s.display_vi().is_empty());
        }
    }
}
