//! Strongly-typed identifiers for domain entities.
//!
//! These prevent mixing up IDs from different contexts (an order id is
//! never a shipment id, even though both are strings on the wire).

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier from a string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Generate a new unique identifier using UUID v4.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Get the inner string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_id!(UserId, "Unique identifier for a user account.");
define_id!(ShopId, "Unique identifier for a seller shop.");
define_id!(OrderId, "Unique identifier for a customer order.");
define_id!(SubOrderId, "Unique identifier for a per-shop sub-order.");
define_id!(OrderItemId, "Unique identifier for an order line item.");
define_id!(VariantId, "Identifier for a product variant (stock unit).");
define_id!(ShipmentId, "Unique identifier for a physical shipment.");
define_id!(ShipperId, "Unique identifier for an in-house shipper.");
define_id!(PostOfficeId, "Unique identifier for a post office.");
define_id!(TrackingNumber, "Carrier-facing tracking number of a shipment.");
define_id!(
    ProviderOrderId,
    "Order id assigned by an external shipping provider."
);
