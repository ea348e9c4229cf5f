//! Request actors.
//!
//! Authentication lives outside the core; every request arrives with a
//! resolved `(user id, role, shop id?)` triple which the operations use
//! purely for ownership checks.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::identifiers::{ShopId, UserId};

/// Role of a request actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A buying customer.
    Customer,
    /// A selling partner (shop owner).
    Partner,
    /// Platform administrator.
    Admin,
    /// An in-house delivery shipper.
    Shipper,
    /// Internal automation (payment consumers, reset jobs).
    System,
}

impl Role {
    /// Parse a role from a header value, case-insensitively.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "customer" => Some(Self::Customer),
            "partner" => Some(Self::Partner),
            "admin" => Some(Self::Admin),
            "shipper" => Some(Self::Shipper),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Customer => "customer",
            Self::Partner => "partner",
            Self::Admin => "admin",
            Self::Shipper => "shipper",
            Self::System => "system",
        };
        write!(f, "{s}")
    }
}

/// The identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Acting user.
    pub user_id: UserId,
    /// Acting role.
    pub role: Role,
    /// Owned shop, for partners.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_id: Option<ShopId>,
}

impl Actor {
    /// Create an actor.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role, shop_id: Option<ShopId>) -> Self {
        Self {
            user_id,
            role,
            shop_id,
        }
    }

    /// Internal automation actor.
    #[must_use]
    pub fn system() -> Self {
        Self {
            user_id: UserId::new("system"),
            role: Role::System,
            shop_id: None,
        }
    }

    /// Whether this actor bypasses ownership checks.
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        matches!(self.role, Role::Admin | Role::System)
    }

    /// Whether this actor owns the given user-scoped resource.
    #[must_use]
    pub fn owns_user(&self, user_id: &UserId) -> bool {
        self.is_privileged() || (matches!(self.role, Role::Customer) && &self.user_id == user_id)
    }

    /// Whether this actor owns the given shop.
    #[must_use]
    pub fn owns_shop(&self, shop_id: &ShopId) -> bool {
        self.is_privileged()
            || (matches!(self.role, Role::Partner) && self.shop_id.as_ref() == Some(shop_id))
    }
}
