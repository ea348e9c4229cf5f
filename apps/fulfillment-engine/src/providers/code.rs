//! Provider codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of shipping carriers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderCode {
    /// Giao Hàng Tiết Kiệm.
    Ghtk,
    /// Giao Hàng Nhanh.
    Ghn,
    /// Viettel Post.
    ViettelPost,
    /// The in-house fleet.
    InHouse,
}

impl ProviderCode {
    /// All carriers.
    pub const ALL: [Self; 4] = [Self::Ghtk, Self::Ghn, Self::ViettelPost, Self::InHouse];

    /// Wire token.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ghtk => "ghtk",
            Self::Ghn => "ghn",
            Self::ViettelPost => "viettelpost",
            Self::InHouse => "inhouse",
        }
    }

    /// Display name shown to customers.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Ghtk => "Giao Hàng Tiết Kiệm",
            Self::Ghn => "Giao Hàng Nhanh",
            Self::ViettelPost => "Viettel Post",
            Self::InHouse => "Chomart Express",
        }
    }

    /// Whether this is the in-house fleet.
    #[must_use]
    pub const fn is_in_house(&self) -> bool {
        matches!(self, Self::InHouse)
    }
}

impl FromStr for ProviderCode {
    type Err = String;

    /// Codes are case-insensitive on every surface.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ghtk" => Ok(Self::Ghtk),
            "ghn" => Ok(Self::Ghn),
            "viettelpost" | "viettel_post" | "vtp" => Ok(Self::ViettelPost),
            "inhouse" | "in_house" => Ok(Self::InHouse),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for ProviderCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("GHTK".parse::<ProviderCode>().unwrap(), ProviderCode::Ghtk);
        assert_eq!("Ghn".parse::<ProviderCode>().unwrap(), ProviderCode::Ghn);
        assert_eq!(
            "ViettelPost".parse::<ProviderCode>().unwrap(),
            ProviderCode::ViettelPost
        );
        assert_eq!(
            "IN_HOUSE".parse::<ProviderCode>().unwrap(),
            ProviderCode::InHouse
        );
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert!("dhl".parse::<ProviderCode>().is_err());
    }

    #[test]
    fn serde_lowercase_token() {
        let json = serde_json::to_string(&ProviderCode::ViettelPost).unwrap();
        assert_eq!(json, "\"viettelpost\"");
    }

    #[test]
    fn round_trip_all_codes() {
        for code in ProviderCode::ALL {
            assert_eq!(code.as_str().parse::<ProviderCode>().unwrap(), code);
        }
    }
}
