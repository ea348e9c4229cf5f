//! Post offices and regional hubs.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{GeoPoint, PostOfficeId, Region};

/// Kind of post office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfficeType {
    /// Neighbourhood office with a shipper roster.
    Local,
    /// Regional hub used as a transit point between regions.
    Regional,
}

/// A post office in the in-house delivery network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostOffice {
    /// Unique id.
    pub id: PostOfficeId,
    /// Unique human-facing code (e.g. `HN-01`).
    pub code: String,
    /// Local office or regional hub.
    pub office_type: OfficeType,
    /// City or province.
    pub city: String,
    /// District.
    pub district: String,
    /// Administrative region.
    pub region: Region,
    /// Coordinate for nearest-office resolution.
    pub location: GeoPoint,
    /// Parent office; local offices point at their regional hub.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<PostOfficeId>,
}

impl PostOffice {
    /// Whether this office is a regional hub.
    #[must_use]
    pub const fn is_hub(&self) -> bool {
        matches!(self.office_type, OfficeType::Regional)
    }
}
