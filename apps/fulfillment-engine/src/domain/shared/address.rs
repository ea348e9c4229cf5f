//! Addresses, contacts, and geography.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Administrative region of Vietnam used for routing between hubs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// Northern provinces (Hà Nội hub).
    North,
    /// Central provinces (Đà Nẵng hub).
    Central,
    /// Southern provinces (TP. Hồ Chí Minh hub).
    South,
}

impl Region {
    /// Parse a region from a string, case-insensitively.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "north" => Some(Self::North),
            "central" => Some(Self::Central),
            "south" => Some(Self::South),
            _ => None,
        }
    }

    /// Get the region name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::North => "north",
            Self::Central => "central",
            Self::South => "south",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A WGS-84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl GeoPoint {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance to another point in kilometers (haversine).
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;

        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

/// A postal address with the administrative fields fee quoting keys on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// Street address line.
    pub line: String,
    /// Ward name, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ward: Option<String>,
    /// District name.
    pub district: String,
    /// City or province name.
    pub city: String,
    /// Region, when resolvable from the city.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    /// Coordinate, when geocoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

impl Address {
    /// `city-district` key segment used by the fee cache.
    #[must_use]
    pub fn city_district_key(&self) -> String {
        format!("{}-{}", self.city, self.district)
    }
}

/// The person at one end of a shipment leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Full name.
    pub name: String,
    /// Phone number.
    pub phone: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hanoi() -> GeoPoint {
        GeoPoint::new(21.0278, 105.8342)
    }

    fn saigon() -> GeoPoint {
        GeoPoint::new(10.8231, 106.6297)
    }

    #[test]
    fn region_parse_case_insensitive() {
        assert_eq!(Region::from_str_case_insensitive("NORTH"), Some(Region::North));
        assert_eq!(Region::from_str_case_insensitive("south"), Some(Region::South));
        assert_eq!(Region::from_str_case_insensitive("west"), None);
    }

    #[test]
    fn haversine_hanoi_to_saigon() {
        let d = hanoi().distance_km(&saigon());
        // Roughly 1140 km as the crow flies.
        assert!((1100.0..1200.0).contains(&d), "unexpected distance {d}");
    }

    #[test]
    fn haversine_zero_for_same_point() {
        let d = hanoi().distance_km(&hanoi());
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn city_district_key_format() {
        let addr = Address {
            line: "12 Lê Lợi".to_string(),
            ward: None,
            district: "Quận 1".to_string(),
            city: "Hồ Chí Minh".to_string(),
            region: Some(Region::South),
            location: None,
        };
        assert_eq!(addr.city_district_key(), "Hồ Chí Minh-Quận 1");
    }
}
