//! Coordinates and the service-area bounding box

use serde::{Deserialize, Serialize};

use crate::domain::identity::round_to;

/// Decimals kept for persisted coordinates
pub const STORED_COORDINATE_DECIMALS: i32 = 6;

/// WGS84 point in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Inclusive latitude/longitude rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl GeoBounds {
    /// Approximate extents of Seoul
    pub const SEOUL: Self = Self {
        min_lat: 37.3,
        max_lat: 37.8,
        min_lng: 126.7,
        max_lng: 127.3,
    };

    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lng..=self.max_lng).contains(&point.lng)
    }

    pub fn is_well_formed(&self) -> bool {
        self.min_lat < self.max_lat && self.min_lng < self.max_lng
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::SEOUL
    }
}

/// Provider-scaled integer coordinate (`mapx`/`mapy`), sent either as a JSON string or number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScaledCoordinate {
    Text(String),
    Number(f64),
}

impl ScaledCoordinate {
    fn to_degrees(&self, scale: f64) -> Option<f64> {
        let raw = match self {
            Self::Text(text) => text.trim().parse::<f64>().ok()?,
            Self::Number(value) => *value,
        };
        let degrees = raw / scale;
        degrees.is_finite().then_some(degrees)
    }
}

/// Convert `mapx` (longitude) / `mapy` (latitude) into a point inside `bounds`.
///
/// `None` when either value is missing, unparseable or lands outside the box.
pub fn parse_scaled_point(
    mapx: Option<&ScaledCoordinate>,
    mapy: Option<&ScaledCoordinate>,
    scale: f64,
    bounds: &GeoBounds,
) -> Option<GeoPoint> {
    let lng = mapx?.to_degrees(scale)?;
    let lat = mapy?.to_degrees(scale)?;
    let point = GeoPoint { lat, lng };
    if !bounds.contains(point) {
        return None;
    }
    Some(GeoPoint {
        lat: round_to(lat, STORED_COORDINATE_DECIMALS),
        lng: round_to(lng, STORED_COORDINATE_DECIMALS),
    })
}
