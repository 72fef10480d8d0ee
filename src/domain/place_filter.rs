//! Turns raw provider results into catalog candidates
//!
//! The provider is nationwide, so every result is checked against the target
//! city (address text) and the city's bounding box (coordinates) before it can
//! reach the catalog.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::geo::{GeoBounds, GeoPoint, parse_scaled_point};
use crate::domain::identity::{IdentityKey, district_from, strip_markup};
use crate::domain::search::RawPlace;

/// Where the catalog is allowed to grow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionPolicy {
    /// Prefix / substring that marks an address as inside the city (`서울`)
    pub city_marker: String,
    pub bounds: GeoBounds,
    /// Divisor turning provider integers into degrees
    pub coordinate_scale: f64,
}

impl Default for RegionPolicy {
    fn default() -> Self {
        Self {
            city_marker: "서울".to_string(),
            bounds: GeoBounds::SEOUL,
            coordinate_scale: 10_000_000.0,
        }
    }
}

/// A result that passed every filter
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceCandidate {
    pub name: String,
    pub address: String,
    pub district: String,
    pub position: GeoPoint,
}

impl PlaceCandidate {
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::new(&self.name, &self.address, Some(self.position))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RejectReason {
    MissingAddress,
    OutsideCity,
    InvalidCoordinates,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::MissingAddress => "missing_address",
            Self::OutsideCity => "outside_city",
            Self::InvalidCoordinates => "invalid_coordinates",
        };
        f.write_str(label)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl RegionPolicy {
    pub fn is_city_address(&self, address: &str) -> bool {
        address.starts_with(&self.city_marker) || address.contains(&self.city_marker)
    }

    pub fn qualify(&self, raw: &RawPlace) -> Result<PlaceCandidate, RejectReason> {
        let name = strip_markup(&raw.title);

        let address = non_empty(raw.road_address.as_deref())
            .or_else(|| non_empty(raw.address.as_deref()))
            .ok_or(RejectReason::MissingAddress)?;

        if !self.is_city_address(address) {
            return Err(RejectReason::OutsideCity);
        }

        let position = parse_scaled_point(
            raw.mapx.as_ref(),
            raw.mapy.as_ref(),
            self.coordinate_scale,
            &self.bounds,
        )
        .ok_or(RejectReason::InvalidCoordinates)?;

        Ok(PlaceCandidate {
            name,
            address: address.to_string(),
            district: district_from(address, &self.city_marker),
            position,
        })
    }
}
