//! Store entity and its persisted record form
//!
//! `Store` is the in-memory entity the catalog mutates. `StoreRecord` is the
//! shape written to `stores.json` for the map front-end, including the legacy
//! single `category` field which is always derived from `categories`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::geo::GeoPoint;
use crate::domain::identity::IdentityKey;

/// Stock status shown on the map marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    #[default]
    Available,
    Soldout,
    Check,
}

impl StockStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Soldout => "soldout",
            Self::Check => "check",
        }
    }
}

/// Display fields assigned once when a store is first created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreDefaults {
    pub status: StockStatus,
    pub price: u32,
    pub rating: f64,
}

impl Default for StoreDefaults {
    fn default() -> Self {
        Self {
            status: StockStatus::Available,
            price: 5500,
            rating: 4.6,
        }
    }
}

/// Ordered, duplicate-free list of category labels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySet(Vec<String>);

impl CategorySet {
    pub fn single(category: &str) -> Self {
        Self(vec![category.to_string()])
    }

    /// Append `category` unless already present. Returns whether it was added.
    pub fn insert(&mut self, category: &str) -> bool {
        if self.contains(category) {
            return false;
        }
        self.0.push(category.to_string());
        true
    }

    pub fn contains(&self, category: &str) -> bool {
        self.0.iter().any(|c| c == category)
    }

    /// First label, exposed as the legacy `category` field
    pub fn primary(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

impl FromIterator<String> for CategorySet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = Self::default();
        for category in iter {
            set.insert(&category);
        }
        set
    }
}

/// One dessert shop in the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "StoreRecord")]
pub struct Store {
    pub id: u64,
    pub name: String,
    pub address: String,
    pub district: String,
    pub position: Option<GeoPoint>,
    pub categories: CategorySet,
    pub status: String,
    pub price: Value,
    pub rating: Value,
    pub distance: String,
    pub instagram_handle: String,
    /// Fields written by other tools that this collector does not interpret
    pub extra: Map<String, Value>,
}

impl Store {
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::new(&self.name, &self.address, self.position)
    }

    /// Legacy single-category view kept for the front-end
    pub fn category(&self) -> &str {
        self.categories.primary().unwrap_or_default()
    }

    /// Rebuild an entity from a persisted record, using `fallback_id` when the record has none.
    pub fn from_record(record: StoreRecord, fallback_id: u64) -> Self {
        let categories = match record.categories {
            Some(list) => list.into_iter().collect(),
            None => record
                .category
                .filter(|c| !c.is_empty())
                .map(|c| CategorySet::single(&c))
                .unwrap_or_default(),
        };
        let position = match (record.lat, record.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        };

        Self {
            id: record.id.unwrap_or(fallback_id),
            name: record.name,
            address: record.address,
            district: record.district,
            position,
            categories,
            status: record.status,
            price: record.price,
            rating: record.rating,
            distance: record.distance,
            instagram_handle: record.instagram_handle,
            extra: record.extra,
        }
    }
}

fn default_status() -> String {
    StockStatus::default().as_str().to_string()
}

/// Field decoders for catalogs written by other tools.
///
/// A `null` or oddly typed field must not make the whole record unreadable.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Strings as-is, numbers in their JSON form, anything else `""`
    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => text,
            Value::Number(number) => number.to_string(),
            _ => String::new(),
        })
    }

    pub fn status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let status = string(deserializer)?;
        Ok(if status.is_empty() { super::default_status() } else { status })
    }

    /// Only non-negative JSON integers count as ids.
    pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(number) => number.as_u64(),
            _ => None,
        })
    }

    pub fn coordinate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(number) => number.as_f64(),
            _ => None,
        })
    }

    pub fn label<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => Some(text),
            _ => None,
        })
    }

    /// A list keeps its string entries; a non-list counts as missing.
    pub fn labels<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<String>>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(text) => Some(text),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        })
    }
}

/// Serialized form of a [`Store`] (one element of `stores.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    /// `None` when absent or not a non-negative integer
    #[serde(default, deserialize_with = "lenient::id", skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub district: String,
    #[serde(default, deserialize_with = "lenient::coordinate", skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient::coordinate", skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(default, deserialize_with = "lenient::labels", skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::label", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default = "default_status", deserialize_with = "lenient::status")]
    pub status: String,
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub rating: Value,
    #[serde(default, deserialize_with = "lenient::string")]
    pub distance: String,
    #[serde(rename = "instagramHandle", default, deserialize_with = "lenient::string")]
    pub instagram_handle: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Store> for StoreRecord {
    fn from(store: Store) -> Self {
        let category = store.category().to_string();
        Self {
            id: Some(store.id),
            name: store.name,
            address: store.address,
            district: store.district,
            lat: store.position.map(|p| p.lat),
            lng: store.position.map(|p| p.lng),
            categories: Some(store.categories.to_vec()),
            category: Some(category),
            status: store.status,
            price: store.price,
            rating: store.rating,
            distance: store.distance,
            instagram_handle: store.instagram_handle,
            extra: store.extra,
        }
    }
}
