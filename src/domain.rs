//! Domain module - Core collection logic and entities
//!
//! This module contains the store entity, the identity/dedup model, the
//! service-area filter and the accumulating catalog, plus the ports the
//! application layer talks to (search provider, store repository).

pub mod catalog;
pub mod geo;
pub mod identity;
pub mod place_filter;
pub mod repositories;
pub mod search;
pub mod store;

// Re-export commonly used items for convenience
pub use catalog::{CategoryQuota, MAX_STORE_ID, MergeOutcome, StoreCatalog};
pub use geo::{GeoBounds, GeoPoint};
pub use identity::IdentityKey;
pub use place_filter::{PlaceCandidate, RegionPolicy, RejectReason};
pub use repositories::StoreRepository;
pub use search::{LocalSearchProvider, RawPlace, SearchError, SearchRequest, SortMode};
pub use store::{CategorySet, StockStatus, Store, StoreDefaults, StoreRecord};
