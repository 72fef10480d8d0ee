//! 누적 매장 카탈로그 (dedup + 카테고리 쿼터)
//!
//! `StoreCatalog` is the single accumulator of a collection run: identity key
//! to store, running per-category counts, the next id to hand out and the
//! number of stores created during this run. It is built from the previously
//! persisted records and passed by `&mut` through the traversal.

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::identity::IdentityKey;
use crate::domain::place_filter::PlaceCandidate;
use crate::domain::store::{CategorySet, Store, StoreDefaults, StoreRecord};

/// Largest id the map front-end (JavaScript numbers) represents exactly
pub const MAX_STORE_ID: u64 = (1 << 53) - 1;

/// Per-category ceilings. Unknown categories have a limit of zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryQuota {
    limits: HashMap<String, usize>,
}

impl CategoryQuota {
    pub fn new<I, S>(limits: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        Self {
            limits: limits.into_iter().map(|(c, l)| (c.into(), l)).collect(),
        }
    }

    pub fn limit(&self, category: &str) -> usize {
        self.limits.get(category).copied().unwrap_or(0)
    }
}

/// What a single merge did to the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// New store registered (counts toward the daily target)
    Created { id: u64 },
    /// Known store gained the category
    CategoryAdded { id: u64 },
    /// Known store already carries the category
    AlreadyTagged { id: u64 },
    /// Category is full; nothing changed
    QuotaExhausted,
}

#[derive(Debug, Clone)]
pub struct StoreCatalog {
    stores: HashMap<IdentityKey, Store>,
    category_counts: HashMap<String, usize>,
    quota: CategoryQuota,
    defaults: StoreDefaults,
    next_id: u64,
    created_this_run: usize,
}

impl StoreCatalog {
    pub fn new(quota: CategoryQuota, defaults: StoreDefaults) -> Self {
        Self {
            stores: HashMap::new(),
            category_counts: HashMap::new(),
            quota,
            defaults,
            next_id: 1,
            created_this_run: 0,
        }
    }

    /// Rebuild the accumulator from a previously persisted catalog.
    ///
    /// Records without an id get fresh ids above the loaded maximum. Records
    /// sharing an identity key collapse into the lowest id, keeping the union
    /// of their categories. Ids above [`MAX_STORE_ID`]
    /// are treated like missing ones.
    pub fn from_records(mut records: Vec<StoreRecord>, quota: CategoryQuota, defaults: StoreDefaults) -> Self {
        for record in &mut records {
            if let Some(id) = record.id.filter(|id| *id > MAX_STORE_ID) {
                warn!("⚠️ Store id {} is out of range, assigning a new one: {}", id, record.name);
                record.id = None;
            }
        }

        let max_id = records.iter().filter_map(|r| r.id).max().unwrap_or(0);
        let mut next_id = max_id.saturating_add(1);
        let mut catalog = Self::new(quota, defaults);

        for record in records {
            let fallback_id = next_id;
            if record.id.is_none() {
                next_id = next_id.saturating_add(1);
            }
            let store = Store::from_record(record, fallback_id);
            if store.categories.is_empty() {
                debug!("Loaded store #{} has no categories: {}", store.id, store.name);
            }
            catalog.register_loaded(store);
        }

        catalog.next_id = next_id;
        catalog.category_counts = count_categories(catalog.stores.values());
        catalog
    }

    fn register_loaded(&mut self, store: Store) {
        let key = store.identity_key();
        match self.stores.remove(&key) {
            None => {
                self.stores.insert(key, store);
            }
            Some(existing) => {
                warn!(
                    "🔁 Duplicate store in catalog (ids {} and {}), merging: {}",
                    existing.id, store.id, key
                );
                let (mut keep, other) = if existing.id <= store.id {
                    (existing, store)
                } else {
                    (store, existing)
                };
                for category in other.categories.iter() {
                    keep.categories.insert(category);
                }
                self.stores.insert(key, keep);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Stores created since this catalog was loaded
    pub fn created_this_run(&self) -> usize {
        self.created_this_run
    }

    pub fn category_count(&self, category: &str) -> usize {
        self.category_counts.get(category).copied().unwrap_or(0)
    }

    /// Sorted snapshot of the running counts, for logging and reports
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        self.category_counts
            .iter()
            .map(|(c, n)| (c.clone(), *n))
            .collect()
    }

    pub fn can_take_category(&self, category: &str) -> bool {
        self.category_count(category) < self.quota.limit(category)
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&Store> {
        self.stores.get(key)
    }

    /// Fold one qualified search result into the catalog under `category`.
    pub fn merge(&mut self, candidate: PlaceCandidate, category: &str) -> MergeOutcome {
        let key = candidate.identity_key();
        let has_quota = self.can_take_category(category);

        if let Some(store) = self.stores.get_mut(&key) {
            if store.categories.contains(category) {
                return MergeOutcome::AlreadyTagged { id: store.id };
            }
            if !has_quota {
                return MergeOutcome::QuotaExhausted;
            }
            store.categories.insert(category);
            *self.category_counts.entry(category.to_string()).or_insert(0) += 1;
            debug!("➕ category added: {} -> {}", category, store.name);
            return MergeOutcome::CategoryAdded { id: store.id };
        }

        if !has_quota {
            return MergeOutcome::QuotaExhausted;
        }

        let id = self.next_id;
        let store = Store {
            id,
            name: candidate.name,
            address: candidate.address,
            district: candidate.district,
            position: Some(candidate.position),
            categories: CategorySet::single(category),
            status: self.defaults.status.as_str().to_string(),
            price: Value::from(self.defaults.price),
            rating: Value::from(self.defaults.rating),
            distance: String::new(),
            instagram_handle: String::new(),
            extra: Map::new(),
        };
        self.stores.insert(key, store);
        self.next_id = self.next_id.saturating_add(1);
        self.created_this_run += 1;
        *self.category_counts.entry(category.to_string()).or_insert(0) += 1;

        MergeOutcome::Created { id }
    }

    /// Every store ordered by ascending id, ready to persist
    pub fn sorted_stores(&self) -> Vec<Store> {
        let mut stores: Vec<Store> = self.stores.values().cloned().collect();
        stores.sort_by_key(|s| s.id);
        stores
    }

    pub fn into_sorted_stores(self) -> Vec<Store> {
        let mut stores: Vec<Store> = self.stores.into_values().collect();
        stores.sort_by_key(|s| s.id);
        stores
    }
}

fn count_categories<'a>(stores: impl Iterator<Item = &'a Store>) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for store in stores {
        for category in store.categories.iter() {
            *counts.entry(category.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geo::GeoPoint;
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn quota(limit: usize) -> CategoryQuota {
        CategoryQuota::new([("dubai", limit), ("cake", limit), ("goguma", limit)])
    }

    fn candidate(name: &str, lat: f64) -> PlaceCandidate {
        PlaceCandidate {
            name: name.to_string(),
            address: format!("서울 강남구 {name}로 1"),
            district: "강남구".to_string(),
            position: GeoPoint { lat, lng: 127.03 },
        }
    }

    fn record(value: serde_json::Value) -> StoreRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn creates_store_with_next_id_and_defaults() {
        let mut catalog = StoreCatalog::new(quota(10), StoreDefaults::default());
        let outcome = catalog.merge(candidate("가게", 37.5), "dubai");
        assert_eq!(outcome, MergeOutcome::Created { id: 1 });

        let store = catalog.get(&candidate("가게", 37.5).identity_key()).unwrap();
        assert_eq!(store.category(), "dubai");
        assert_eq!(store.status, "available");
        assert_eq!(store.price, json!(5500));
        assert_eq!(catalog.created_this_run(), 1);
        assert_eq!(catalog.next_id(), 2);
    }

    #[test]
    fn rediscovery_adds_category_without_counting_as_new() {
        let mut catalog = StoreCatalog::new(quota(10), StoreDefaults::default());
        catalog.merge(candidate("가게", 37.5), "dubai");
        let outcome = catalog.merge(candidate("가게", 37.5), "cake");

        assert_eq!(outcome, MergeOutcome::CategoryAdded { id: 1 });
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.created_this_run(), 1);
        assert_eq!(catalog.category_count("cake"), 1);

        let again = catalog.merge(candidate("가게", 37.5), "cake");
        assert_eq!(again, MergeOutcome::AlreadyTagged { id: 1 });
        assert_eq!(catalog.category_count("cake"), 1);
    }

    #[test]
    fn full_category_blocks_creation_and_tagging() {
        let mut catalog = StoreCatalog::new(quota(1), StoreDefaults::default());
        assert!(matches!(catalog.merge(candidate("a", 37.5), "dubai"), MergeOutcome::Created { .. }));
        assert!(matches!(catalog.merge(candidate("b", 37.6), "cake"), MergeOutcome::Created { .. }));

        assert_eq!(catalog.merge(candidate("c", 37.55), "dubai"), MergeOutcome::QuotaExhausted);
        assert_eq!(catalog.merge(candidate("b", 37.6), "dubai"), MergeOutcome::QuotaExhausted);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.next_id(), 3);
    }

    #[test]
    fn unknown_category_has_no_quota() {
        let mut catalog = StoreCatalog::new(quota(5), StoreDefaults::default());
        assert!(!catalog.can_take_category("macaron"));
        assert_eq!(catalog.merge(candidate("a", 37.5), "macaron"), MergeOutcome::QuotaExhausted);
    }

    #[test]
    fn loading_seeds_counters_and_keeps_ids() {
        let records = vec![
            record(json!({"id": 4, "name": "a", "address": "서울 강남구 a로 1", "lat": 37.5, "lng": 127.03, "categories": ["dubai", "cake"], "category": "dubai"})),
            record(json!({"id": 9, "name": "b", "address": "서울 강남구 b로 1", "lat": 37.6, "lng": 127.03, "category": "cake"})),
        ];
        let mut catalog = StoreCatalog::from_records(records, quota(10), StoreDefaults::default());

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.next_id(), 10);
        assert_eq!(catalog.category_count("cake"), 2);
        assert_eq!(catalog.category_count("dubai"), 1);
        assert_eq!(catalog.created_this_run(), 0);

        // same place found again through search keeps its id
        assert_eq!(catalog.merge(candidate("a", 37.5), "goguma"), MergeOutcome::CategoryAdded { id: 4 });
        assert_eq!(catalog.merge(candidate("z", 37.7), "goguma"), MergeOutcome::Created { id: 10 });
    }

    #[test]
    fn loading_assigns_ids_to_records_without_one() {
        let records = vec![
            record(json!({"name": "a", "address": "서울 a"})),
            record(json!({"id": 2, "name": "b", "address": "서울 b"})),
            record(json!({"name": "c", "address": "서울 c"})),
        ];
        let catalog = StoreCatalog::from_records(records, quota(10), StoreDefaults::default());
        let ids: Vec<u64> = catalog.sorted_stores().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
        assert_eq!(catalog.next_id(), 5);
    }

    #[test]
    fn loading_collapses_duplicate_keys_into_lowest_id() {
        let records = vec![
            record(json!({"id": 8, "name": "가게", "address": "서울 강남구", "lat": 37.5, "lng": 127.0, "categories": ["cake"]})),
            record(json!({"id": 3, "name": "가게 ", "address": "서울  강남구", "lat": 37.5, "lng": 127.0, "categories": ["dubai"]})),
        ];
        let catalog = StoreCatalog::from_records(records, quota(10), StoreDefaults::default());
        let stores = catalog.sorted_stores();
        assert_eq!(stores.len(), 1);
        assert_eq!(stores[0].id, 3);
        assert_eq!(stores[0].categories.to_vec(), vec!["dubai", "cake"]);
        assert_eq!(catalog.category_count("cake"), 1);
        assert_eq!(catalog.next_id(), 9);
    }

    #[test]
    fn out_of_range_id_gets_a_fresh_one() {
        let records = vec![
            record(json!({"id": u64::MAX, "name": "a", "address": "서울 a"})),
            record(json!({"id": 5, "name": "b", "address": "서울 b"})),
        ];
        let mut catalog = StoreCatalog::from_records(records, quota(10), StoreDefaults::default());
        let ids: Vec<u64> = catalog.sorted_stores().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![5, 6]);
        assert_eq!(catalog.merge(candidate("new", 37.5), "cake"), MergeOutcome::Created { id: 7 });
    }

    #[test]
    fn largest_representable_id_still_leaves_room() {
        let records = vec![record(json!({"id": MAX_STORE_ID, "name": "a", "address": "서울 a"}))];
        let catalog = StoreCatalog::from_records(records, quota(10), StoreDefaults::default());
        assert_eq!(catalog.next_id(), MAX_STORE_ID + 1);
    }

    #[test]
    fn over_limit_history_is_not_trimmed() {
        let records = (1..=3u64)
            .map(|i| record(json!({"id": i, "name": format!("s{i}"), "address": "서울", "category": "dubai"})))
            .collect();
        let mut catalog = StoreCatalog::from_records(records, quota(2), StoreDefaults::default());
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.category_count("dubai"), 3);
        assert_eq!(catalog.merge(candidate("new", 37.5), "dubai"), MergeOutcome::QuotaExhausted);
    }

    #[test]
    fn sorted_output_is_ordered_by_id() {
        let mut catalog = StoreCatalog::new(quota(10), StoreDefaults::default());
        for (i, name) in ["c", "a", "b"].iter().enumerate() {
            catalog.merge(candidate(name, 37.4 + i as f64 / 10.0), "cake");
        }
        let ids: Vec<u64> = catalog.into_sorted_stores().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    proptest! {
        #[test]
        fn quota_and_identity_invariants_hold(
            events in prop::collection::vec((0usize..12, 0usize..3), 0..120),
            limit in 0usize..6,
        ) {
            let categories = ["dubai", "cake", "goguma"];
            let mut catalog = StoreCatalog::new(quota(limit), StoreDefaults::default());
            let mut last_created = 0u64;

            for (place, category) in events {
                let outcome = catalog.merge(
                    candidate(&format!("place{place}"), 37.4 + place as f64 / 100.0),
                    categories[category],
                );
                if let MergeOutcome::Created { id } = outcome {
                    prop_assert!(id > last_created);
                    last_created = id;
                }
            }

            let stores = catalog.sorted_stores();
            let keys: HashSet<_> = stores.iter().map(Store::identity_key).collect();
            prop_assert_eq!(keys.len(), stores.len());

            for category in categories {
                let carried = stores.iter().filter(|s| s.categories.contains(category)).count();
                prop_assert!(carried <= limit);
                prop_assert_eq!(carried, catalog.category_count(category));
            }
            for store in &stores {
                prop_assert_eq!(Some(store.category()), store.categories.primary());
            }
        }
    }
}
