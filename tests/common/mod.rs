//! Shared fixtures: a scripted search provider and a small search plan
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use dessert_map_collector::application::{CategoryPlan, PageWindow, SearchPlan};
use dessert_map_collector::domain::geo::ScaledCoordinate;
use dessert_map_collector::domain::{LocalSearchProvider, RawPlace, SearchError, SearchRequest, SortMode};

pub const DUBAI_QUERY: &str = "서울 강남구 두쫀쿠";
pub const CAKE_QUERY: &str = "서울 강남구 케이크";

/// Answers from a fixed script; unscripted pages come back empty.
#[derive(Default)]
pub struct ScriptedProvider {
    pages: HashMap<(String, u32), Vec<RawPlace>>,
    failures: HashSet<(String, u32)>,
    requests: Mutex<Vec<SearchRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, query: &str, start: u32, items: Vec<RawPlace>) -> Self {
        self.pages.insert((query.to_string(), start), items);
        self
    }

    pub fn failing(mut self, query: &str, start: u32) -> Self {
        self.failures.insert((query.to_string(), start));
        self
    }

    pub fn requests(&self) -> Vec<(String, u32)> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| (r.query.clone(), r.start))
            .collect()
    }
}

#[async_trait]
impl LocalSearchProvider for ScriptedProvider {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawPlace>, SearchError> {
        self.requests.lock().unwrap().push(request.clone());
        let key = (request.query.clone(), request.start);
        if self.failures.contains(&key) {
            return Err(SearchError::Status {
                status: 500,
                body: "scripted failure".to_string(),
            });
        }
        Ok(self.pages.get(&key).cloned().unwrap_or_default())
    }
}

/// Raw result with provider-scaled coordinates
pub fn place(title: &str, road_address: &str, mapx: &str, mapy: &str) -> RawPlace {
    RawPlace {
        title: title.to_string(),
        road_address: Some(road_address.to_string()),
        address: None,
        mapx: Some(ScaledCoordinate::Text(mapx.to_string())),
        mapy: Some(ScaledCoordinate::Text(mapy.to_string())),
    }
}

/// `n`-th distinct shop in 강남구, latitude 37.4 + n/1000
pub fn gangnam_shop(n: u32) -> RawPlace {
    place(
        &format!("<b>디저트</b> 가게 {n}"),
        &format!("서울특별시 강남구 테헤란로 {n}"),
        "1270300000",
        &(374_000_000 + n * 10_000).to_string(),
    )
}

/// One district, two categories (`dubai`, `cake`), starts 1, 6 and 11.
pub fn plan(daily_target: usize, total_hard_cap: usize, dubai_limit: usize, cake_limit: usize) -> SearchPlan {
    SearchPlan {
        city: "서울".to_string(),
        districts: vec!["강남구".to_string()],
        categories: vec![
            CategoryPlan::new("dubai", &["두쫀쿠"], dubai_limit),
            CategoryPlan::new("cake", &["케이크"], cake_limit),
        ],
        daily_target,
        total_hard_cap,
        pages: PageWindow {
            first_start: 1,
            last_start: 11,
            stride: 5,
            display: 5,
        },
        sort: SortMode::Similarity,
    }
}
