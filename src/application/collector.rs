//! Collector/Merger - walks the search space and folds results into the catalog
//!
//! Traversal is strictly sequential: districts → categories → keywords → result
//! pages. Each page is requested, fully processed, and followed by a fixed
//! pause before the next request. The run ends early through an explicit
//! [`StopReason`] signal once the daily target or the total hard cap is hit.

use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::application::collection_plan::{CategoryPlan, Pacing, SearchPlan, StopReason};
use crate::domain::catalog::{MergeOutcome, StoreCatalog};
use crate::domain::place_filter::RegionPolicy;
use crate::domain::search::{LocalSearchProvider, RawPlace, SearchRequest};

/// Summary of one collection run
#[derive(Debug, Clone, Serialize)]
pub struct CollectionReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub pages_requested: usize,
    pub failed_requests: usize,
    pub items_seen: usize,
    /// Filtered results by reason (`outside_city`, `invalid_coordinates`, ...)
    pub rejected: BTreeMap<String, usize>,
    pub created: usize,
    pub categories_added: usize,
    pub already_tagged: usize,
    pub quota_skips: usize,
    pub skipped_categories: usize,
    pub stop_reason: Option<StopReason>,
    pub total_stores: usize,
    pub category_counts: BTreeMap<String, usize>,
}

impl CollectionReport {
    fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            pages_requested: 0,
            failed_requests: 0,
            items_seen: 0,
            rejected: BTreeMap::new(),
            created: 0,
            categories_added: 0,
            already_tagged: 0,
            quota_skips: 0,
            skipped_categories: 0,
            stop_reason: None,
            total_stores: 0,
            category_counts: BTreeMap::new(),
        }
    }

    fn finish(mut self, catalog: &StoreCatalog) -> Self {
        self.finished_at = Some(Utc::now());
        self.total_stores = catalog.len();
        self.category_counts = catalog.category_counts();
        self
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

pub struct StoreCollector {
    provider: Arc<dyn LocalSearchProvider>,
    plan: SearchPlan,
    region: RegionPolicy,
    pacing: Pacing,
}

impl StoreCollector {
    pub fn new(
        provider: Arc<dyn LocalSearchProvider>,
        plan: SearchPlan,
        region: RegionPolicy,
        pacing: Pacing,
    ) -> Self {
        Self {
            provider,
            plan,
            region,
            pacing,
        }
    }

    pub fn plan(&self) -> &SearchPlan {
        &self.plan
    }

    /// Walk the whole search space (or until a stop condition) merging into `catalog`.
    pub async fn collect(&self, catalog: &mut StoreCatalog) -> CollectionReport {
        let mut report = CollectionReport::start();

        if let ControlFlow::Break(reason) = self.walk_districts(catalog, &mut report).await {
            info!("🛑 Collection stopped: {}", reason);
            report.stop_reason = Some(reason);
        }

        report.finish(catalog)
    }

    /// Run-wide stop conditions, checked before every request and every merge.
    fn run_budget(&self, catalog: &StoreCatalog) -> ControlFlow<StopReason> {
        if catalog.created_this_run() >= self.plan.daily_target {
            return ControlFlow::Break(StopReason::DailyTargetReached);
        }
        if catalog.len() >= self.plan.total_hard_cap {
            return ControlFlow::Break(StopReason::TotalCapReached);
        }
        ControlFlow::Continue(())
    }

    async fn walk_districts(
        &self,
        catalog: &mut StoreCatalog,
        report: &mut CollectionReport,
    ) -> ControlFlow<StopReason> {
        for district in &self.plan.districts {
            for category in &self.plan.categories {
                if let ControlFlow::Break(reason) = self.run_budget(catalog) {
                    return ControlFlow::Break(reason);
                }
                if !catalog.can_take_category(&category.name) {
                    info!(
                        "⏭️ Category '{}' is full ({}/{}), skipping in {}",
                        category.name,
                        catalog.category_count(&category.name),
                        category.limit,
                        district
                    );
                    report.skipped_categories += 1;
                    continue;
                }
                if let ControlFlow::Break(reason) =
                    self.walk_keywords(district, category, catalog, report).await
                {
                    return ControlFlow::Break(reason);
                }
            }
        }
        ControlFlow::Continue(())
    }

    async fn walk_keywords(
        &self,
        district: &str,
        category: &CategoryPlan,
        catalog: &mut StoreCatalog,
        report: &mut CollectionReport,
    ) -> ControlFlow<StopReason> {
        for keyword in category.keywords() {
            let query = self.plan.compose_query(district, keyword);

            for start in self.plan.pages.starts() {
                if let ControlFlow::Break(reason) = self.run_budget(catalog) {
                    return ControlFlow::Break(reason);
                }
                if !catalog.can_take_category(&category.name) {
                    debug!("Category '{}' filled up while paging '{}'", category.name, query);
                    return ControlFlow::Continue(());
                }

                let request = SearchRequest {
                    query: query.clone(),
                    start,
                    display: self.plan.pages.display,
                    sort: self.plan.sort,
                };

                report.pages_requested += 1;
                let items = match self.provider.search(&request).await {
                    Ok(items) => items,
                    Err(e) => {
                        warn!("⚠️ search error [{}] start={}: {}", query, start, e);
                        report.failed_requests += 1;
                        sleep(self.pacing.error_delay()).await;
                        continue;
                    }
                };
                info!("[{}] start={} items={}", query, start, items.len());

                let exhausted = items.is_empty();
                let flow = self.absorb_page(items, &category.name, catalog, report);
                sleep(self.pacing.page_delay()).await;

                if flow.is_break() {
                    return flow;
                }
                if exhausted {
                    debug!("No more results for '{}' after start={}", query, start);
                    break;
                }
            }
        }
        ControlFlow::Continue(())
    }

    fn absorb_page(
        &self,
        items: Vec<RawPlace>,
        category: &str,
        catalog: &mut StoreCatalog,
        report: &mut CollectionReport,
    ) -> ControlFlow<StopReason> {
        for raw in items {
            if let ControlFlow::Break(reason) = self.run_budget(catalog) {
                return ControlFlow::Break(reason);
            }
            report.items_seen += 1;

            let candidate = match self.region.qualify(&raw) {
                Ok(candidate) => candidate,
                Err(reason) => {
                    debug!("filtered '{}': {}", raw.title, reason);
                    *report.rejected.entry(reason.to_string()).or_insert(0) += 1;
                    continue;
                }
            };

            let name = candidate.name.clone();
            let address = candidate.address.clone();
            match catalog.merge(candidate, category) {
                MergeOutcome::Created { id } => {
                    report.created += 1;
                    info!(
                        "✅ NEW ADD {}/{}: #{} {} | {}",
                        catalog.created_this_run(),
                        self.plan.daily_target,
                        id,
                        name,
                        address
                    );
                }
                MergeOutcome::CategoryAdded { id } => {
                    report.categories_added += 1;
                    info!("➕ category added: {} -> #{} {}", category, id, name);
                }
                MergeOutcome::AlreadyTagged { .. } => report.already_tagged += 1,
                MergeOutcome::QuotaExhausted => report.quota_skips += 1,
            }
        }
        ControlFlow::Continue(())
    }
}
