//! Application use cases for the dessert-shop catalog
//!
//! `CollectStoresUseCase` is the whole run: load the persisted catalog, rebuild
//! the accumulator, walk the search space, then overwrite the catalog once.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::application::collector::{CollectionReport, StoreCollector};
use crate::domain::catalog::StoreCatalog;
use crate::domain::repositories::StoreRepository;
use crate::domain::store::StoreDefaults;

pub struct CollectStoresUseCase {
    store_repo: Arc<dyn StoreRepository>,
    collector: StoreCollector,
    defaults: StoreDefaults,
}

impl CollectStoresUseCase {
    pub fn new(
        store_repo: Arc<dyn StoreRepository>,
        collector: StoreCollector,
        defaults: StoreDefaults,
    ) -> Self {
        Self {
            store_repo,
            collector,
            defaults,
        }
    }

    /// Load, collect and (unless `dry_run`) persist.
    pub async fn execute(&self, dry_run: bool) -> Result<CollectionReport> {
        let records = self
            .store_repo
            .load_all()
            .await
            .context("Failed to load existing catalog")?;
        let loaded = records.len();

        let mut catalog = StoreCatalog::from_records(
            records,
            self.collector.plan().quota(),
            self.defaults.clone(),
        );
        info!(
            "📂 Loaded {} existing stores ({} unique), next_id={}",
            loaded,
            catalog.len(),
            catalog.next_id()
        );
        info!("📊 Existing category counts: {:?}", catalog.category_counts());

        let report = self.collector.collect(&mut catalog).await;

        if dry_run {
            info!("🧪 Dry run - catalog not written");
        } else {
            let stores = catalog.into_sorted_stores();
            self.store_repo
                .save_all(&stores)
                .await
                .context("Failed to save catalog")?;
        }

        info!(
            "✅ total stores: {}, today new: {}",
            report.total_stores, report.created
        );
        info!("✅ category counts: {:?}", report.category_counts);
        Ok(report)
    }
}
