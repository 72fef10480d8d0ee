use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use dessert_map_collector::application::{CollectStoresUseCase, StoreCollector};
use dessert_map_collector::infrastructure::{
    AppConfig, JsonStoreRepository, NaverLocalSearchClient, SearchCredentials, init_logging_with_config,
    log_system_info,
};

#[derive(Parser, Debug)]
#[command(
    name = "dessert-map-collector",
    version,
    about = "Collect Seoul dessert shops from Naver Local Search into stores.json"
)]
struct Cli {
    /// Configuration file layered over the built-in defaults
    #[arg(long, env = "DESSERT_MAP_CONFIG")]
    config: Option<PathBuf>,

    /// Catalog file to read and overwrite
    #[arg(long)]
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Run the whole collection but do not write the catalog
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(output) = &self.output {
            config.output.catalog_path = output.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);

    init_logging_with_config(&config.logging).context("Failed to initialize logging")?;
    log_system_info();

    let api = &config.search_api;
    let credentials = match SearchCredentials::from_env(&api.client_id_env, &api.client_secret_env) {
        Ok(credentials) => credentials,
        Err(e) => {
            error!("❌ {} - set {} and {}", e, api.client_id_env, api.client_secret_env);
            return Err(e.into());
        }
    };

    let provider = Arc::new(NaverLocalSearchClient::new(api, credentials)?);
    let store_repo = Arc::new(JsonStoreRepository::new(&config.output.catalog_path));
    let collector = StoreCollector::new(
        provider,
        config.collection.clone(),
        config.region.clone(),
        config.pacing,
    );
    let use_case = CollectStoresUseCase::new(store_repo, collector, config.store_defaults.clone());

    info!("🚀 Collecting into {:?}", config.output.catalog_path);
    let report = use_case.execute(cli.dry_run).await?;

    info!(
        "📈 pages={} failed={} seen={} rejected={} created={} categories_added={} stop={}",
        report.pages_requested,
        report.failed_requests,
        report.items_seen,
        report.rejected_total(),
        report.created,
        report.categories_added,
        report
            .stop_reason
            .map_or_else(|| "search space exhausted".to_string(), |r| r.to_string())
    );
    Ok(())
}
