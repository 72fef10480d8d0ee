//! Configuration infrastructure
//!
//! Contains configuration loading and validation for the collector.
//!
//! Values are layered in three tiers:
//! 1. Built-in defaults (the `defaults` module, matching the production run)
//! 2. An optional config file (`--config`, any format the `config` crate reads)
//! 3. Environment overrides, e.g. `DESSERT_MAP_COLLECTION__DAILY_TARGET=10`

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::application::collection_plan::{CategoryPlan, Pacing, PageWindow, SearchPlan};
use crate::domain::place_filter::RegionPolicy;
use crate::domain::search::SortMode;
use crate::domain::store::StoreDefaults;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "DESSERT_MAP";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Search space and run limits
    pub collection: SearchPlan,

    /// Target city filter
    pub region: RegionPolicy,

    /// Pauses between provider requests
    pub pacing: Pacing,

    /// Naver Local Search client settings
    pub search_api: SearchApiConfig,

    /// Persisted catalog location
    pub output: OutputConfig,

    /// Display fields for newly created stores
    pub store_defaults: StoreDefaults,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Search provider client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchApiConfig {
    pub endpoint: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Ceiling on outgoing requests per second
    pub max_requests_per_second: u32,

    pub user_agent: String,

    /// Environment variable holding the client id
    pub client_id_env: String,

    /// Environment variable holding the client secret
    pub client_secret_env: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON catalog read at start and overwritten at the end of a run
    pub catalog_path: PathBuf,
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs (file output)
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable daily-rolling file output
    pub file_output: bool,

    /// Directory for log files
    pub log_dir: PathBuf,

    /// File name prefix of rolled log files
    pub file_prefix: String,

    /// Number of rolled log files to keep
    pub max_files: usize,

    /// Module-specific log level filters (e.g., "reqwest": "warn")
    pub module_filters: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            collection: SearchPlan::default(),
            region: RegionPolicy::default(),
            pacing: Pacing::default(),
            search_api: SearchApiConfig::default(),
            output: OutputConfig::default(),
            store_defaults: StoreDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SearchPlan {
    fn default() -> Self {
        Self {
            city: defaults::CITY.to_string(),
            districts: defaults::DISTRICTS.iter().map(|d| (*d).to_string()).collect(),
            categories: defaults::CATEGORIES
                .iter()
                .map(|(name, keywords)| CategoryPlan::new(name, keywords, defaults::PER_CATEGORY_LIMIT))
                .collect(),
            daily_target: defaults::NEW_DAILY_TARGET,
            total_hard_cap: defaults::TOTAL_HARD_CAP,
            pages: PageWindow {
                first_start: defaults::PAGE_FIRST_START,
                last_start: defaults::PAGE_LAST_START,
                stride: defaults::PAGE_STRIDE,
                display: defaults::PAGE_DISPLAY,
            },
            sort: SortMode::Similarity,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            page_delay_ms: defaults::PAGE_DELAY_MS,
            error_delay_ms: defaults::ERROR_DELAY_MS,
        }
    }
}

impl Default for SearchApiConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::SEARCH_ENDPOINT.to_string(),
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            user_agent: defaults::USER_AGENT.to_string(),
            client_id_env: defaults::CLIENT_ID_ENV.to_string(),
            client_secret_env: defaults::CLIENT_SECRET_ENV.to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(defaults::CATALOG_PATH),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: PathBuf::from(defaults::LOG_DIR),
            file_prefix: defaults::LOG_FILE_PREFIX.to_string(),
            max_files: defaults::LOG_MAX_FILES,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("reqwest".to_string(), "info".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("hyper_util".to_string(), "warn".to_string());
                filters.insert("h2".to_string(), "warn".to_string());
                filters
            },
        }
    }
}

impl AppConfig {
    /// Layer defaults, the optional file at `path` and `DESSERT_MAP_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            info!("Loading configuration from: {:?}", path);
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let plan = &self.collection;

        if plan.districts.iter().all(|d| d.trim().is_empty()) {
            return Err(ConfigError::invalid("collection.districts must not be empty"));
        }
        if plan.categories.is_empty() {
            return Err(ConfigError::invalid("collection.categories must not be empty"));
        }
        for (index, category) in plan.categories.iter().enumerate() {
            if category.name.trim().is_empty() {
                return Err(ConfigError::invalid(format!("category #{index} has an empty name")));
            }
            if plan.categories[..index].iter().any(|c| c.name == category.name) {
                return Err(ConfigError::invalid(format!(
                    "category '{}' is configured more than once",
                    category.name
                )));
            }
        }

        let pages = &plan.pages;
        if pages.stride == 0 || pages.display == 0 {
            return Err(ConfigError::invalid("collection.pages stride and display must be greater than 0"));
        }
        if pages.first_start == 0 || pages.first_start > pages.last_start {
            return Err(ConfigError::invalid(format!(
                "collection.pages must satisfy 1 <= first_start <= last_start (got {}..={})",
                pages.first_start, pages.last_start
            )));
        }

        if !self.region.bounds.is_well_formed() {
            return Err(ConfigError::invalid("region.bounds min values must be below max values"));
        }
        if self.region.coordinate_scale <= 0.0 {
            return Err(ConfigError::invalid("region.coordinate_scale must be positive"));
        }
        if self.region.city_marker.trim().is_empty() {
            return Err(ConfigError::invalid("region.city_marker must not be empty"));
        }

        if self.search_api.max_requests_per_second == 0 {
            return Err(ConfigError::invalid("search_api.max_requests_per_second must be greater than 0"));
        }

        Ok(())
    }
}

/// Default collection values (the production daily run)
pub mod defaults {
    /// City prefix for queries
    pub const CITY: &str = "서울";

    /// Districts walked in order
    pub const DISTRICTS: &[&str] = &[
        "강남구", "서초구", "송파구", "성동구", "마포구",
        "용산구", "영등포구", "강동구", "광진구", "동대문구",
    ];

    /// Category label → search keywords, in traversal order
    pub const CATEGORIES: &[(&str, &[&str])] = &[
        ("dubai", &["두바이쫀득쿠키"]),
        ("cake", &["딸기케이크"]),
        ("bungeoppang", &["붕어빵", "팥붕", "슈붕"]),
        ("goguma", &["군고구마"]),
    ];

    /// Default per-category ceiling
    pub const PER_CATEGORY_LIMIT: usize = 1000;

    /// New stores allowed per run
    pub const NEW_DAILY_TARGET: usize = 50;

    /// Catalog-wide ceiling
    pub const TOTAL_HARD_CAP: usize = 4000;

    // Paging: start = 1, 6, 11, ... 296
    pub const PAGE_FIRST_START: u32 = 1;
    pub const PAGE_LAST_START: u32 = 300;
    pub const PAGE_STRIDE: u32 = 5;
    pub const PAGE_DISPLAY: u32 = 5;

    /// Pause after each processed page
    pub const PAGE_DELAY_MS: u64 = 200;

    /// Pause after a failed request
    pub const ERROR_DELAY_MS: u64 = 500;

    pub const SEARCH_ENDPOINT: &str = "https://openapi.naver.com/v1/search/local.json";
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 15;
    pub const MAX_REQUESTS_PER_SECOND: u32 = 10;
    pub const USER_AGENT: &str = concat!("dessert-map-collector/", env!("CARGO_PKG_VERSION"));
    pub const CLIENT_ID_ENV: &str = "NAVER_CLIENT_ID";
    pub const CLIENT_SECRET_ENV: &str = "NAVER_CLIENT_SECRET";

    /// Catalog consumed by the map front-end
    pub const CATALOG_PATH: &str = "public/stores.json";

    // Log configuration defaults
    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = false;
    pub const LOG_DIR: &str = "logs";
    pub const LOG_FILE_PREFIX: &str = "collector";
    pub const LOG_MAX_FILES: usize = 14;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::store::StockStatus;
    use std::io::Write;

    #[test]
    fn defaults_match_production_run() {
        let config = AppConfig::default();
        assert_eq!(config.collection.districts.len(), 10);
        assert_eq!(config.collection.categories.len(), 4);
        assert_eq!(config.collection.daily_target, 50);
        assert_eq!(config.collection.total_hard_cap, 4000);
        assert_eq!(config.collection.pages.starts().count(), 60);
        assert_eq!(config.store_defaults.status, StockStatus::Available);
        assert_eq!(config.output.catalog_path, PathBuf::from("public/stores.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn loads_defaults_without_file() {
        let config = AppConfig::load(None).expect("defaults load");
        assert_eq!(config.collection.categories[2].name, "bungeoppang");
        assert_eq!(config.collection.categories[2].keywords, vec!["붕어빵", "팥붕", "슈붕"]);
        assert_eq!(config.region.city_marker, "서울");
    }

    #[test]
    fn file_overrides_selected_values() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{
                "collection": {{
                    "daily_target": 7,
                    "districts": ["마포구"],
                    "categories": [{{ "name": "cake", "keywords": ["딸기케이크"], "limit": 3 }}]
                }},
                "output": {{ "catalog_path": "out/stores.json" }}
            }}"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).expect("file load");
        assert_eq!(config.collection.daily_target, 7);
        assert_eq!(config.collection.districts, vec!["마포구"]);
        assert_eq!(config.collection.categories.len(), 1);
        assert_eq!(config.collection.categories[0].limit, 3);
        assert_eq!(config.collection.total_hard_cap, 4000);
        assert_eq!(config.output.catalog_path, PathBuf::from("out/stores.json"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(ConfigError::Load { .. })));
    }

    #[test]
    fn rejects_duplicate_categories() {
        let mut config = AppConfig::default();
        config.collection.categories.push(CategoryPlan::new("cake", &["조각케이크"], 10));
        assert!(matches!(config.validate(), Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn rejects_zero_stride_and_inverted_pages() {
        let mut config = AppConfig::default();
        config.collection.pages.stride = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.collection.pages.first_start = 301;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_bounds() {
        let mut config = AppConfig::default();
        config.region.bounds.min_lat = 38.0;
        assert!(config.validate().is_err());
    }
}
