//! Infrastructure layer: configuration, logging and external integrations
//!
//! Concrete adapters for the domain seams: the Naver Local Search client behind
//! `LocalSearchProvider` and the JSON catalog file behind `StoreRepository`.

pub mod config; // Layered configuration (defaults -> file -> env)
pub mod http_client; // Rate-limited reqwest wrapper
pub mod json_store_repository;
pub mod logging;
pub mod naver_search_client;

// Re-export commonly used items
pub use self::config::{AppConfig, ConfigError, LoggingConfig, OutputConfig, SearchApiConfig};
pub use http_client::{HttpClient, HttpClientConfig};
pub use json_store_repository::JsonStoreRepository;
pub use logging::{init_logging_with_config, log_system_info};
pub use naver_search_client::{CredentialsError, NaverLocalSearchClient, SearchCredentials};
