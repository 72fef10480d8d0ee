//! Logging system configuration and initialization
//!
//! This module provides the logging setup for collection runs:
//! - Console output with KST (Korea Standard Time) timestamps
//! - Optional daily-rolling file output with a bounded number of files
//! - Optional structured JSON file logs
//! - `RUST_LOG` override, otherwise the configured level plus module filters

use anyhow::{Context, Result, anyhow};
use chrono::{FixedOffset, Utc};
use once_cell::sync::Lazy;
use std::sync::Mutex;
use tracing::{Subscriber, info};
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

// Keeps the file writer alive for the whole process
static LOG_GUARDS: Lazy<Mutex<Vec<WorkerGuard>>> = Lazy::new(|| Mutex::new(Vec::new()));

const KST_OFFSET_SECONDS: i32 = 9 * 3600;

/// Custom time formatter for KST (Korea Standard Time, UTC+9)
struct KstTimeFormatter;

impl FormatTime for KstTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        let now = Utc::now();
        match FixedOffset::east_opt(KST_OFFSET_SECONDS) {
            Some(kst) => write!(w, "{}", now.with_timezone(&kst).format("%Y-%m-%d %H:%M:%S%.3f %Z")),
            None => write!(w, "{}", now.format("%Y-%m-%d %H:%M:%S%.3f UTC")),
        }
    }
}

fn console_layer<S>(enabled: bool) -> Option<impl Layer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    enabled.then(|| {
        fmt::Layer::new()
            .with_writer(std::io::stdout)
            .with_timer(KstTimeFormatter)
            .with_target(false)
    })
}

/// Filter string built from the configured level and per-module overrides.
///
/// Module overrides are dropped at `trace` so everything is visible.
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    let mut directives = vec![config.level.clone()];
    if !config.level.to_lowercase().contains("trace") {
        let mut modules: Vec<_> = config.module_filters.iter().collect();
        modules.sort();
        for (module, level) in modules {
            directives.push(format!("{module}={level}"));
        }
    }
    directives.join(",")
}

/// Initialize logging with custom configuration
///
/// `RUST_LOG` takes precedence over the configured level:
/// ```bash
/// RUST_LOG="debug,reqwest=debug" dessert-map-collector
/// ```
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(build_filter_directives(config))
            .with_context(|| format!("Invalid log level '{}'", config.level))?,
    };

    let registry = Registry::default().with(env_filter);

    match (config.file_output, config.console_output) {
        (false, false) => return Err(anyhow!("No logging output configured")),
        (false, true) => {
            registry.with(console_layer(true)).try_init()?;
        }
        (true, _) => {
            std::fs::create_dir_all(&config.log_dir)
                .with_context(|| format!("Failed to create log directory {:?}", config.log_dir))?;

            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(&config.file_prefix)
                .filename_suffix("log")
                .max_log_files(config.max_files.max(1))
                .build(&config.log_dir)
                .context("Failed to create rolling log file")?;
            let (file_writer, file_guard) = non_blocking(appender);

            LOG_GUARDS
                .lock()
                .map_err(|_| anyhow!("Log guard registry poisoned"))?
                .push(file_guard);

            if config.json_format {
                let file_layer = fmt::Layer::new()
                    .json()
                    .with_writer(file_writer)
                    .with_timer(KstTimeFormatter)
                    .with_target(true)
                    .with_ansi(false);
                registry
                    .with(file_layer)
                    .with(console_layer(config.console_output))
                    .try_init()?;
            } else {
                let file_layer = fmt::Layer::new()
                    .with_writer(file_writer)
                    .with_timer(KstTimeFormatter)
                    .with_target(false)
                    .with_ansi(false);
                registry
                    .with(file_layer)
                    .with(console_layer(config.console_output))
                    .try_init()?;
            }
        }
    }

    info!("Logging system initialized (level: {})", config.level);
    if config.file_output {
        info!("Log directory: {:?}", config.log_dir);
    }
    Ok(())
}

/// Log system information for diagnostics
pub fn log_system_info() {
    info!("=== Dessert Map Collector ===");
    info!("Application version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);
    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }
}
