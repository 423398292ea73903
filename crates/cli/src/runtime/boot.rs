//! Boot: logging init and reader config load.

use anyhow::{anyhow, bail, Result};
use std::path::Path;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use reader::ReaderConfig;

use crate::cli::LogLevel;

const DEFAULT_FILTER: &str = "reader=info,gclog=info";

/// Filter directives for `level`, or RUST_LOG, or the default.
pub fn log_filter(level: Option<LogLevel>) -> EnvFilter {
    match level {
        Some(level) => EnvFilter::new(format!("reader={0},gclog={0}", level.as_str())),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()),
    }
}

/// Initialise the tracing / logging subsystem. Logs go to stderr, stdout is for results.
pub fn init_logging(level: Option<LogLevel>) {
    tracing_subscriber::registry()
        .with(log_filter(level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load and validate the reader config.
///
/// An explicit path must exist; without one the usual lookup applies
/// (GCLOG_CONFIG_FILE, then the default file, then environment variables).
pub fn load_config(path: Option<&Path>) -> Result<ReaderConfig> {
    let config = match path {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            ReaderConfig::load_from(&path.to_string_lossy())
        }
        None => ReaderConfig::load(),
    }
    .map_err(|e| anyhow!("Failed to load configuration: {}", e))?;

    config
        .validate()
        .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

    info!(
        "Loaded configuration: max_line_size={}, region_size_kb={:?}",
        config.max_line_size, config.region_size_kb
    );
    Ok(config)
}
