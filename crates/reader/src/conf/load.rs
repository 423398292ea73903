//! Load: config loading from file and environment variables.

use std::path::Path;
use std::fs::File;
use std::io::Read;

use super::model::ReaderConfig;
use crate::parser::MAX_LINE_SIZE;

pub const DEFAULT_CONFIG_FILE: &str = "/etc/gclog/reader.toml";

impl ReaderConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = std::env::var("GCLOG_CONFIG_FILE")
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&config_path)
    }

    /// Like `load`, with an explicit file. A missing file falls back to the environment.
    pub fn load_from(config_path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = if Path::new(config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(config_path)?
        } else {
            tracing::info!("Config file not found at {}, using environment variables", config_path);
            Self::from_env()
        };

        // Environment variables override file config
        if let Some(size) = env_parse("GCLOG_MAX_LINE_SIZE") {
            config.max_line_size = size;
        }
        if let Some(size) = env_parse("GCLOG_REGION_SIZE_KB") {
            config.region_size_kb = Some(size);
        }

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: ReaderConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Self {
        Self {
            max_line_size: env_parse("GCLOG_MAX_LINE_SIZE").unwrap_or(MAX_LINE_SIZE),
            region_size_kb: env_parse("GCLOG_REGION_SIZE_KB"),
            extra_exclude_markers: Vec::new(),
            extra_log_only_markers: Vec::new(),
        }
    }

    /// Validate that configuration values are sane
    pub fn validate(&self) -> Result<(), String> {
        if self.max_line_size == 0 {
            return Err("max_line_size must be > 0".to_string());
        }
        if self.region_size_kb == Some(0) {
            return Err("region_size_kb must be > 0 when set".to_string());
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}
