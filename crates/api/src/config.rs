//! Service Configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `config/house-price.{toml,yaml,json}` file, then `HOUSE_PRICE__*`
//! environment variables (`HOUSE_PRICE__SERVER__BIND_ADDR=127.0.0.1:3000`).

use config::{Config, ConfigError, Environment, File};
use data_validator::ValidationConfig;
use feature_engine::UnmatchedCategoryPolicy;
use inference_engine::ArtifactPaths;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::rate_limit::RateLimitConfig;

/// Default configuration file, without extension
pub const DEFAULT_CONFIG_FILE: &str = "config/house-price";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "HOUSE_PRICE";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactPaths,
    pub encoding: EncodingConfig,
    pub validation: ValidationConfig,
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,
    /// Per-IP rate limiting
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Feature encoding settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// Handling of selections with no schema column
    pub unmatched_category: UnmatchedCategoryPolicy,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum level: trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load from the default file location and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(File::with_name(DEFAULT_CONFIG_FILE).required(false))
    }

    /// Load from an explicit file (format from its extension) and the environment
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::build(File::from(path).required(true))
    }

    fn build<S>(file: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
