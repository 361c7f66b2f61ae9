//! Server Configuration
//!
//! Layered: built-in defaults, then an optional `gradebook.toml` (or the file
//! named by `GRADEBOOK_CONFIG`), then `GRADEBOOK_*` environment variables.
//! Nested keys use `__`, e.g. `GRADEBOOK_RATE_LIMIT__ENABLED=true`.

use config::{Config, ConfigError, Environment, File};
use grading::{GradingConfig, ValidationConfig};
use serde::Deserialize;
use std::path::PathBuf;

use crate::rate_limit::RateLimitConfig;

/// Environment variable naming an alternate config file
pub const CONFIG_PATH_VAR: &str = "GRADEBOOK_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "gradebook";
const ENV_PREFIX: &str = "GRADEBOOK";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind_addr: String,
    /// `tracing` filter directive
    pub log_level: String,
    /// Emit JSON log lines instead of text
    pub log_json: bool,
    /// Recompute and check derived fields on addResult
    pub verify_derived: bool,
    /// Snapshot file; persistence is off when unset
    pub snapshot_path: Option<PathBuf>,
    /// Install the Prometheus exporter and serve `/metrics`
    pub metrics_enabled: bool,
    pub rate_limit: RateLimitConfig,
    pub grading: GradingConfig,
    pub validation: ValidationConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
            log_json: false,
            verify_derived: true,
            snapshot_path: None,
            metrics_enabled: true,
            rate_limit: RateLimitConfig::default(),
            grading: GradingConfig::default(),
            validation: ValidationConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from the config file (if present) and process environment
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_sources(&file, Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn from_sources(file: &str, env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(file).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}
