//! Configuration management
//!
//! TOML configuration file support with environment variable overrides and
//! defaults for every field.

use crate::error::{Error, Result};
use crate::query::{FilterPolicy, DEFAULT_RAW_ROW_LIMIT};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Fact store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Query behaviour
    #[serde(default)]
    pub query: QueryConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Log level filter (error, warn, info, debug, trace) when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format: "text" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// CORS allowed origins (empty = allow all origins)
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

/// Fact store configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StoreConfig {
    /// JSON snapshot of fact records to load at startup
    #[serde(default)]
    pub data_file: Option<PathBuf>,
}

/// Query configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryConfig {
    /// Maximum rows returned by the raw rows endpoint
    #[serde(default = "default_raw_row_limit")]
    pub raw_row_limit: usize,

    /// Treatment of filter values that fail type coercion
    #[serde(default)]
    pub filter_policy: FilterPolicy,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_raw_row_limit() -> usize {
    DEFAULT_RAW_ROW_LIMIT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            raw_row_limit: default_raw_row_limit(),
            filter_policy: FilterPolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&contents).map_err(|e| {
            Error::Configuration(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load a TOML file, apply environment overrides and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(addr) = std::env::var("FMCG_LISTEN_ADDR") {
            self.server.listen_addr = addr;
        }
        if let Ok(level) = std::env::var("RUST_LOG") {
            self.server.log_level = level;
        }
        if let Ok(path) = std::env::var("FMCG_DATA_FILE") {
            self.store.data_file = Some(PathBuf::from(path));
        }
        if let Ok(limit) = std::env::var("FMCG_RAW_ROW_LIMIT") {
            self.query.raw_row_limit = limit.parse().map_err(|_| {
                Error::Configuration(format!("FMCG_RAW_ROW_LIMIT is not a number: {}", limit))
            })?;
        }
        if let Ok(policy) = std::env::var("FMCG_FILTER_POLICY") {
            self.query.filter_policy = match policy.to_lowercase().as_str() {
                "strict" => FilterPolicy::Strict,
                "lenient" => FilterPolicy::Lenient,
                other => {
                    return Err(Error::Configuration(format!(
                        "FMCG_FILTER_POLICY must be 'strict' or 'lenient', got '{}'",
                        other
                    )));
                },
            };
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.server
            .listen_addr
            .parse::<SocketAddr>()
            .map_err(|e| {
                Error::Configuration(format!(
                    "Invalid listen address '{}': {}",
                    self.server.listen_addr, e
                ))
            })?;

        if !matches!(self.server.log_format.as_str(), "text" | "json") {
            return Err(Error::Configuration(format!(
                "Log format must be 'text' or 'json', got '{}'",
                self.server.log_format
            )));
        }

        if self.query.raw_row_limit == 0 {
            return Err(Error::Configuration(
                "Raw row limit must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("Failed to serialize config: {}", e)))
    }
}
