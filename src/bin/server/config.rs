//! Server Configuration
//!
//! Locates and loads the service configuration.

use fmcg_analytics::config::Config;
use std::path::{Path, PathBuf};

/// Load configuration from file or environment
///
/// Priority:
/// 1. `--config` flag
/// 2. FMCG_CONFIG environment variable
/// 3. ./fmcg.toml
/// 4. Default configuration
pub fn load_config(explicit: Option<&Path>) -> Config {
    let from_env = std::env::var("FMCG_CONFIG").ok().map(PathBuf::from);

    for path in explicit.map(Path::to_path_buf).into_iter().chain(from_env) {
        match Config::load(&path) {
            Ok(config) => {
                eprintln!("[config] Loaded configuration from: {}", path.display());
                return config;
            },
            Err(e) => {
                eprintln!(
                    "[config] Failed to load config from {}: {}. Trying defaults.",
                    path.display(),
                    e
                );
            },
        }
    }

    let local = Path::new("fmcg.toml");
    if local.exists() {
        match Config::load(local) {
            Ok(config) => {
                eprintln!("[config] Loaded configuration from fmcg.toml");
                return config;
            },
            Err(e) => {
                eprintln!("[config] Failed to parse fmcg.toml: {}. Using defaults.", e);
            },
        }
    }

    // Use defaults with environment variable overrides
    eprintln!("[config] Using default configuration");
    match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[config] Failed to apply environment overrides: {}", e);
            Config::default()
        },
    }
}
