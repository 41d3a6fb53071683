//! Configuration loading and data folder resolution
//!
//! Every setting resolves through the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`RECALLWATCH_*`)
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

/// Default HTTP bind address for the ingest service
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5730";
/// Default lookback window for ingestion runs, in days
pub const DEFAULT_WINDOW_DAYS: u32 = 60;
/// Default per-source fetch limit
pub const DEFAULT_FETCH_LIMIT: u32 = 100;

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file
    pub database_path: PathBuf,
    /// HTTP listen address, host:port
    pub bind_address: String,
    /// Bearer secret protecting the ingestion trigger endpoints.
    /// `None` disables trigger authentication (logged loudly at startup).
    pub ingest_secret: Option<String>,
    /// Lookback window for scheduled ingestion runs
    pub window_days: u32,
    /// Maximum records requested per source per run
    pub fetch_limit: u32,
}

/// Explicit overrides, typically parsed from the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_folder: Option<String>,
    pub bind_address: Option<String>,
    pub ingest_secret: Option<String>,
    pub window_days: Option<u32>,
    pub fetch_limit: Option<u32>,
}

/// Optional settings read from the TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
struct TomlConfig {
    data_folder: Option<String>,
    bind_address: Option<String>,
    ingest_secret: Option<String>,
    window_days: Option<u32>,
    fetch_limit: Option<u32>,
}

impl Config {
    /// Resolve the full configuration from overrides, environment, TOML
    /// file, and defaults, in that order per setting.
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Config> {
        let toml = load_toml_config()?;

        let data_folder = overrides
            .data_folder
            .clone()
            .or_else(|| std::env::var("RECALLWATCH_DATA_FOLDER").ok())
            .or_else(|| toml.data_folder.clone())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_folder);

        let bind_address = overrides
            .bind_address
            .clone()
            .or_else(|| std::env::var("RECALLWATCH_BIND_ADDRESS").ok())
            .or_else(|| toml.bind_address.clone())
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let ingest_secret = overrides
            .ingest_secret
            .clone()
            .or_else(|| std::env::var("RECALLWATCH_INGEST_SECRET").ok())
            .or_else(|| toml.ingest_secret.clone())
            .filter(|s| !s.trim().is_empty());

        let window_days = overrides
            .window_days
            .or_else(|| parse_env_u32("RECALLWATCH_WINDOW_DAYS"))
            .or(toml.window_days)
            .unwrap_or(DEFAULT_WINDOW_DAYS);

        let fetch_limit = overrides
            .fetch_limit
            .or_else(|| parse_env_u32("RECALLWATCH_FETCH_LIMIT"))
            .or(toml.fetch_limit)
            .unwrap_or(DEFAULT_FETCH_LIMIT);

        if window_days == 0 {
            return Err(Error::Config("window_days must be at least 1".to_string()));
        }

        Ok(Config {
            database_path: data_folder.join("recalls.db"),
            bind_address,
            ingest_secret,
            window_days,
            fetch_limit,
        })
    }
}

fn parse_env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Load the TOML config file if one exists.
///
/// Looks in the user config directory first, then the working directory.
/// A missing file is not an error; a malformed one is.
fn load_toml_config() -> Result<TomlConfig> {
    let candidates = [
        dirs::config_dir().map(|d| d.join("recallwatch").join("config.toml")),
        Some(PathBuf::from("recallwatch.toml")),
    ];

    for candidate in candidates.into_iter().flatten() {
        if candidate.exists() {
            let content = std::fs::read_to_string(&candidate)?;
            let parsed: TomlConfig = toml::from_str(&content).map_err(|e| {
                Error::Config(format!("Invalid config file {}: {}", candidate.display(), e))
            })?;
            info!("Loaded config file: {}", candidate.display());
            return Ok(parsed);
        }
    }

    Ok(TomlConfig::default())
}

/// OS-dependent default data folder
fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("recallwatch"))
        .unwrap_or_else(|| PathBuf::from("./recallwatch_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win() {
        let overrides = ConfigOverrides {
            data_folder: Some("/tmp/rw-test".to_string()),
            bind_address: Some("127.0.0.1:9999".to_string()),
            ingest_secret: Some("s3cret".to_string()),
            window_days: Some(7),
            fetch_limit: Some(25),
        };

        let config = Config::resolve(&overrides).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/rw-test/recalls.db"));
        assert_eq!(config.bind_address, "127.0.0.1:9999");
        assert_eq!(config.ingest_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.window_days, 7);
        assert_eq!(config.fetch_limit, 25);
    }

    #[test]
    fn test_blank_secret_disables_auth() {
        let overrides = ConfigOverrides {
            data_folder: Some("/tmp/rw-test".to_string()),
            ingest_secret: Some("   ".to_string()),
            ..Default::default()
        };

        let config = Config::resolve(&overrides).unwrap();
        assert_eq!(config.ingest_secret, None);
    }

    #[test]
    fn test_zero_window_rejected() {
        let overrides = ConfigOverrides {
            data_folder: Some("/tmp/rw-test".to_string()),
            window_days: Some(0),
            ..Default::default()
        };

        assert!(Config::resolve(&overrides).is_err());
    }
}
