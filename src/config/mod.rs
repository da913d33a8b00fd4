//! # Configuration
//!
//! TOML configuration for the `craftcost` binary. Every section has defaults, so an
//! empty file (or a missing section) is valid.
//!
//! ```toml
//! [catalog]
//! snapshot_path = "data/catalog.json"
//! seed_path = "data/seed.json"
//!
//! [dispatcher]
//! queue_capacity = 15
//!
//! [persistence]
//! save_interval_secs = 30
//!
//! [logging]
//! level = "info"
//! file = "craftcost.log"
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use craftcost::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Config::create_default("config.toml").await?;
//!     let config = Config::load("config.toml").await?;
//!     println!("Snapshot: {}", config.catalog.snapshot_path);
//!     Ok(())
//! }
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::fs;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Persisted snapshot, loaded at start and rewritten when prices change.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
    /// Seed file used to populate the catalog when no snapshot exists.
    #[serde(default = "default_seed_path")]
    pub seed_path: String,
}

fn default_snapshot_path() -> String {
    "data/catalog.json".to_string()
}

fn default_seed_path() -> String {
    "data/seed.json".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            seed_path: default_seed_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Bounded inbound command queue shared by all front-ends.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    15
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Seconds between dirty checks. 0 disables periodic saving (a final save still happens).
    #[serde(default = "default_save_interval_secs")]
    pub save_interval_secs: u64,
}

fn default_save_interval_secs() -> u64 {
    30
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            save_interval_secs: default_save_interval_secs(),
        }
    }
}

impl PersistenceConfig {
    pub fn save_interval(&self) -> Option<Duration> {
        (self.save_interval_secs > 0).then(|| Duration::from_secs(self.save_interval_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Parsed level; unknown names fall back to `Info`.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.dispatcher.queue_capacity == 0 {
            return Err(anyhow!("dispatcher.queue_capacity must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.catalog.snapshot_path, "data/catalog.json");
        assert_eq!(config.dispatcher.queue_capacity, 15);
        assert_eq!(config.persistence.save_interval(), Some(Duration::from_secs(30)));
        assert_eq!(config.logging.level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            "[persistence]\nsave_interval_secs = 0\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();
        assert_eq!(config.persistence.save_interval(), None);
        assert_eq!(config.logging.level_filter(), log::LevelFilter::Debug);
        assert_eq!(config.catalog.seed_path, "data/seed.json");
    }

    #[test]
    fn test_zero_queue_rejected() {
        let config: Config = toml::from_str("[dispatcher]\nqueue_capacity = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let serialized = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.dispatcher.queue_capacity, 15);
        assert!(parsed.logging.file.is_none());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path = path.to_str().unwrap();
        Config::create_default(path).await.unwrap();
        let loaded = Config::load(path).await.unwrap();
        assert_eq!(loaded.persistence.save_interval_secs, 30);
        assert!(Config::load("/definitely/missing.toml").await.is_err());
    }
}
