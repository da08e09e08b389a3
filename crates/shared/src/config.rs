//! Configuration management for the catalog ingestion pipeline.
//!
//! This module handles loading and parsing configuration from TOML files,
//! with sensible defaults for all settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory settings
    pub data: DataConfig,

    /// Database settings
    pub database: DatabaseConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Upstream catalog API settings
    pub catalog_api: CatalogApiConfig,

    /// Traversal engine settings
    #[serde(default)]
    pub traversal: TraversalConfig,
}

/// Data directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root data directory path
    pub root_dir: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path (relative to data directory or absolute)
    pub path: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log directory path (relative to data directory or absolute)
    pub log_dir: String,

    /// Default log level (trace, debug, info, warn, error)
    pub default_level: String,

    /// Enable console output
    pub console: bool,

    /// Enable file output
    pub file: bool,

    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

/// Upstream catalog API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogApiConfig {
    /// API base URL, without trailing slash
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,

    /// Client-side rate limiting
    pub rate_limit: RateLimitConfig,

    /// Maximum retries for transient failures and HTTP 429
    pub max_retries: u32,

    /// Base retry delay in milliseconds (doubled per attempt)
    pub retry_delay_ms: u64,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per second
    pub requests_per_second: f64,

    /// Maximum requests per minute
    pub requests_per_minute: u32,
}

/// Traversal engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraversalConfig {
    /// Consecutive 404s that end an open-ended id scan
    pub not_found_threshold: u32,

    /// Progress total shown for open-ended scans
    pub open_ended_estimate: u64,

    /// Worker pool bound for small reference-data fetchers
    pub batch_size: usize,

    /// Emit a progress line every N processed units (0 disables)
    pub progress_log_every: u64,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            not_found_threshold: 50,
            open_ended_estimate: 60_000,
            batch_size: 20,
            progress_log_every: 100,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig {
                root_dir: "data".to_string(),
            },
            database: DatabaseConfig {
                path: "catalog.db".to_string(),
            },
            logging: LoggingConfig {
                log_dir: "logs".to_string(),
                default_level: "info".to_string(),
                console: true,
                file: true,
                json_format: false,
            },
            catalog_api: CatalogApiConfig {
                base_url: "https://api.jikan.moe/v4".to_string(),
                timeout_secs: 30,
                user_agent: "catalog-ingest/0.1.0".to_string(),
                rate_limit: RateLimitConfig {
                    requests_per_second: 2.0,
                    requests_per_minute: 50,
                },
                max_retries: 3,
                retry_delay_ms: 1000,
            },
            traversal: TraversalConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// If the file doesn't exist, returns the default configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration saved successfully"
        );

        Ok(())
    }

    /// Parse the configured log level, defaulting to INFO on garbage input
    pub fn log_level(&self) -> tracing::Level {
        self.logging
            .default_level
            .parse()
            .unwrap_or(tracing::Level::INFO)
    }

    /// Get the path for the data directory
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data.root_dir)
    }

    /// Get the path for the database file
    pub fn database_path(&self) -> PathBuf {
        self.resolve(&self.database.path)
    }

    /// Get the path for the log directory
    pub fn log_dir(&self) -> PathBuf {
        self.resolve(&self.logging.log_dir)
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir().join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data.root_dir, "data");
        assert_eq!(config.database.path, "catalog.db");
        assert_eq!(config.catalog_api.rate_limit.requests_per_second, 2.0);
        assert_eq!(config.traversal.not_found_threshold, 50);
        assert_eq!(config.traversal.batch_size, 20);
    }

    #[test]
    fn test_save_and_load_config() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.toml");

        let mut original_config = Config::default();
        original_config.traversal.not_found_threshold = 7;
        original_config.save(&config_path)?;

        assert!(config_path.exists());

        let loaded_config = Config::from_file(&config_path)?;
        assert_eq!(loaded_config.data.root_dir, original_config.data.root_dir);
        assert_eq!(
            loaded_config.catalog_api.base_url,
            original_config.catalog_api.base_url
        );
        assert_eq!(loaded_config.traversal.not_found_threshold, 7);

        Ok(())
    }

    #[test]
    fn test_traversal_section_is_optional() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.toml");

        let mut content = toml::to_string_pretty(&Config::default())?;
        let cut = content
            .find("[traversal]")
            .expect("default config serializes a traversal table");
        content.truncate(cut);
        std::fs::write(&config_path, content)?;

        let loaded = Config::from_file(&config_path)?;
        assert_eq!(loaded.traversal.batch_size, 20);

        Ok(())
    }

    #[test]
    fn test_load_nonexistent_config() -> Result<()> {
        let config = Config::from_file("nonexistent.toml")?;
        assert_eq!(config.data.root_dir, "data");
        Ok(())
    }

    #[test]
    fn test_path_resolution() {
        let mut config = Config::default();

        assert!(config.database_path().ends_with("data/catalog.db"));
        assert!(config.log_dir().ends_with("data/logs"));

        config.database.path = "/var/lib/catalog.db".to_string();
        assert_eq!(config.database_path(), PathBuf::from("/var/lib/catalog.db"));
    }

    #[test]
    fn test_log_level_parsing() {
        let mut config = Config::default();
        config.logging.default_level = "debug".to_string();
        assert_eq!(config.log_level(), tracing::Level::DEBUG);

        config.logging.default_level = "loud".to_string();
        assert_eq!(config.log_level(), tracing::Level::INFO);
    }
}
