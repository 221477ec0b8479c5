//! Configuration module for the file vault.

use serde::Deserialize;
use std::path::Path;

use crate::thumbnail::MAX_DIMENSION;
use crate::{Result, VaultError};

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_storage_path")]
    pub path: String,
}

fn default_storage_path() -> String {
    "data/vault.db".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

/// Thumbnail rendering configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ThumbnailConfig {
    /// Canvas width and height in pixels.
    #[serde(default = "default_thumbnail_size")]
    pub size: u32,
    /// Box an image preview is fitted into, centered on the canvas.
    #[serde(default = "default_thumbnail_inner_size")]
    pub inner_size: u32,
    /// JPEG quality (1-100).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_thumbnail_size() -> u32 {
    300
}

fn default_thumbnail_inner_size() -> u32 {
    280
}

fn default_jpeg_quality() -> u8 {
    90
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            size: default_thumbnail_size(),
            inner_size: default_thumbnail_inner_size(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// Catalog behaviour configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Soft limit on the number of files, used for usage reporting only.
    #[serde(default = "default_advisory_file_limit")]
    pub advisory_file_limit: u64,
    /// Maximum upload size in megabytes (0 = unlimited).
    #[serde(default)]
    pub max_upload_size_mb: u64,
}

fn default_advisory_file_limit() -> u64 {
    100_000
}

impl CatalogConfig {
    /// Maximum upload size in bytes, if any.
    pub fn max_upload_bytes(&self) -> Option<u64> {
        (self.max_upload_size_mb > 0).then(|| self.max_upload_size_mb.saturating_mul(1024 * 1024))
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            advisory_file_limit: default_advisory_file_limit(),
            max_upload_size_mb: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/filevault.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Thumbnail configuration.
    #[serde(default)]
    pub thumbnails: ThumbnailConfig,
    /// Catalog configuration.
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| VaultError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let thumbs = &self.thumbnails;
        if thumbs.size == 0 || thumbs.size > MAX_DIMENSION {
            return Err(VaultError::Config(format!(
                "thumbnails.size must be between 1 and {MAX_DIMENSION}"
            )));
        }
        if thumbs.inner_size == 0 || thumbs.inner_size > thumbs.size {
            return Err(VaultError::Config(format!(
                "thumbnails.inner_size must be between 1 and {}",
                thumbs.size
            )));
        }
        if !(1..=100).contains(&thumbs.jpeg_quality) {
            return Err(VaultError::Config(
                "thumbnails.jpeg_quality must be between 1 and 100".into(),
            ));
        }
        if crate::logging::parse_level(&self.logging.level).is_none() {
            return Err(VaultError::Config(format!(
                "unknown logging.level '{}'",
                self.logging.level
            )));
        }
        Ok(())
    }
}
