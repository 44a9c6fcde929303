//! Configuration management for the Warden browser.
//!
//! This module provides TOML-based configuration file loading and saving.
//! The default configuration path is `~/.config/warden/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default ceiling for non-archive uploads (100 MiB).
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 100 * 1024 * 1024;

/// Default file service URL.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8080";

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("request_timeout must be between 1 and 3600 seconds, got {0}")]
    InvalidRequestTimeout(u64),

    #[error("max_size must be greater than 0, got {0}")]
    InvalidMaxSize(u64),

    #[error("base_url must start with http:// or https://, got {0}")]
    InvalidServiceUrl(String),

    #[error("scan_delay_ms must be at most 10000, got {0}")]
    InvalidScanDelay(u64),

    #[error("log level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Remote file service connection.
    pub service: ServiceConfig,

    /// Browser behaviour.
    pub browser: BrowserConfig,

    /// Upload policy.
    pub upload: UploadConfig,

    /// Logging.
    pub log: LogConfig,
}

/// Remote file service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the file service.
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub request_timeout: u64,
}

/// Browser behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BrowserConfig {
    /// Directory listed when a fetch is issued with an empty path.
    pub root_path: String,

    /// Delay between entries during the scan pass, in milliseconds.
    /// 0 runs the pass in one go.
    pub scan_delay_ms: u64,

    /// Keep dot-files in listings.
    pub include_hidden: bool,
}

/// Upload policy settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UploadConfig {
    /// Size ceiling for non-archive files, in bytes.
    pub max_size: u64,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    pub level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVICE_URL.to_string(),
            request_timeout: 30,
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            root_path: "/".to_string(),
            scan_delay_ms: 0,
            include_hidden: false,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("warden")
        .join("config.toml")
}

impl Config {
    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables take precedence over config file values.
    /// Supported variables:
    /// - WARDEN_SERVICE_URL: Override the file service URL
    /// - WARDEN_LOG_LEVEL: Override log level (trace, debug, info, warn, error)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("WARDEN_SERVICE_URL") {
            if !url.is_empty() {
                tracing::info!("Overriding base_url from environment: {}", url);
                self.service.base_url = url;
            }
        }

        if let Ok(level) = std::env::var("WARDEN_LOG_LEVEL") {
            if !level.is_empty() {
                tracing::info!("Overriding log level from environment: {}", level);
                self.log.level = level;
            }
        }
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timeout = self.service.request_timeout;
        if !(1..=3600).contains(&timeout) {
            return Err(ConfigError::InvalidRequestTimeout(timeout));
        }

        if self.upload.max_size == 0 {
            return Err(ConfigError::InvalidMaxSize(self.upload.max_size));
        }

        let url = &self.service.base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::InvalidServiceUrl(url.clone()));
        }

        if self.browser.scan_delay_ms > 10_000 {
            return Err(ConfigError::InvalidScanDelay(self.browser.scan_delay_ms));
        }

        let level = self.log.level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log.level.clone()));
        }

        Ok(())
    }

    /// Load configuration from a file.
    ///
    /// If the file does not exist, returns the default configuration.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self> {
        Self::load(default_config_path())
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| anyhow::anyhow!("Invalid TOML configuration: {}", format_toml_error(&e)))
    }

    /// Save configuration to a file, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = self.to_toml()?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

/// Format a TOML deserialization error for user-friendly display.
fn format_toml_error(error: &toml::de::Error) -> String {
    let mut msg = error.message().to_string();

    if let Some(span) = error.span() {
        msg.push_str(&format!(" (at position {}..{})", span.start, span.end));
    }

    msg
}
