//! TOML Configuration File Support
//!
//! Centralized configuration loading for the reader, backed by a TOML file at
//! `~/.config/board-reader/reader.toml`.
//!
//! # Configuration Priority
//!
//! Values are applied in this order (highest first):
//! 1. CLI arguments ([`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/board-reader/reader.toml` (typically
//!   `~/.config/board-reader/reader.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [service]
//! host = "192.168.0.16"
//! port = 5000
//! timeout_secs = 30
//!
//! [board]
//! grid_size = 16
//! chunk_size = 32
//! ```
//!
//! # Environment
//!
//! `READER_SERVICE_HOST`, `READER_SERVICE_PORT`, `READER_TIMEOUT_SECS`,
//! `READER_GRID_SIZE`, `READER_CHUNK_SIZE`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::BackendConfig;
use crate::board::DEFAULT_GRID_SIZE;
use crate::coords::DEFAULT_CHUNK_SIZE;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Service section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceToml {
    /// Host running the recognition and solver endpoints
    pub host: Option<String>,

    /// Service port
    pub port: Option<u16>,

    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Board section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardToml {
    /// Cells per board side
    pub grid_size: Option<u32>,

    /// Surface units per cell
    pub chunk_size: Option<u32>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderToml {
    /// Service configuration section
    pub service: ServiceToml,

    /// Board configuration section
    pub board: BoardToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved reader configuration
///
/// Use [`load_config`] to build one with proper priority handling.
#[derive(Clone, Debug)]
pub struct ReaderConfigFile {
    /// Remote service settings
    pub service: BackendConfig,

    /// Cells per board side
    pub grid_size: u32,

    /// Surface units per cell
    pub chunk_size: u32,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for ReaderConfigFile {
    fn default() -> Self {
        Self {
            service: BackendConfig::default(),
            grid_size: DEFAULT_GRID_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ReaderConfigFile {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Reject values no board or service could work with
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 {
            return Err(ConfigError::ValidationError(
                "grid_size must be at least 1".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if self.service.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "service host is empty".to_string(),
            ));
        }
        if self.service.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/board-reader/reader.toml` or
/// `~/.config/board-reader/reader.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("board-reader").join("reader.toml"))
}

/// Load configuration from all sources with proper priority
///
/// CLI arguments are not handled here; apply [`ConfigOverrides`] afterwards.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<ReaderConfigFile, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only defaults
///   and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ReaderConfigFile, ConfigError> {
    let mut config = ReaderConfigFile::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ReaderToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut ReaderConfigFile, toml: &ReaderToml) {
    if let Some(ref host) = toml.service.host {
        config.service.host = host.clone();
    }
    if let Some(port) = toml.service.port {
        config.service.port = port;
    }
    if let Some(secs) = toml.service.timeout_secs {
        config.service.timeout = Duration::from_secs(secs);
    }

    if let Some(size) = toml.board.grid_size {
        config.grid_size = size;
    }
    if let Some(size) = toml.board.chunk_size {
        config.chunk_size = size;
    }
}

/// Apply environment variable overrides, read through `var`
///
/// Unparseable values are logged and skipped.
fn apply_env_config(config: &mut ReaderConfigFile, var: impl Fn(&str) -> Option<String>) {
    fn parsed<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
        let result = value.trim().parse().ok();
        if result.is_none() {
            tracing::warn!(key, value, "Ignoring unparseable environment value");
        }
        result
    }

    if let Some(host) = var("READER_SERVICE_HOST") {
        config.service.host = host;
        config.source = ConfigSource::Env;
    }
    if let Some(port) = var("READER_SERVICE_PORT") {
        if let Some(port) = parsed("READER_SERVICE_PORT", &port) {
            config.service.port = port;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(secs) = var("READER_TIMEOUT_SECS") {
        if let Some(secs) = parsed("READER_TIMEOUT_SECS", &secs) {
            config.service.timeout = Duration::from_secs(secs);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(size) = var("READER_GRID_SIZE") {
        if let Some(size) = parsed("READER_GRID_SIZE", &size) {
            config.grid_size = size;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(size) = var("READER_CHUNK_SIZE") {
        if let Some(size) = parsed("READER_CHUNK_SIZE", &size) {
            config.chunk_size = size;
            config.source = ConfigSource::Env;
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Service host override
    pub host: Option<String>,

    /// Service port override
    pub port: Option<u16>,

    /// Request timeout override (seconds)
    pub timeout_secs: Option<u64>,

    /// Grid size override
    pub grid_size: Option<u32>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set service host override
    #[must_use]
    pub fn with_host(mut self, host: String) -> Self {
        self.host = Some(host);
        self
    }

    /// Set service port override
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set request timeout override
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Set grid size override
    #[must_use]
    pub fn with_grid_size(mut self, size: u32) -> Self {
        self.grid_size = Some(size);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut ReaderConfigFile) {
        if self.host.is_some()
            || self.port.is_some()
            || self.timeout_secs.is_some()
            || self.grid_size.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref host) = self.host {
            config.service.host = host.clone();
        }
        if let Some(port) = self.port {
            config.service.port = port;
        }
        if let Some(secs) = self.timeout_secs {
            config.service.timeout = Duration::from_secs(secs);
        }
        if let Some(size) = self.grid_size {
            config.grid_size = size;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    // =========================================================================
    // Default Configuration Tests
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = ReaderConfigFile::default();

        assert_eq!(config.service.base_url(), "http://localhost:5000");
        assert_eq!(config.service.timeout, Duration::from_secs(30));
        assert_eq!(config.grid_size, 16);
        assert_eq!(config.chunk_size, 32);
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = default_config_path() {
            assert!(p.to_string_lossy().contains("board-reader"));
            assert!(p.to_string_lossy().ends_with("reader.toml"));
        }
    }

    // =========================================================================
    // TOML Parsing Tests
    // =========================================================================

    #[test]
    fn test_parse_valid_toml() {
        let mut config = ReaderConfigFile::default();
        let toml: ReaderToml = toml::from_str(
            r#"
[service]
host = "192.168.0.16"
port = 8080
timeout_secs = 5

[board]
grid_size = 8
chunk_size = 64
"#,
        )
        .unwrap();
        apply_toml_config(&mut config, &toml);

        assert_eq!(config.service.base_url(), "http://192.168.0.16:8080");
        assert_eq!(config.service.timeout, Duration::from_secs(5));
        assert_eq!(config.grid_size, 8);
        assert_eq!(config.chunk_size, 64);
    }

    #[test]
    fn test_load_from_file_tracks_path() {
        let file = write_toml("[service]\nport = 6000\n");
        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.config_file_path.as_deref(), Some(file.path()));
        assert!(
            config.source() == ConfigSource::File || config.source() == ConfigSource::Env,
            "Expected File or Env source, got: {:?}",
            config.source()
        );
    }

    #[test]
    fn test_parse_partial_toml() {
        let mut config = ReaderConfigFile::default();
        let toml: ReaderToml = toml::from_str("[board]\nchunk_size = 40\n").unwrap();
        apply_toml_config(&mut config, &toml);

        assert_eq!(config.chunk_size, 40);
        assert_eq!(config.grid_size, 16);
        assert_eq!(config.service.port, 5000);
    }

    #[test]
    fn test_missing_file_graceful() {
        let path = PathBuf::from("/nonexistent/path/reader.toml");
        let config = load_config_from_path(Some(path)).unwrap();

        assert!(config.config_file_path.is_none());
        assert!(
            config.source() == ConfigSource::Default || config.source() == ConfigSource::Env,
            "Expected Default or Env source, got: {:?}",
            config.source()
        );
    }

    #[test]
    fn test_malformed_toml_error() {
        let file = write_toml("[service\nport = \"not a number\"\n");
        let result = load_config_from_path(Some(file.path().to_path_buf()));
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    // =========================================================================
    // Priority Ordering Tests
    // =========================================================================

    #[test]
    fn test_env_overrides_file() {
        let mut config = ReaderConfigFile::default();
        let toml: ReaderToml =
            toml::from_str("[service]\nhost = \"file-host\"\nport = 6000\n").unwrap();
        apply_toml_config(&mut config, &toml);
        config.source = ConfigSource::File;

        apply_env_config(
            &mut config,
            env(&[("READER_SERVICE_HOST", "env-host"), ("READER_GRID_SIZE", "10")]),
        );

        assert_eq!(config.service.host, "env-host");
        assert_eq!(config.service.port, 6000);
        assert_eq!(config.grid_size, 10);
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_env_unparseable_ignored() {
        let mut config = ReaderConfigFile::default();
        apply_env_config(
            &mut config,
            env(&[("READER_SERVICE_PORT", "lots"), ("READER_CHUNK_SIZE", "-3")]),
        );

        assert_eq!(config.service.port, 5000);
        assert_eq!(config.chunk_size, 32);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_cli_overrides_env() {
        let mut config = ReaderConfigFile::default();
        apply_env_config(&mut config, env(&[("READER_SERVICE_PORT", "7000")]));

        ConfigOverrides::new().with_port(7100).apply(&mut config);

        assert_eq!(config.service.port, 7100);
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    // =========================================================================
    // ConfigOverrides Tests
    // =========================================================================

    #[test]
    fn test_config_overrides_apply() {
        let mut config = ReaderConfigFile::default();

        ConfigOverrides::new()
            .with_host("solver.local".to_string())
            .with_timeout_secs(3)
            .with_grid_size(12)
            .apply(&mut config);

        assert_eq!(config.service.host, "solver.local");
        assert_eq!(config.service.timeout, Duration::from_secs(3));
        assert_eq!(config.grid_size, 12);
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_config_overrides_empty_no_change() {
        let mut config = ReaderConfigFile::default();
        ConfigOverrides::new().apply(&mut config);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    // =========================================================================
    // Validation Tests
    // =========================================================================

    #[test]
    fn test_validate_rejects_zero_sizes() {
        let mut config = ReaderConfigFile::default();
        config.grid_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        let mut config = ReaderConfigFile::default();
        config.service.timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(format!("{}", ConfigSource::Cli), "CLI");
        assert_eq!(format!("{}", ConfigSource::Env), "environment");
        assert_eq!(format!("{}", ConfigSource::File), "config file");
        assert_eq!(format!("{}", ConfigSource::Default), "default");
    }

    #[test]
    fn test_config_error_display() {
        let read_err = ConfigError::ReadError {
            path: PathBuf::from("/test/path"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let msg = format!("{read_err}");
        assert!(msg.contains("/test/path"));
        assert!(msg.contains("Failed to read"));
    }
}
