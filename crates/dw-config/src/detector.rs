//! The complete detector configuration and its file loader.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::events::EventConfig;
use crate::filter::FilterConfig;
use crate::model::{ModelConfig, TapSet};
use crate::validate::{validate_config, ValidationError};

/// Errors that can occur while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in config file {path}: {source}")]
    JsonError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid TOML in config file {path}: {source}")]
    TomlError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Semantic validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ConfigError> for dw_common::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ValidationError(v) => v.into(),
            ConfigError::IoError { source, .. } => dw_common::Error::Io(source),
            other => dw_common::Error::Config(other.to_string()),
        }
    }
}

/// Everything a detection run needs besides its input series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectorConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Day lags the filter may use.
    #[serde(default)]
    #[schemars(with = "Vec<u32>")]
    pub taps: TapSet,

    /// Trailing window of days to analyze. None uses the whole series.
    #[serde(default = "default_window_days")]
    pub window_days: Option<usize>,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub events: EventConfig,
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

/// Four months of daily data.
fn default_window_days() -> Option<usize> {
    Some(124)
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            taps: TapSet::default(),
            window_days: default_window_days(),
            filter: FilterConfig::default(),
            model: ModelConfig::default(),
            events: EventConfig::default(),
        }
    }
}

/// File formats a configuration can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension; anything but `.toml` is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

impl DetectorConfig {
    /// Parse a configuration from text without validating it.
    pub fn parse(content: &str, format: ConfigFormat, path: &Path) -> Result<Self, ConfigError> {
        match format {
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|source| ConfigError::JsonError {
                    path: path.to_path_buf(),
                    source,
                })
            }
            ConfigFormat::Toml => toml::from_str(content).map_err(|source| ConfigError::TomlError {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Read, parse, and validate a configuration file.
    ///
    /// Returns the configuration with the raw file content, which callers
    /// hash into a snapshot.
    pub fn from_file(path: &Path) -> Result<(Self, String), ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content, ConfigFormat::from_path(path), path)?;
        validate_config(&config)?;
        Ok((config, content))
    }

    /// JSON Schema describing the configuration file.
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(DetectorConfig);
        serde_json::to_value(schema).unwrap_or(serde_json::Value::Null)
    }
}
