//! dropwatch configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for filter, model, and event settings
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation
//! - Named presets
//! - Config snapshots for run reports

pub mod detector;
pub mod events;
pub mod filter;
pub mod model;
pub mod preset;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use detector::{ConfigError, ConfigFormat, DetectorConfig};
pub use events::EventConfig;
pub use filter::FilterConfig;
pub use model::{ModelConfig, TapSet};
pub use preset::{get_preset, list_presets, PresetError, PresetName};
pub use resolve::{resolve_config, ConfigPath, ConfigSource};
pub use snapshot::ConfigSnapshot;
pub use validate::{ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
