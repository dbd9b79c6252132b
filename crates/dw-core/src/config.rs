//! Configuration loading for the detector binary.
//!
//! Resolution order (highest to lowest priority):
//! 1. Explicit `--config` path
//! 2. Environment variables (`DW_CONFIG`, `DW_CONFIG_DIR`)
//! 3. XDG config home (`~/.config/dropwatch/`)
//! 4. The named preset, or the `standard` preset
//!
//! A configuration file replaces the preset entirely; fields the file omits
//! take their built-in defaults.

use dw_common::Result;
use dw_config::{
    get_preset, resolve_config, ConfigPath, ConfigSnapshot, DetectorConfig, PresetError,
    PresetName,
};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::logging::event_names;

/// Options for configuration loading.
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    /// Explicit config file path.
    pub config_path: Option<PathBuf>,
    /// Preset name, used when no config file resolves.
    pub preset: Option<String>,
}

/// The effective configuration and where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: DetectorConfig,
    /// Resolved file location (path None for presets).
    pub path: ConfigPath,
    /// Preset used, when no file was loaded.
    pub preset: Option<PresetName>,
    /// Raw file content, when a file was loaded.
    pub content: Option<String>,
}

impl ResolvedConfig {
    /// Create a config snapshot for run reports.
    pub fn snapshot(&self) -> ConfigSnapshot {
        self.snapshot_of(&self.config)
    }

    /// Snapshot of `config`, a copy of this configuration with overrides applied.
    pub fn snapshot_of(&self, config: &DetectorConfig) -> ConfigSnapshot {
        ConfigSnapshot::new(
            config,
            &self.path,
            self.content.as_deref(),
            self.preset.map(|p| p.as_str()),
        )
    }
}

/// Load configuration with the standard resolution order.
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig> {
    let preset = match options.preset.as_deref() {
        Some(name) => Some(
            PresetName::parse(name).ok_or_else(|| PresetError::UnknownPreset(name.to_string()))?,
        ),
        None => None,
    };

    let path = resolve_config(options.config_path.as_deref());
    match path.path.clone() {
        Some(file) => {
            let (config, content) = DetectorConfig::from_file(&file)?;
            if let Some(p) = preset {
                warn!(
                    target: event_names::CONFIG_LOADED,
                    preset = p.as_str(),
                    path = %file.display(),
                    "preset ignored: a config file was found"
                );
            }
            info!(
                target: event_names::CONFIG_LOADED,
                path = %file.display(),
                source = %path.source,
                "configuration loaded"
            );
            Ok(ResolvedConfig {
                config,
                path,
                preset: None,
                content: Some(content),
            })
        }
        None => {
            let name = preset.unwrap_or_default();
            info!(
                target: event_names::CONFIG_DEFAULT_USED,
                preset = name.as_str(),
                "no config file; using preset"
            );
            Ok(ResolvedConfig {
                config: get_preset(name),
                path,
                preset: Some(name),
                content: None,
            })
        }
    }
}
