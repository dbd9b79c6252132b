//! Configuration presets for common detection scenarios.
//!
//! Provides pre-built configurations for:
//! - Standard: the calibrated defaults
//! - Sensitive: flags smaller, shorter disruptions at the cost of false alarms
//! - Quick: a small population for interactive exploration and smoke tests

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::events::EventConfig;
use crate::filter::FilterConfig;
use crate::DetectorConfig;

/// Available configuration presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    /// Calibrated defaults
    #[default]
    Standard,
    /// Higher suppression prior, lower event threshold
    Sensitive,
    /// Small population, fast and noisy
    Quick,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] = &[
        PresetName::Standard,
        PresetName::Sensitive,
        PresetName::Quick,
    ];

    /// Get preset name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Standard => "standard",
            PresetName::Sensitive => "sensitive",
            PresetName::Quick => "quick",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "standard" | "default" => Some(PresetName::Standard),
            "sensitive" | "strict" => Some(PresetName::Sensitive),
            "quick" | "fast" => Some(PresetName::Quick),
            _ => None,
        }
    }

    /// Get a description of the preset.
    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Standard => "Calibrated defaults: 1000 particles, taps 1 and 7",
            PresetName::Sensitive => {
                "Higher suppression prior and lower event threshold; more false alarms"
            }
            PresetName::Quick => "200 particles; fast, noisier bands",
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| PresetError::UnknownPreset(s.to_string()))
    }
}

/// Errors related to preset operations.
#[derive(Debug, Clone)]
pub enum PresetError {
    /// Unknown preset name.
    UnknownPreset(String),
}

impl fmt::Display for PresetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetError::UnknownPreset(name) => {
                write!(
                    f,
                    "Unknown preset '{}'. Available: {}",
                    name,
                    PresetName::ALL
                        .iter()
                        .map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
        }
    }
}

impl std::error::Error for PresetError {}

impl From<PresetError> for dw_common::Error {
    fn from(err: PresetError) -> Self {
        dw_common::Error::Config(err.to_string())
    }
}

/// Get the configuration for a preset.
pub fn get_preset(name: PresetName) -> DetectorConfig {
    match name {
        PresetName::Standard => DetectorConfig::default(),
        PresetName::Sensitive => sensitive_preset(),
        PresetName::Quick => quick_preset(),
    }
}

/// Information about a preset, for listing.
#[derive(Debug, Clone, Serialize)]
pub struct PresetInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// List all presets with their descriptions.
pub fn list_presets() -> Vec<PresetInfo> {
    PresetName::ALL
        .iter()
        .map(|p| PresetInfo {
            name: p.as_str(),
            description: p.description(),
        })
        .collect()
}

fn sensitive_preset() -> DetectorConfig {
    DetectorConfig {
        filter: FilterConfig {
            particle_count: 2000,
            censorship_prior: 0.03,
            ..FilterConfig::default()
        },
        events: EventConfig {
            event_threshold: 0.05,
            elevated_threshold: 0.10,
            high_threshold: 0.30,
        },
        ..DetectorConfig::default()
    }
}

fn quick_preset() -> DetectorConfig {
    DetectorConfig {
        filter: FilterConfig {
            particle_count: 200,
            ..FilterConfig::default()
        },
        window_days: Some(60),
        ..DetectorConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_config;

    #[test]
    fn every_preset_validates() {
        for name in PresetName::ALL {
            validate_config(&get_preset(*name)).unwrap_or_else(|e| panic!("{}: {}", name, e));
        }
    }

    #[test]
    fn parse_aliases() {
        assert_eq!(PresetName::parse("DEFAULT"), Some(PresetName::Standard));
        assert_eq!(PresetName::parse("fast"), Some(PresetName::Quick));
        assert_eq!(PresetName::parse("nope"), None);
    }

    #[test]
    fn unknown_preset_lists_choices() {
        let err = "nope".parse::<PresetName>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("standard, sensitive, quick"), "{}", msg);
    }

    #[test]
    fn standard_is_default() {
        assert_eq!(get_preset(PresetName::Standard), DetectorConfig::default());
        assert_eq!(list_presets().len(), 3);
    }
}
