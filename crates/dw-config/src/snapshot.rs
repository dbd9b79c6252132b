//! Configuration snapshots for run reports and reproducibility.
//!
//! A snapshot captures the exact configuration state at the start of a run,
//! so that a report can be traced back to the settings that produced it.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resolve::{ConfigPath, ConfigSource};
use crate::DetectorConfig;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// Path the config was loaded from.
    #[serde(default)]
    pub config_path: Option<String>,

    /// Source of the configuration.
    pub config_source: String,

    /// Preset the configuration started from, if any.
    #[serde(default)]
    pub preset: Option<String>,

    /// SHA-256 hash of the config file content.
    #[serde(default)]
    pub file_hash: Option<String>,

    /// SHA-256 hash of the effective configuration (after presets and overrides).
    pub effective_hash: String,

    /// Key configuration values for quick reference.
    pub summary: ConfigSummary,
}

/// Summary of key configuration values.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConfigSummary {
    pub taps: Vec<u32>,
    pub particle_count: usize,
    pub multiplicity: usize,
    pub censorship_prior: f64,
    pub censorship_std_factor: f64,
    pub event_threshold: f64,
    pub seed: Option<u64>,
}

impl ConfigSnapshot {
    /// Create a snapshot of an effective configuration.
    pub fn new(
        config: &DetectorConfig,
        path: &ConfigPath,
        file_content: Option<&str>,
        preset: Option<&str>,
    ) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            config_path: path.path.as_ref().map(|p| p.display().to_string()),
            config_source: path.source.to_string(),
            preset: preset.map(str::to_string),
            file_hash: file_content.map(hash_content),
            effective_hash: effective_hash(config),
            summary: ConfigSummary::from(config),
        }
    }

    /// Create a snapshot with only defaults (no config file loaded).
    pub fn defaults_only() -> Self {
        Self::new(
            &DetectorConfig::default(),
            &ConfigPath {
                path: None,
                source: ConfigSource::BuiltinDefault,
            },
            None,
            None,
        )
    }

    /// Serialize snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if this snapshot matches another (same effective config).
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.effective_hash == other.effective_hash
    }

    /// Get a short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.effective_hash[..12.min(self.effective_hash.len())]
    }
}

impl From<&DetectorConfig> for ConfigSummary {
    fn from(config: &DetectorConfig) -> Self {
        ConfigSummary {
            taps: config.taps.iter().map(|t| t.0).collect(),
            particle_count: config.filter.particle_count,
            multiplicity: config.filter.multiplicity,
            censorship_prior: config.filter.censorship_prior,
            censorship_std_factor: config.filter.censorship_std_factor,
            event_threshold: config.events.event_threshold,
            seed: config.filter.seed,
        }
    }
}

/// Hash of the canonical JSON rendering of a configuration.
fn effective_hash(config: &DetectorConfig) -> String {
    let canonical = serde_json::to_string(config).unwrap_or_default();
    hash_content(&canonical)
}

/// Hash content with SHA-256 and return hex string.
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterConfig;

    #[test]
    fn test_defaults_snapshot() {
        let snapshot = ConfigSnapshot::defaults_only();
        assert_eq!(snapshot.schema_version, crate::CONFIG_SCHEMA_VERSION);
        assert!(snapshot.file_hash.is_none());
        assert_eq!(snapshot.config_source, "builtin default");
        assert_eq!(snapshot.summary.taps, vec![1, 7]);
    }

    #[test]
    fn test_snapshot_short_id() {
        let snapshot = ConfigSnapshot::defaults_only();
        assert_eq!(snapshot.short_id().len(), 12);
    }

    #[test]
    fn test_snapshot_matches() {
        let s1 = ConfigSnapshot::defaults_only();
        let s2 = ConfigSnapshot::defaults_only();
        assert!(s1.matches(&s2));

        let seeded = DetectorConfig {
            filter: FilterConfig {
                seed: Some(1),
                ..FilterConfig::default()
            },
            ..DetectorConfig::default()
        };
        let s3 = ConfigSnapshot::new(&seeded, &ConfigPath::default(), None, None);
        assert!(!s1.matches(&s3));
    }

    #[test]
    fn test_hash_content() {
        let hash1 = hash_content("test");
        let hash2 = hash_content("test");
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_snapshot_json_roundtrip() {
        let snapshot = ConfigSnapshot::defaults_only();
        let json = snapshot.to_json().unwrap();
        let restored = ConfigSnapshot::from_json(&json).unwrap();
        assert!(snapshot.matches(&restored));
    }
}
