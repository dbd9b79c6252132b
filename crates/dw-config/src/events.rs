//! Thresholds for turning per-step flag fractions into reportable anomalies.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Anomaly classification thresholds, as fractions of the population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EventConfig {
    /// A step is an event when its immediate-flag fraction exceeds this.
    #[serde(default = "default_event_threshold")]
    pub event_threshold: f64,

    /// Cumulative-flag fraction above which activity is `Elevated`.
    #[serde(default = "default_elevated_threshold")]
    pub elevated_threshold: f64,

    /// Cumulative-flag fraction above which activity is `High`.
    #[serde(default = "default_high_threshold")]
    pub high_threshold: f64,
}

fn default_event_threshold() -> f64 {
    0.10
}
fn default_elevated_threshold() -> f64 {
    0.20
}
fn default_high_threshold() -> f64 {
    0.50
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            event_threshold: default_event_threshold(),
            elevated_threshold: default_elevated_threshold(),
            high_threshold: default_high_threshold(),
        }
    }
}
