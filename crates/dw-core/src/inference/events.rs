//! Per-step flag statistics and anomaly classification.
//!
//! Counts are read from the stored populations, so they can be recomputed
//! for any finished run without filtering again.

use dw_config::EventConfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::filter::FilterRun;
use super::particle::ParticleHistory;

/// Flag counts of one population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EventCounts {
    /// Particles suppressed at this step.
    pub censored: usize,
    /// Particles with the cumulative flag.
    pub cumulative: usize,
    /// Population size.
    pub total: usize,
}

impl EventCounts {
    pub fn censored_fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.censored as f64 / self.total as f64
        }
    }

    pub fn cumulative_fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.cumulative as f64 / self.total as f64
        }
    }
}

/// Flag counts for every step of a history, in step order.
pub fn extract_events(history: &ParticleHistory) -> Vec<EventCounts> {
    history
        .iter()
        .map(|population| EventCounts {
            censored: population.iter().filter(|p| p.censored).count(),
            cumulative: population.iter().filter(|p| p.cumulative).count(),
            total: population.len(),
        })
        .collect()
}

/// Which side of the predicted band an event falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Observation at or below the band midpoint.
    Drop,
    /// Observation above the band midpoint.
    Rise,
}

/// Sustained suppression level from the cumulative fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Normal,
    Elevated,
    High,
}

impl Activity {
    pub fn from_fraction(fraction: f64, config: &EventConfig) -> Self {
        if fraction > config.high_threshold {
            Activity::High
        } else if fraction > config.elevated_threshold {
            Activity::Elevated
        } else {
            Activity::Normal
        }
    }
}

/// Classification of one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StepClassification {
    pub step: usize,
    /// Calendar date of the step, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub censored_fraction: f64,
    pub cumulative_fraction: f64,
    /// Set when the step is an event.
    pub event: Option<Direction>,
    pub activity: Activity,
}

impl StepClassification {
    pub fn is_event(&self) -> bool {
        self.event.is_some()
    }

    /// Whether the step is worth reporting.
    pub fn is_anomalous(&self) -> bool {
        self.is_event() || self.activity != Activity::Normal
    }
}

/// Classify every step of a run.
///
/// `dates` labels steps by position; it may be shorter than the run or empty.
pub fn classify_events(run: &FilterRun, config: &EventConfig, dates: &[String]) -> Vec<StepClassification> {
    run.steps
        .iter()
        .map(|s| {
            let censored_fraction = s.censored_fraction();
            let cumulative_fraction = s.cumulative_fraction();
            let event = match (s.band, s.observation) {
                (Some(band), Some(obs)) if censored_fraction > config.event_threshold => {
                    if obs as f64 <= band.midpoint() {
                        Some(Direction::Drop)
                    } else {
                        Some(Direction::Rise)
                    }
                }
                _ => None,
            };
            StepClassification {
                step: s.step,
                date: dates.get(s.step).cloned(),
                censored_fraction,
                cumulative_fraction,
                event,
                activity: Activity::from_fraction(cumulative_fraction, config),
            }
        })
        .collect()
}
