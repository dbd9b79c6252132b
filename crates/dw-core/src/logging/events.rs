//! Stable event names and pipeline stages for structured logs.
//!
//! Every event carries the run id and the stage it was emitted from, so a
//! JSONL log of one detection can be filtered without parsing messages.

use serde::{Deserialize, Serialize};

/// Processing stages of a detection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Reading and aligning input series.
    Load,
    /// Building the day-to-day model from reference series.
    Train,
    /// Running the particle filter.
    Filter,
    /// Turning flag fractions into events.
    Classify,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Load => "load",
            Stage::Train => "train",
            Stage::Filter => "filter",
            Stage::Classify => "classify",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Config
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";

    // Input
    pub const SERIES_LOADED: &str = "series.loaded";

    // Model training
    pub const MODEL_BUILT: &str = "model.built";
    pub const MODEL_OUTLIER: &str = "model.outlier";

    // Filtering
    pub const FILTER_STARTED: &str = "filter.started";
    pub const FILTER_STEP: &str = "filter.step";
    pub const FILTER_FINISHED: &str = "filter.finished";

    // Classification
    pub const EVENTS_CLASSIFIED: &str = "events.classified";
}

/// Correlation data attached to every event of one run.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
        }
    }
}
