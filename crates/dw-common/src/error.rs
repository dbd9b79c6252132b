//! Error types for dropwatch.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Misaligned Series
//!   Reason: series for 'de' has length 30, expected 31
//!   Fix: All series passed together must cover the same dates.
//! ```
//!
//! # Machine-Facing Output
//!
//! ```json
//! {
//!   "code": 21,
//!   "category": "input",
//!   "message": "series for 'de' has length 30, expected 31",
//!   "recoverable": false,
//!   "context": { "entity": "de", "expected": 31, "actual": 30 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for dropwatch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Filter, model, or tap configuration errors.
    Config,
    /// Malformed or unusable input series.
    Input,
    /// Particle filter and model building failures.
    Inference,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Inference => write!(f, "inference"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for dropwatch.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid filter configuration: {0}")]
    InvalidFilterConfig(String),

    #[error("invalid tap set: {0}")]
    InvalidTaps(String),

    // Input errors (20-29)
    #[error("series for '{entity}' has no observations")]
    EmptySeries { entity: String },

    #[error("series for '{entity}' has length {actual}, expected {expected}")]
    MisalignedSeries {
        entity: String,
        expected: usize,
        actual: usize,
    },

    #[error("unknown entity '{entity}'")]
    UnknownEntity { entity: String },

    #[error("invalid input: {0}")]
    Input(String),

    // Inference errors (30-39)
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("rate proposal at step {step} stayed negative after {retries} draws")]
    ProposalExhausted { step: usize, retries: u32 },

    #[error("candidate weights at step {step} sum to {total}; cannot resample")]
    DegenerateWeights { step: usize, total: f64 },

    #[error("no day-to-day model for tap {tap} at position {position}")]
    ModelPositionUnavailable { tap: u32, position: usize },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Input errors
    /// - 30-39: Inference errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidFilterConfig(_) => 11,
            Error::InvalidTaps(_) => 12,
            Error::EmptySeries { .. } => 20,
            Error::MisalignedSeries { .. } => 21,
            Error::UnknownEntity { .. } => 22,
            Error::Input(_) => 23,
            Error::Inference(_) => 30,
            Error::ProposalExhausted { .. } => 31,
            Error::DegenerateWeights { .. } => 32,
            Error::ModelPositionUnavailable { .. } => 33,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidFilterConfig(_) | Error::InvalidTaps(_) => {
                ErrorCategory::Config
            }

            Error::EmptySeries { .. }
            | Error::MisalignedSeries { .. }
            | Error::UnknownEntity { .. }
            | Error::Input(_) => ErrorCategory::Input,

            Error::Inference(_)
            | Error::ProposalExhausted { .. }
            | Error::DegenerateWeights { .. }
            | Error::ModelPositionUnavailable { .. } => ErrorCategory::Inference,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    ///
    /// Recoverable errors may be resolved by fixing configuration or
    /// retrying with different settings; the others need different input.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::InvalidFilterConfig(_) => true,
            Error::InvalidTaps(_) => true,

            Error::EmptySeries { .. } => false,
            Error::MisalignedSeries { .. } => false,
            Error::UnknownEntity { .. } => true, // Pick another entity
            Error::Input(_) => false,

            Error::Inference(_) => true,
            Error::ProposalExhausted { .. } => true, // Widen the model or raise the retry cap
            Error::DegenerateWeights { .. } => true, // More particles usually help
            Error::ModelPositionUnavailable { .. } => false, // Caller bug

            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) | Error::InvalidFilterConfig(_) => {
                "Run 'dw-core config validate' to check the configuration, or fall back to a preset."
            }
            Error::InvalidTaps(_) => "Taps must be distinct positive day lags, e.g. '--taps 1,7'.",

            Error::EmptySeries { .. } => {
                "The entity has no non-missing observation; it cannot be filtered."
            }
            Error::MisalignedSeries { .. } => {
                "All series passed together must cover the same dates."
            }
            Error::UnknownEntity { .. } => "Check the entity key against the input's series keys.",
            Error::Input(_) => "Check the input document's structure.",

            Error::Inference(_) => "Retry with a different seed; if persistent, report as a bug.",
            Error::ProposalExhausted { .. } => {
                "The day-to-day model pins every proposal below zero. Check the training basket or raise max_proposal_retries."
            }
            Error::DegenerateWeights { .. } => {
                "No candidate explains the observation. Increase particle_count or multiplicity."
            }
            Error::ModelPositionUnavailable { .. } => {
                "The model table is shorter than the series or was queried before the tap applies."
            }

            Error::Io(_) => "Check paths and permissions, then retry.",
            Error::Json(_) => "Invalid JSON. Check syntax with 'jq .' on the file.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidFilterConfig(_) => "Invalid Filter Configuration",
            Error::InvalidTaps(_) => "Invalid Tap Set",

            Error::EmptySeries { .. } => "Empty Series",
            Error::MisalignedSeries { .. } => "Misaligned Series",
            Error::UnknownEntity { .. } => "Unknown Entity",
            Error::Input(_) => "Invalid Input",

            Error::Inference(_) => "Inference Error",
            Error::ProposalExhausted { .. } => "Rate Proposal Exhausted",
            Error::DegenerateWeights { .. } => "Degenerate Particle Weights",
            Error::ModelPositionUnavailable { .. } => "Model Position Unavailable",

            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context (e.g., entity, step).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::EmptySeries { entity } | Error::UnknownEntity { entity } => {
                context.insert("entity".to_string(), serde_json::json!(entity));
            }
            Error::MisalignedSeries {
                entity,
                expected,
                actual,
            } => {
                context.insert("entity".to_string(), serde_json::json!(entity));
                context.insert("expected".to_string(), serde_json::json!(expected));
                context.insert("actual".to_string(), serde_json::json!(actual));
            }
            Error::ProposalExhausted { step, retries } => {
                context.insert("step".to_string(), serde_json::json!(step));
                context.insert("retries".to_string(), serde_json::json!(retries));
            }
            Error::DegenerateWeights { step, .. } => {
                context.insert("step".to_string(), serde_json::json!(step));
            }
            Error::ModelPositionUnavailable { tap, position } => {
                context.insert("tap".to_string(), serde_json::json!(tap));
                context.insert("position".to_string(), serde_json::json!(position));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
