//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::events::EventConfig;
use crate::filter::FilterConfig;
use crate::model::ModelConfig;
use crate::DetectorConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::ParseError(_) => 13,
            ValidationError::SemanticError(_) => 14,
            ValidationError::InvalidValue { .. } => 15,
            ValidationError::VersionMismatch { .. } => 16,
            ValidationError::IoError(_) => 60,
        }
    }

    /// Name of the offending field, when the error is about one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::InvalidValue { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<ValidationError> for dw_common::Error {
    fn from(err: ValidationError) -> Self {
        match err.field() {
            Some("taps") => dw_common::Error::InvalidTaps(err.to_string()),
            Some(f) if f.starts_with("filter.") => {
                dw_common::Error::InvalidFilterConfig(err.to_string())
            }
            _ => dw_common::Error::Config(err.to_string()),
        }
    }
}

/// Validate a complete detector configuration.
pub fn validate_config(config: &DetectorConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    validate_filter(&config.filter)?;
    validate_model(&config.model)?;
    validate_events(&config.events)?;

    if config.window_days == Some(0) {
        return Err(invalid("window_days", "must be at least 1 when set"));
    }

    Ok(())
}

/// Validate the particle filter knobs.
pub fn validate_filter(filter: &FilterConfig) -> ValidationResult<()> {
    if filter.particle_count == 0 {
        return Err(invalid("filter.particle_count", "must be at least 1"));
    }
    if filter.multiplicity == 0 {
        return Err(invalid("filter.multiplicity", "must be at least 1"));
    }
    if filter.max_proposal_retries == 0 {
        return Err(invalid("filter.max_proposal_retries", "must be at least 1"));
    }

    validate_positive("filter.normal_std_factor", filter.normal_std_factor)?;
    validate_positive("filter.censorship_std_factor", filter.censorship_std_factor)?;

    validate_open_unit("filter.censorship_prior", filter.censorship_prior)?;
    validate_open_unit("filter.change_tap_prior", filter.change_tap_prior)?;
    validate_open_unit("filter.censorship_sample_prob", filter.censorship_sample_prob)?;

    // Zero is allowed here: lineages then never switch tap.
    let p = filter.change_tap_sample_prob;
    if !(0.0..1.0).contains(&p) {
        return Err(invalid(
            "filter.change_tap_sample_prob",
            &format!("Must be in [0, 1), got {}", p),
        ));
    }

    Ok(())
}

/// Validate the day-to-day model training settings.
pub fn validate_model(model: &ModelConfig) -> ValidationResult<()> {
    if model.reference_count < 2 {
        return Err(invalid(
            "model.reference_count",
            "at least 2 reference series are needed to estimate variation",
        ));
    }
    if model.trim_percent >= 50 {
        return Err(invalid(
            "model.trim_percent",
            &format!("Must be below 50, got {}", model.trim_percent),
        ));
    }
    if !model.default_mean.is_finite() {
        return Err(invalid("model.default_mean", "must be finite"));
    }
    validate_positive("model.default_std", model.default_std)?;
    validate_positive("model.outlier_mean_bound", model.outlier_mean_bound)?;
    Ok(())
}

/// Validate anomaly classification thresholds.
pub fn validate_events(events: &EventConfig) -> ValidationResult<()> {
    validate_open_unit("events.event_threshold", events.event_threshold)?;
    validate_open_unit("events.elevated_threshold", events.elevated_threshold)?;
    validate_open_unit("events.high_threshold", events.high_threshold)?;

    if events.high_threshold < events.elevated_threshold {
        return Err(ValidationError::SemanticError(format!(
            "events.high_threshold ({}) must not be below events.elevated_threshold ({})",
            events.high_threshold, events.elevated_threshold
        )));
    }
    Ok(())
}

fn validate_positive(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(field, &format!("Must be finite and > 0, got {}", value)));
    }
    Ok(())
}

fn validate_open_unit(field: &str, value: f64) -> ValidationResult<()> {
    if !(value > 0.0 && value < 1.0) {
        return Err(invalid(field, &format!("Must be in (0, 1), got {}", value)));
    }
    Ok(())
}

fn invalid(field: &str, message: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
}
