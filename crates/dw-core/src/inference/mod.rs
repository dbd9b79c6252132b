//! Inference engine modules.

pub mod daytoday;
pub mod events;
pub mod filter;
pub mod particle;
pub mod rate;
pub mod resample;

pub use daytoday::{fractional_changes, DayToDayModel, FitSource, ModelBuilder, NormalParams};
pub use events::{
    classify_events, extract_events, Activity, Direction, EventCounts, StepClassification,
};
pub use filter::{Band, FilterRun, ParticleFilter, StepSummary};
pub use particle::{Particle, ParticleHistory, Traceback};
pub use rate::{infer_rate, infer_series, infer_training_series, ZERO_COUNT_SHAPE};
pub use resample::{effective_sample_size, resample};
