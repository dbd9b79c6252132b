//! End-to-end detection: window the input, train the day-to-day model on the
//! reference basket, filter the target entity, classify its steps.

use dw_common::{EntityKey, Result};
use dw_config::{DetectorConfig, ModelConfig, TapSet};
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::inference::{
    classify_events, infer_training_series, Activity, DayToDayModel, Direction, FilterRun,
    ModelBuilder, ParticleFilter, StepClassification,
};
use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};
use crate::series::{forward_fill, SeriesSet};

/// A trained model with the entities it was fitted on.
#[derive(Debug, Clone, Serialize)]
pub struct TrainedModel {
    pub reference: Vec<EntityKey>,
    pub model: DayToDayModel,
}

/// Fit the day-to-day model on the `reference_count` largest entities of `set`.
pub fn train_model<R: Rng + ?Sized>(
    rng: &mut R,
    set: &SeriesSet,
    taps: &TapSet,
    config: &ModelConfig,
) -> Result<TrainedModel> {
    let reference = set.largest(config.reference_count);
    let mut rates = Vec::with_capacity(reference.len());
    for key in &reference {
        let raw = set.get(key)?;
        rates.push((key.clone(), infer_training_series(rng, raw)));
    }
    let model = ModelBuilder::new(config).build(&rates, set.len(), taps)?;
    Ok(TrainedModel { reference, model })
}

/// Headline numbers of a detection run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionSummary {
    pub steps: usize,
    pub events: usize,
    pub drops: usize,
    pub rises: usize,
    pub elevated_steps: usize,
    pub high_steps: usize,
    pub max_censored_fraction: f64,
    pub max_cumulative_fraction: f64,
}

impl DetectionSummary {
    fn from_classifications(classes: &[StepClassification]) -> Self {
        let count_dir = |d: Direction| classes.iter().filter(|c| c.event == Some(d)).count();
        let count_act = |a: Activity| classes.iter().filter(|c| c.activity == a).count();
        DetectionSummary {
            steps: classes.len(),
            events: classes.iter().filter(|c| c.is_event()).count(),
            drops: count_dir(Direction::Drop),
            rises: count_dir(Direction::Rise),
            elevated_steps: count_act(Activity::Elevated),
            high_steps: count_act(Activity::High),
            max_censored_fraction: classes.iter().map(|c| c.censored_fraction).fold(0.0, f64::max),
            max_cumulative_fraction: classes
                .iter()
                .map(|c| c.cumulative_fraction)
                .fold(0.0, f64::max),
        }
    }

    /// Whether any step is an event or shows elevated activity.
    pub fn anomalies_found(&self) -> bool {
        self.events > 0 || self.elevated_steps > 0 || self.high_steps > 0
    }
}

/// Full result of [`detect`].
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub entity: EntityKey,
    /// First and last date of the analyzed window.
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    pub taps: Vec<u32>,
    pub reference: Vec<EntityKey>,
    pub summary: DetectionSummary,
    pub classifications: Vec<StepClassification>,
    pub run: FilterRun,
}

/// Run detection for one entity.
pub fn detect<R: Rng + ?Sized>(
    rng: &mut R,
    set: &SeriesSet,
    entity: &EntityKey,
    config: &DetectorConfig,
    ctx: &LogContext,
) -> Result<DetectionReport> {
    let windowed = match config.window_days {
        Some(days) => set.window(days),
        None => set.clone(),
    };
    let observations = forward_fill(entity, windowed.get(entity)?)?;
    log_event!(
        ctx,
        INFO,
        event_names::SERIES_LOADED,
        Stage::Load,
        "series windowed",
        entity = entity.as_str(),
        days = windowed.len(),
        entities = windowed.entity_count()
    );

    let trained = train_model(rng, &windowed, &config.taps, &config.model)?;
    log_event!(
        ctx,
        INFO,
        event_names::MODEL_BUILT,
        Stage::Train,
        "day-to-day model built",
        reference = trained.reference.len(),
        taps = config.taps.len()
    );

    let filter = ParticleFilter::new(&config.filter, &config.taps, &trained.model)?;
    log_event!(
        ctx,
        INFO,
        event_names::FILTER_STARTED,
        Stage::Filter,
        "filtering",
        particles = config.filter.particle_count,
        steps = observations.len()
    );
    let run = filter.run(rng, &observations)?;
    log_event!(
        ctx,
        INFO,
        event_names::FILTER_FINISHED,
        Stage::Filter,
        "filter finished",
        log_evidence = run.log_evidence
    );

    let classifications = classify_events(&run, &config.events, windowed.dates());
    let summary = DetectionSummary::from_classifications(&classifications);
    log_event!(
        ctx,
        INFO,
        event_names::EVENTS_CLASSIFIED,
        Stage::Classify,
        "steps classified",
        events = summary.events,
        drops = summary.drops,
        rises = summary.rises
    );

    Ok(DetectionReport {
        entity: entity.clone(),
        first_date: windowed.dates().first().cloned(),
        last_date: windowed.dates().last().cloned(),
        taps: config.taps.iter().map(|t| t.0).collect(),
        reference: trained.reference,
        summary,
        classifications,
        run,
    })
}

/// SHA-256 of raw input bytes, hex encoded.
pub fn hash_input(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn set() -> SeriesSet {
        let dates: Vec<String> = (0..20).map(|i| format!("2024-03-{:02}", i + 1)).collect();
        let mut s = SeriesSet::new(dates);
        s.insert("de", (0..20).map(|i| Some(1000 + (i % 3) * 10)).collect())
            .unwrap();
        s.insert("fr", (0..20).map(|i| Some(800 + (i % 4) * 10)).collect())
            .unwrap();
        s.insert("ir", (0..20).map(|i| if i == 5 { None } else { Some(60) }).collect())
            .unwrap();
        s.insert("all", vec![Some(5000); 20]).unwrap();
        s
    }

    #[test]
    fn reference_excludes_aggregates() {
        let mut rng = StdRng::seed_from_u64(1);
        let trained = train_model(&mut rng, &set(), &TapSet::default(), &ModelConfig::default()).unwrap();
        assert!(!trained.reference.iter().any(|k| k.as_str() == "all"));
        assert_eq!(trained.reference.len(), 3);
        assert_eq!(trained.model.len(), 20);
    }

    #[test]
    fn detect_respects_window() {
        let mut config = DetectorConfig::default();
        config.window_days = Some(10);
        config.filter.particle_count = 100;
        let mut rng = StdRng::seed_from_u64(2);
        let ctx = LogContext::new("run-test");
        let report = detect(&mut rng, &set(), &EntityKey::from("ir"), &config, &ctx).unwrap();
        assert_eq!(report.run.steps.len(), 10);
        assert_eq!(report.first_date.as_deref(), Some("2024-03-11"));
        assert_eq!(report.classifications.len(), 10);
        assert_eq!(report.taps, vec![1, 7]);
    }

    #[test]
    fn unknown_entity_is_input_error() {
        let mut rng = StdRng::seed_from_u64(3);
        let ctx = LogContext::new("run-test");
        let err = detect(&mut rng, &set(), &EntityKey::from("xx"), &DetectorConfig::default(), &ctx)
            .unwrap_err();
        assert_eq!(err.code(), 22);
    }

    #[test]
    fn input_hash_is_stable_hex() {
        let h = hash_input(b"{}");
        assert_eq!(h.len(), 64);
        assert_eq!(h, hash_input(b"{}"));
    }
}
