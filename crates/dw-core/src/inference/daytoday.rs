//! Day-to-day variation model.
//!
//! For each tap `d` and position `i`, the model describes how much a rate
//! normally changes from day `i - d` to day `i`, as the fractional change
//! `(r[i] - r[i-d]) / r[i-d]` pooled across a basket of reference entities.
//!
//! # Fitting one position
//!
//! The pooled changes are sorted and the lowest and highest
//! `trim_percent` are dropped by rank; the model is the mean and population
//! std-dev of what remains. This makes the fit robust to a few reference
//! entities that are themselves disrupted on that day.
//!
//! Positions with fewer than two pooled values get the default model. So
//! does a position whose trimmed mean is implausibly large (more than
//! `outlier_mean_bound` in magnitude), which indicates a data glitch across
//! the whole basket rather than real variation.
//!
//! Positions `i < d` have no model: there is no day `i - d` to compare with.
//! A proposal that still lands there (a redrawn tap longer than the elapsed
//! history) uses the fallback parameters.

use dw_common::{EntityKey, Error, Result, Tap};
use dw_config::{ModelConfig, TapSet};
use dw_math::{mean, population_std, sort_ascending, trim_by_rank};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::logging::event_names;

/// Normal distribution parameters of the fractional change at one position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NormalParams {
    pub mean: f64,
    pub std: f64,
}

impl NormalParams {
    pub fn new(mean: f64, std: f64) -> Self {
        NormalParams { mean, std }
    }
}

impl From<(f64, f64)> for NormalParams {
    fn from((mean, std): (f64, f64)) -> Self {
        NormalParams { mean, std }
    }
}

/// How a position's parameters were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FitSource {
    /// Trimmed mean/std of the pooled changes.
    Fitted,
    /// Fewer than two pooled values.
    TooFewValues,
    /// Trimmed mean beyond the outlier bound.
    Outlier,
}

/// Per-tap, per-position table of [`NormalParams`].
///
/// Built once before filtering and only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayToDayModel {
    len: usize,
    fallback: NormalParams,
    tables: BTreeMap<Tap, Vec<Option<NormalParams>>>,
}

impl DayToDayModel {
    /// A table with the same parameters at every valid position.
    pub fn uniform(taps: &TapSet, len: usize, params: NormalParams) -> Self {
        let tables = taps
            .iter()
            .map(|tap| {
                let row = (0..len)
                    .map(|i| (i >= tap.days()).then_some(params))
                    .collect();
                (tap, row)
            })
            .collect();
        DayToDayModel {
            len,
            fallback: params,
            tables,
        }
    }

    /// Parameters for `tap` at `position`.
    pub fn get(&self, tap: Tap, position: usize) -> Result<NormalParams> {
        self.tables
            .get(&tap)
            .and_then(|row| row.get(position).copied().flatten())
            .ok_or(Error::ModelPositionUnavailable {
                tap: tap.0,
                position,
            })
    }

    /// Parameters for a rate proposal at `position` with `tap`.
    ///
    /// Like [`get`](Self::get), but a position before the tap's first model
    /// yields the fallback parameters. Unknown taps and positions past the
    /// end are still errors.
    pub fn proposal_params(&self, tap: Tap, position: usize) -> Result<NormalParams> {
        match self.tables.get(&tap) {
            Some(row) if position < self.len => Ok(row[position].unwrap_or(self.fallback)),
            _ => Err(Error::ModelPositionUnavailable {
                tap: tap.0,
                position,
            }),
        }
    }

    /// Number of positions covered.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Taps the model was built for.
    pub fn taps(&self) -> impl Iterator<Item = Tap> + '_ {
        self.tables.keys().copied()
    }

    /// Whether the model covers every tap in `taps`.
    pub fn covers(&self, taps: &TapSet) -> bool {
        taps.iter().all(|t| self.tables.contains_key(&t))
    }
}

/// Fractional changes of a rate series at lag `delay`.
///
/// Position `i` is `(r[i] - r[i-delay]) / r[i-delay]` when both rates are
/// present and the earlier one is non-zero, else `None`.
pub fn fractional_changes(rates: &[Option<f64>], delay: usize) -> Vec<Option<f64>> {
    (0..rates.len())
        .map(|i| {
            let prev = rates[i.checked_sub(delay)?]?;
            let cur = rates[i]?;
            if prev == 0.0 {
                return None;
            }
            Some((cur - prev) / prev)
        })
        .collect()
}

/// Fits a [`DayToDayModel`] from reference rate series.
#[derive(Debug, Clone)]
pub struct ModelBuilder<'a> {
    config: &'a ModelConfig,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(config: &'a ModelConfig) -> Self {
        ModelBuilder { config }
    }

    /// Fit one position from its pooled fractional changes.
    pub fn fit_position(&self, mut values: Vec<f64>) -> (NormalParams, FitSource) {
        let default = NormalParams::from(self.config.default_params());
        if values.len() < 2 {
            return (default, FitSource::TooFewValues);
        }
        sort_ascending(&mut values);
        let kept = trim_by_rank(&values, self.config.trim_percent);
        if kept.is_empty() {
            return (default, FitSource::TooFewValues);
        }
        let m = mean(kept);
        if m.abs() > self.config.outlier_mean_bound {
            return (default, FitSource::Outlier);
        }
        (NormalParams::new(m, population_std(kept)), FitSource::Fitted)
    }

    /// Build the model for every tap over `len` positions.
    ///
    /// Every reference series must have length `len`. With no references
    /// every valid position gets the default model.
    pub fn build(
        &self,
        reference: &[(EntityKey, Vec<Option<f64>>)],
        len: usize,
        taps: &TapSet,
    ) -> Result<DayToDayModel> {
        for (key, rates) in reference {
            if rates.len() != len {
                return Err(Error::MisalignedSeries {
                    entity: key.to_string(),
                    expected: len,
                    actual: rates.len(),
                });
            }
        }

        let mut tables = BTreeMap::new();
        for tap in taps.iter() {
            let d = tap.days();
            let changes: Vec<Vec<Option<f64>>> = reference
                .iter()
                .map(|(_, rates)| fractional_changes(rates, d))
                .collect();

            let mut row = Vec::with_capacity(len);
            for i in 0..len {
                if i < d {
                    row.push(None);
                    continue;
                }
                let pooled: Vec<f64> = changes.iter().filter_map(|c| c[i]).collect();
                let (params, source) = self.fit_position(pooled);
                if source == FitSource::Outlier {
                    warn!(
                        target: event_names::MODEL_OUTLIER,
                        tap = tap.0,
                        position = i,
                        "trimmed mean beyond ±{}; using default model",
                        self.config.outlier_mean_bound
                    );
                }
                row.push(Some(params));
            }
            tables.insert(tap, row);
        }

        Ok(DayToDayModel {
            len,
            fallback: NormalParams::from(self.config.default_params()),
            tables,
        })
    }
}
