//! Particle filter for suppression detection.
//!
//! Each particle carries a latent rate, a tap (the lag its rate evolved
//! over), and two suppression flags. The filter runs once over a daily
//! series and keeps every population, so that lineages can be walked back.
//!
//! # Algorithm Overview
//!
//! At step 0, `particle_count` rates are drawn from Gamma(max(1, obs₀), 1)
//! with uniformly drawn taps.
//!
//! At each later step `t`, every particle `p` of step `t-1`:
//! 1. **Traceback**: walks `p.tap - 1` links back, landing on step `t - p.tap`,
//!    and ORs the suppression flags along the way.
//! 2. **Propose**: `multiplicity` candidates, each with a tap (kept, or
//!    redrawn with `change_tap_sample_prob`), a suppression flag (set with
//!    `censorship_sample_prob`), and a rate
//!    `ancestor.rate × (1 + x)`, `x ~ N(μ, σ·factor)` from the day-to-day model
//!    at `(tap, t)`. The wide `censorship_std_factor` applies when the
//!    candidate or the traced span is suppressed. Negative rates are redrawn.
//! 3. **Weight**: Poisson likelihood of `obs[t]`, times the prior/proposal
//!    ratio of the suppression flag, times the prior/proposal ratio of the
//!    tap decision. Weights live in the log domain until normalized by their
//!    maximum.
//! 4. **Resample**: `particle_count` multinomial draws form population `t`.
//!
//! # Example
//!
//! ```ignore
//! use dw_core::inference::{DayToDayModel, NormalParams, ParticleFilter};
//!
//! let model = DayToDayModel::uniform(&taps, series.len(), NormalParams::new(0.0, 0.02));
//! let filter = ParticleFilter::new(&config, &taps, &model)?;
//! let run = filter.run(&mut rng, &series)?;
//! for step in &run.steps {
//!     println!("{} {}", step.step, step.censored_count);
//! }
//! ```

use dw_common::{Error, ParticleId, Result, Step, Tap};
use dw_config::validate::validate_filter;
use dw_config::{FilterConfig, TapSet};
use dw_math::{
    log_sum_exp, normalize_log_weights, poisson_log_pmf, rank_percentile, sample_gamma,
    sample_normal, sort_ascending,
};
use rand::Rng;
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::daytoday::{DayToDayModel, NormalParams};
use super::particle::{Particle, ParticleHistory};
use super::resample::{effective_sample_size, resample};
use crate::logging::event_names;

/// Predicted range of the rate under normal (unsuppressed) variation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, JsonSchema)]
pub struct Band {
    /// 1st percentile.
    pub low: f64,
    /// 50th percentile.
    pub median: f64,
    /// 99th percentile.
    pub high: f64,
}

impl Band {
    /// A band of zero width at `value`.
    pub fn point(value: f64) -> Self {
        Band {
            low: value,
            median: value,
            high: value,
        }
    }

    /// Halfway between the low and high percentiles.
    pub fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }
}

/// Statistics of one step, taken from the resampled population unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct StepSummary {
    pub step: usize,
    /// Observation the step was weighted against.
    pub observation: Option<u64>,
    /// Particles suppressed at this step.
    pub censored_count: usize,
    /// Particles with the cumulative suppression flag.
    pub cumulative_count: usize,
    /// Population size.
    pub population: usize,
    pub mean_rate: f64,
    /// Particles per tap (in days).
    pub tap_histogram: BTreeMap<u32, usize>,
    /// Percentiles of the unsuppressed candidates before resampling.
    pub band: Option<Band>,
    /// Distinct parents among the population (0 at step 0).
    pub diversity: usize,
    /// Effective sample size of the candidate weights.
    pub effective_sample_size: f64,
    /// Log of the mean unnormalized candidate weight (0 at step 0).
    pub log_evidence: f64,
}

impl StepSummary {
    /// Fraction of the population suppressed at this step.
    pub fn censored_fraction(&self) -> f64 {
        fraction(self.censored_count, self.population)
    }

    /// Fraction of the population with the cumulative flag.
    pub fn cumulative_fraction(&self) -> f64 {
        fraction(self.cumulative_count, self.population)
    }
}

fn fraction(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Output of a complete filter run.
#[derive(Debug, Clone, Serialize)]
pub struct FilterRun {
    /// One summary per step, in step order.
    pub steps: Vec<StepSummary>,
    /// Sum of the per-step log evidence.
    pub log_evidence: f64,
    /// Every population of the run.
    #[serde(skip)]
    pub history: ParticleHistory,
}

/// A candidate before resampling.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    particle: Particle,
    log_weight: f64,
}

/// Particle filter over one series.
#[derive(Debug, Clone)]
pub struct ParticleFilter<'a> {
    config: &'a FilterConfig,
    taps: &'a TapSet,
    model: &'a DayToDayModel,
}

impl<'a> ParticleFilter<'a> {
    /// Create a filter, checking the configuration and that the model covers every tap.
    pub fn new(config: &'a FilterConfig, taps: &'a TapSet, model: &'a DayToDayModel) -> Result<Self> {
        validate_filter(config)?;
        if taps.is_empty() {
            return Err(Error::InvalidTaps("at least one tap is required".to_string()));
        }
        if !model.covers(taps) {
            return Err(Error::InvalidTaps(format!(
                "model was built for taps {:?}, filter asked for {}",
                model.taps().map(|t| t.0).collect::<Vec<_>>(),
                taps
            )));
        }
        Ok(ParticleFilter {
            config,
            taps,
            model,
        })
    }

    /// Run over a gap-free series.
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R, observations: &[u64]) -> Result<FilterRun> {
        let raw: Vec<Option<u64>> = observations.iter().copied().map(Some).collect();
        self.run_raw(rng, &raw)
    }

    /// Run over a series that may contain gaps.
    ///
    /// A missing observation contributes no likelihood; the step is weighted
    /// by the flag and tap corrections alone.
    pub fn run_raw<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        observations: &[Option<u64>],
    ) -> Result<FilterRun> {
        let mut history = ParticleHistory::new();
        let mut steps = Vec::with_capacity(observations.len());
        let mut log_evidence = 0.0;

        let Some(first) = observations.first() else {
            return Ok(FilterRun {
                steps,
                log_evidence,
                history,
            });
        };

        let initial = self.initialize(rng, *first);
        let band = first.map(|o| Band::point(o as f64));
        // Step 0 is unweighted: every particle counts fully.
        let ess = initial.len() as f64;
        steps.push(summarize(Step(0), *first, &initial, band, ess, 0.0));
        history.push(initial);

        for (t, obs) in observations.iter().enumerate().skip(1) {
            let step = Step(t);
            let candidates = self.propose(rng, &history, step, *obs)?;

            let log_weights: Vec<f64> = candidates.iter().map(|c| c.log_weight).collect();
            let weights = normalize_log_weights(&log_weights);
            let step_evidence = log_sum_exp(&log_weights) - (candidates.len() as f64).ln();
            let ess = effective_sample_size(&weights);
            let band = normal_band(&candidates);

            let picks = resample(rng, &weights, self.config.particle_count, t)?;
            let population: Vec<Particle> = picks
                .into_iter()
                .enumerate()
                .map(|(slot, idx)| Particle {
                    id: ParticleId(slot as u32),
                    ..candidates[idx].particle
                })
                .collect();

            let summary = summarize(step, *obs, &population, band, ess, step_evidence);
            debug!(
                target: event_names::FILTER_STEP,
                step = t,
                observation = ?obs,
                censored = summary.censored_count,
                cumulative = summary.cumulative_count,
                mean_rate = summary.mean_rate,
                band_low = band.map(|b| b.low),
                band_high = band.map(|b| b.high),
                diversity = summary.diversity,
                ess = ess,
                "step filtered"
            );

            log_evidence += step_evidence;
            steps.push(summary);
            history.push(population);
        }

        Ok(FilterRun {
            steps,
            log_evidence,
            history,
        })
    }

    /// Population of step 0.
    fn initialize<R: Rng + ?Sized>(&self, rng: &mut R, first: Option<u64>) -> Vec<Particle> {
        let shape = first.unwrap_or(1).max(1) as f64;
        (0..self.config.particle_count)
            .map(|i| Particle {
                id: ParticleId(i as u32),
                rate: sample_gamma(rng, shape, 1.0),
                censored: false,
                parent: None,
                step: Step(0),
                tap: self.random_tap(rng),
                cumulative: false,
            })
            .collect()
    }

    /// Expand the population of `step - 1` into weighted candidates for `step`.
    fn propose<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        history: &ParticleHistory,
        step: Step,
        observation: Option<u64>,
    ) -> Result<Vec<Candidate>> {
        let prev_step = Step(step.0 - 1);
        let previous = history
            .population(prev_step)
            .ok_or_else(|| Error::Inference(format!("no population at {}", prev_step)))?;

        let mut candidates = Vec::with_capacity(self.config.pool_size());
        for p in previous {
            let traced = history.traceback(prev_step, p.id, p.tap.days().saturating_sub(1))?;

            for _ in 0..self.config.multiplicity {
                let tap = if rng.random::<f64>() < self.config.change_tap_sample_prob {
                    self.random_tap(rng)
                } else {
                    p.tap
                };
                let censored = rng.random::<f64>() < self.config.censorship_sample_prob;
                let cumulative = censored || traced.censored;

                let rate = match traced.ancestor {
                    None => p.rate,
                    Some(ancestor) => {
                        let params = self.model.proposal_params(tap, step.0)?;
                        let factor = if cumulative {
                            self.config.censorship_std_factor
                        } else {
                            self.config.normal_std_factor
                        };
                        self.propose_rate(rng, ancestor.rate, params, factor, step)?
                    }
                };

                let mut log_weight = self.config.log_censor_correction(censored)
                    + self.config.log_tap_correction(tap == p.tap, self.taps.len());
                if let Some(k) = observation {
                    log_weight += poisson_log_pmf(k, rate);
                }

                candidates.push(Candidate {
                    particle: Particle {
                        id: p.id,
                        rate,
                        censored,
                        parent: Some(p.id),
                        step,
                        tap,
                        cumulative,
                    },
                    log_weight,
                });
            }
        }
        Ok(candidates)
    }

    /// Draw `base × (1 + x)` until it is non-negative.
    fn propose_rate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        base: f64,
        params: NormalParams,
        factor: f64,
        step: Step,
    ) -> Result<f64> {
        let std = params.std * factor;
        for _ in 0..self.config.max_proposal_retries {
            let rate = base * (1.0 + sample_normal(rng, params.mean, std));
            if rate >= 0.0 {
                return Ok(rate);
            }
        }
        Err(Error::ProposalExhausted {
            step: step.0,
            retries: self.config.max_proposal_retries,
        })
    }

    fn random_tap<R: Rng + ?Sized>(&self, rng: &mut R) -> Tap {
        let taps = self.taps.as_slice();
        taps[rng.random_range(0..taps.len())]
    }
}

/// 1st/50th/99th rank percentiles of the unsuppressed candidates' rates.
fn normal_band(candidates: &[Candidate]) -> Option<Band> {
    let mut rates: Vec<f64> = candidates
        .iter()
        .filter(|c| !c.particle.censored)
        .map(|c| c.particle.rate)
        .collect();
    sort_ascending(&mut rates);
    Some(Band {
        low: rank_percentile(&rates, 1)?,
        median: rank_percentile(&rates, 50)?,
        high: rank_percentile(&rates, 99)?,
    })
}

fn summarize(
    step: Step,
    observation: Option<u64>,
    population: &[Particle],
    band: Option<Band>,
    effective_sample_size: f64,
    log_evidence: f64,
) -> StepSummary {
    let mut tap_histogram = BTreeMap::new();
    for p in population {
        *tap_histogram.entry(p.tap.0).or_insert(0) += 1;
    }
    let parents: BTreeSet<ParticleId> = population.iter().filter_map(|p| p.parent).collect();
    let mean_rate = if population.is_empty() {
        0.0
    } else {
        population.iter().map(|p| p.rate).sum::<f64>() / population.len() as f64
    };

    StepSummary {
        step: step.0,
        observation,
        censored_count: population.iter().filter(|p| p.censored).count(),
        cumulative_count: population.iter().filter(|p| p.cumulative).count(),
        population: population.len(),
        mean_rate,
        tap_histogram,
        band,
        diversity: parents.len(),
        effective_sample_size,
        log_evidence,
    }
}
