//! Particle filter knobs.
//!
//! The `*_prior` fields describe the model: how often suppression and tap
//! switches are believed to happen. The `*_sample_prob` fields describe the
//! proposal: how often candidates are generated with suppression on or with a
//! redrawn tap. Importance weights correct for the difference, so the sample
//! probabilities only trade variance for coverage.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Configuration of one particle filter run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FilterConfig {
    /// Population size kept after every resampling step.
    #[serde(default = "default_particle_count")]
    pub particle_count: usize,

    /// Candidates generated per ancestor before resampling.
    #[serde(default = "default_multiplicity")]
    pub multiplicity: usize,

    /// Multiplier on the model std-dev for ordinary variation.
    #[serde(default = "default_normal_std_factor")]
    pub normal_std_factor: f64,

    /// Multiplier on the model std-dev while a lineage is suppressed.
    #[serde(default = "default_censorship_std_factor")]
    pub censorship_std_factor: f64,

    /// Model probability that a step is suppressed.
    #[serde(default = "default_censorship_prior")]
    pub censorship_prior: f64,

    /// Model probability that a lineage switches tap.
    #[serde(default = "default_change_tap_prior")]
    pub change_tap_prior: f64,

    /// Proposal probability of flagging a candidate as suppressed.
    #[serde(default = "default_censorship_sample_prob")]
    pub censorship_sample_prob: f64,

    /// Proposal probability of redrawing a candidate's tap.
    #[serde(default = "default_change_tap_sample_prob")]
    pub change_tap_sample_prob: f64,

    /// Negative rate proposals are redrawn at most this many times.
    #[serde(default = "default_max_proposal_retries")]
    pub max_proposal_retries: u32,

    /// Seed for the run's random source. None draws one from the OS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_particle_count() -> usize {
    1000
}
fn default_multiplicity() -> usize {
    1
}
fn default_normal_std_factor() -> f64 {
    4.0
}
fn default_censorship_std_factor() -> f64 {
    50.0
}
fn default_censorship_prior() -> f64 {
    0.01
}
fn default_change_tap_prior() -> f64 {
    0.1
}
fn default_censorship_sample_prob() -> f64 {
    0.3
}
fn default_change_tap_sample_prob() -> f64 {
    0.2
}
fn default_max_proposal_retries() -> u32 {
    10_000
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            particle_count: default_particle_count(),
            multiplicity: default_multiplicity(),
            normal_std_factor: default_normal_std_factor(),
            censorship_std_factor: default_censorship_std_factor(),
            censorship_prior: default_censorship_prior(),
            change_tap_prior: default_change_tap_prior(),
            censorship_sample_prob: default_censorship_sample_prob(),
            change_tap_sample_prob: default_change_tap_sample_prob(),
            max_proposal_retries: default_max_proposal_retries(),
            seed: None,
        }
    }
}

impl FilterConfig {
    /// Number of candidates in the pre-resample pool.
    pub fn pool_size(&self) -> usize {
        self.particle_count.saturating_mul(self.multiplicity)
    }

    /// Log-weight correction for a candidate's suppression flag.
    pub fn log_censor_correction(&self, censored: bool) -> f64 {
        if censored {
            (self.censorship_prior / self.censorship_sample_prob).ln()
        } else {
            ((1.0 - self.censorship_prior) / (1.0 - self.censorship_sample_prob)).ln()
        }
    }

    /// Proposal probability that a candidate ends up on its parent's tap.
    ///
    /// A redraw can land on the same tap, so this is
    /// `(1 - change_tap_sample_prob) + change_tap_sample_prob / tap_count`.
    pub fn tap_keep_prob(&self, tap_count: usize) -> f64 {
        let n = tap_count.max(1) as f64;
        (1.0 - self.change_tap_sample_prob) + self.change_tap_sample_prob / n
    }

    /// Log-weight correction for keeping or switching a tap.
    pub fn log_tap_correction(&self, kept: bool, tap_count: usize) -> f64 {
        let keep = self.tap_keep_prob(tap_count);
        if kept {
            ((1.0 - self.change_tap_prior) / keep).ln()
        } else {
            (self.change_tap_prior / (1.0 - keep)).ln()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = FilterConfig::default();
        assert_eq!(c.particle_count, 1000);
        assert_eq!(c.multiplicity, 1);
        assert_eq!(c.pool_size(), 1000);
        assert_eq!(c.max_proposal_retries, 10_000);
        assert!(c.seed.is_none());
    }

    #[test]
    fn censor_correction_values() {
        let c = FilterConfig::default();
        let on = c.log_censor_correction(true).exp();
        let off = c.log_censor_correction(false).exp();
        assert!((on - 0.01 / 0.3).abs() < 1e-12);
        assert!((off - 0.99 / 0.7).abs() < 1e-12);
    }

    #[test]
    fn tap_correction_values() {
        let c = FilterConfig::default();
        // Two taps: keep = 0.8 + 0.1 = 0.9.
        assert!((c.tap_keep_prob(2) - 0.9).abs() < 1e-12);
        assert!((c.log_tap_correction(true, 2).exp() - 0.9 / 0.9).abs() < 1e-12);
        assert!((c.log_tap_correction(false, 2).exp() - 0.1 / 0.1).abs() < 1e-9);
        // One tap: a candidate always keeps it.
        assert!((c.tap_keep_prob(1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: FilterConfig = serde_json::from_str(r#"{"particle_count": 200, "seed": 7}"#).unwrap();
        assert_eq!(c.particle_count, 200);
        assert_eq!(c.seed, Some(7));
        assert_eq!(c.normal_std_factor, 4.0);
    }
}
