//! Particles, the append-only history of populations, and lineage traceback.
//!
//! A particle is immutable once its population is pushed. Parent links name a
//! particle of the previous step by its slot, so the history is an arena
//! indexed by `(Step, ParticleId)` whose links only point backwards.

use dw_common::{Error, ParticleId, Result, Step, Tap};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One hypothesis about the latent state at one step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Particle {
    /// Slot within its step's population.
    #[schemars(with = "u32")]
    pub id: ParticleId,
    /// Latent true rate.
    pub rate: f64,
    /// Suppressed at this step.
    pub censored: bool,
    /// Slot of the ancestor at the previous step; None at step 0.
    #[schemars(with = "Option<u32>")]
    pub parent: Option<ParticleId>,
    /// Step the particle was created at.
    #[schemars(with = "usize")]
    pub step: Step,
    /// Lag used for this step's rate evolution.
    #[schemars(with = "u32")]
    pub tap: Tap,
    /// Suppressed at this step or anywhere in the span its rate was derived from.
    pub cumulative: bool,
}

/// Result of walking a lineage back in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Traceback<'a> {
    /// The ancestor reached, or None when the walk would leave the history.
    pub ancestor: Option<&'a Particle>,
    /// OR of the `censored` flags of every particle visited, both ends included.
    pub censored: bool,
    /// Step of the ancestor (0 when there is none).
    pub boundary: Step,
}

/// All populations of a run, in step order.
#[derive(Debug, Clone, Default)]
pub struct ParticleHistory {
    populations: Vec<Vec<Particle>>,
}

impl ParticleHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the population of the next step, returning that step.
    pub fn push(&mut self, population: Vec<Particle>) -> Step {
        self.populations.push(population);
        Step(self.populations.len() - 1)
    }

    /// Number of steps recorded.
    pub fn len(&self) -> usize {
        self.populations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.populations.is_empty()
    }

    /// Population at `step`.
    pub fn population(&self, step: Step) -> Option<&[Particle]> {
        self.populations.get(step.0).map(Vec::as_slice)
    }

    /// Particle `id` at `step`.
    pub fn particle(&self, step: Step, id: ParticleId) -> Option<&Particle> {
        self.populations.get(step.0)?.get(id.index())
    }

    /// Iterate populations in step order.
    pub fn iter(&self) -> impl Iterator<Item = &[Particle]> {
        self.populations.iter().map(Vec::as_slice)
    }

    /// Follow parent links `delay` times from particle `id` at `step`.
    ///
    /// Returns "no ancestor" when `step - delay` is before the start of the
    /// history. With `delay == 0` the particle itself is returned with its
    /// own flag. Runs in O(delay).
    pub fn traceback(&self, step: Step, id: ParticleId, delay: usize) -> Result<Traceback<'_>> {
        let Some(boundary) = step.back(delay) else {
            return Ok(Traceback {
                ancestor: None,
                censored: false,
                boundary: Step(0),
            });
        };

        let mut current = self.particle(step, id).ok_or_else(|| broken(step, id))?;
        let mut censored = current.censored;
        for _ in 0..delay {
            let parent = current.parent.ok_or_else(|| broken(current.step, current.id))?;
            let parent_step = current.step.back(1).ok_or_else(|| broken(current.step, current.id))?;
            current = self
                .particle(parent_step, parent)
                .ok_or_else(|| broken(parent_step, parent))?;
            censored |= current.censored;
        }

        Ok(Traceback {
            ancestor: Some(current),
            censored,
            boundary,
        })
    }
}

fn broken(step: Step, id: ParticleId) -> Error {
    Error::Inference(format!("lineage broken at {} {}", step, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(step: usize, id: u32, parent: Option<u32>, censored: bool) -> Particle {
        Particle {
            id: ParticleId(id),
            rate: 10.0 + step as f64,
            censored,
            parent: parent.map(ParticleId),
            step: Step(step),
            tap: Tap(1),
            cumulative: censored,
        }
    }

    /// A single chain 0 ← 1 ← 2 ← 3 with suppression only at step 1.
    fn chain() -> ParticleHistory {
        let mut h = ParticleHistory::new();
        h.push(vec![particle(0, 0, None, false)]);
        h.push(vec![particle(1, 0, Some(0), true)]);
        h.push(vec![particle(2, 0, Some(0), false)]);
        h.push(vec![particle(3, 0, Some(0), false)]);
        h
    }

    #[test]
    fn delay_zero_is_identity() {
        let h = chain();
        let tb = h.traceback(Step(1), ParticleId(0), 0).unwrap();
        assert_eq!(tb.ancestor, h.particle(Step(1), ParticleId(0)));
        assert!(tb.censored);
        assert_eq!(tb.boundary, Step(1));

        let tb = h.traceback(Step(3), ParticleId(0), 0).unwrap();
        assert!(!tb.censored);
    }

    #[test]
    fn delay_beyond_history_has_no_ancestor() {
        let h = chain();
        let tb = h.traceback(Step(2), ParticleId(0), 3).unwrap();
        assert!(tb.ancestor.is_none());
        assert!(!tb.censored);
        assert_eq!(tb.boundary, Step(0));
    }

    #[test]
    fn flag_includes_both_endpoints() {
        let h = chain();
        // 3 → 2 → 1: step 1 is the far endpoint.
        let tb = h.traceback(Step(3), ParticleId(0), 2).unwrap();
        assert_eq!(tb.ancestor.map(|p| p.step), Some(Step(1)));
        assert!(tb.censored);
        // 3 → 2: neither is flagged.
        let tb = h.traceback(Step(3), ParticleId(0), 1).unwrap();
        assert!(!tb.censored);
        // 1 → 0: the start is flagged.
        let tb = h.traceback(Step(1), ParticleId(0), 1).unwrap();
        assert_eq!(tb.boundary, Step(0));
        assert!(tb.censored);
    }

    #[test]
    fn missing_particle_is_an_error() {
        let h = chain();
        assert!(h.traceback(Step(2), ParticleId(5), 1).is_err());
    }
}
