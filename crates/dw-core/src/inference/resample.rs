//! Multinomial resampling of a weighted candidate pool.

use dw_common::{Error, Result};
use rand::Rng;

/// Draw `count` indices with replacement, each with probability proportional
/// to its weight.
///
/// Each draw takes `u` uniform in `[0, total)` and selects the first index
/// whose cumulative weight is at least `u`. Weights must be non-negative; a
/// total that is not finite and positive fails with `DegenerateWeights`.
pub fn resample<R: Rng + ?Sized>(
    rng: &mut R,
    weights: &[f64],
    count: usize,
    step: usize,
) -> Result<Vec<usize>> {
    let mut cumulative = Vec::with_capacity(weights.len());
    let mut total = 0.0;
    for w in weights {
        total += w;
        cumulative.push(total);
    }

    if !(total.is_finite() && total > 0.0) {
        return Err(Error::DegenerateWeights { step, total });
    }

    Ok((0..count)
        .map(|_| {
            let u = rng.random::<f64>() * total;
            cumulative.partition_point(|&c| c < u)
        })
        .collect())
}

/// Effective sample size `(Σw)² / Σw²` of a weight vector.
pub fn effective_sample_size(weights: &[f64]) -> f64 {
    let sum: f64 = weights.iter().sum();
    let sum_sq: f64 = weights.iter().map(|w| w * w).sum();
    if sum_sq > 0.0 {
        sum * sum / sum_sq
    } else {
        0.0
    }
}
