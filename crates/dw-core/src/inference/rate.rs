//! Rate inference: from an observed count to a plausible underlying rate.
//!
//! An observed count `c` is treated as one Poisson draw from an unknown rate
//! λ. Under a flat prior the posterior of λ is Gamma(c + 1, 1); we sample
//! Gamma(c, 1), whose mean is exactly the observation, so that inferred rates
//! are unbiased around the data.
//!
//! A zero count has no Gamma(0, 1); a small shape ([`ZERO_COUNT_SHAPE`]) is
//! used instead. Such draws can underflow to `0.0`, so every sample is floored
//! at the smallest positive normal `f64`.

use dw_math::sample_gamma;
use rand::Rng;

/// Gamma shape used in place of zero for a zero count.
pub const ZERO_COUNT_SHAPE: f64 = 0.001;

/// Sample a rate for one observation. `None` stays `None`.
pub fn infer_rate<R: Rng + ?Sized>(rng: &mut R, count: Option<u64>) -> Option<f64> {
    let count = count?;
    let shape = if count == 0 {
        ZERO_COUNT_SHAPE
    } else {
        count as f64
    };
    Some(sample_gamma(rng, shape, 1.0).max(f64::MIN_POSITIVE))
}

/// Sample a rate for every position of a series.
pub fn infer_series<R: Rng + ?Sized>(rng: &mut R, counts: &[Option<u64>]) -> Vec<Option<f64>> {
    counts.iter().map(|c| infer_rate(rng, *c)).collect()
}

/// Rates for model training: zero counts are treated as gaps.
///
/// An entity reporting zero has no meaningful fractional change from or to
/// that day, so training drops those positions rather than feeding the model
/// near-zero denominators.
pub fn infer_training_series<R: Rng + ?Sized>(
    rng: &mut R,
    counts: &[Option<u64>],
) -> Vec<Option<f64>> {
    counts
        .iter()
        .map(|c| match c {
            Some(0) | None => None,
            Some(_) => infer_rate(rng, *c),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn zero_count_is_strictly_positive() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10_000 {
            let r = infer_rate(&mut rng, Some(0)).unwrap();
            assert!(r > 0.0 && r.is_finite(), "rate {}", r);
        }
    }

    #[test]
    fn missing_propagates() {
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(infer_rate(&mut rng, None), None);
        let rates = infer_series(&mut rng, &[Some(5), None, Some(0)]);
        assert!(rates[0].is_some());
        assert!(rates[1].is_none());
        assert!(rates[2].unwrap() > 0.0);
    }

    #[test]
    fn training_drops_zeros() {
        let mut rng = StdRng::seed_from_u64(3);
        let rates = infer_training_series(&mut rng, &[Some(5), Some(0), None]);
        assert!(rates[0].is_some());
        assert_eq!(&rates[1..], &[None, None]);
    }

    #[test]
    fn rates_center_on_observation() {
        let mut rng = StdRng::seed_from_u64(4);
        let n = 20_000;
        let mean: f64 = (0..n)
            .map(|_| infer_rate(&mut rng, Some(200)).unwrap())
            .sum::<f64>()
            / n as f64;
        // Gamma(200, 1): std 14.1, standard error of the mean ~0.1.
        assert!((mean - 200.0).abs() < 1.0, "mean {}", mean);
    }
}
