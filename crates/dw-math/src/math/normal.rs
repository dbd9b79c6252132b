//! Normal distribution sampling.

use rand::Rng;

/// Draw from N(0, 1) with the Marsaglia polar method.
pub fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    loop {
        let u = 2.0 * rng.random::<f64>() - 1.0;
        let v = 2.0 * rng.random::<f64>() - 1.0;
        let s = u * u + v * v;
        if s > 0.0 && s < 1.0 {
            return u * (-2.0 * s.ln() / s).sqrt();
        }
    }
}

/// Draw from N(mean, std²).
///
/// A zero standard deviation returns the mean; negative or NaN parameters
/// return NaN.
pub fn sample_normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, std: f64) -> f64 {
    if mean.is_nan() || std.is_nan() || std < 0.0 {
        return f64::NAN;
    }
    if std == 0.0 {
        return mean;
    }
    mean + std * sample_standard_normal(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn standard_normal_moments() {
        let mut rng = StdRng::seed_from_u64(99);
        let n = 50_000;
        let xs: Vec<f64> = (0..n).map(|_| sample_standard_normal(&mut rng)).collect();
        let mean = xs.iter().sum::<f64>() / n as f64;
        let var = xs.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.03, "mean {}", mean);
        assert!((var - 1.0).abs() < 0.05, "variance {}", var);
    }

    #[test]
    fn shifted_and_scaled() {
        let mut rng = StdRng::seed_from_u64(4);
        let n = 20_000;
        let mean = (0..n)
            .map(|_| sample_normal(&mut rng, -0.3, 0.1))
            .sum::<f64>()
            / n as f64;
        assert!((mean + 0.3).abs() < 0.01, "mean {}", mean);
    }

    #[test]
    fn zero_std_is_degenerate() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(sample_normal(&mut rng, 1.5, 0.0), 1.5);
    }

    #[test]
    fn invalid_std_is_nan() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(sample_normal(&mut rng, 0.0, -1.0).is_nan());
        assert!(sample_normal(&mut rng, f64::NAN, 1.0).is_nan());
    }
}
