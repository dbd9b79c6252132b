//! Poisson observation likelihood.

use super::stable::log_factorial;

/// Log of the Poisson PMF: log P(K = k | λ).
///
/// `λ = 0` is a point mass at zero. Negative or NaN intensities return NaN.
pub fn poisson_log_pmf(k: u64, lambda: f64) -> f64 {
    if lambda.is_nan() || lambda < 0.0 {
        return f64::NAN;
    }
    if lambda == 0.0 {
        return if k == 0 { 0.0 } else { f64::NEG_INFINITY };
    }
    if lambda.is_infinite() {
        return f64::NEG_INFINITY;
    }
    (k as f64) * lambda.ln() - lambda - log_factorial(k)
}

/// Poisson PMF: P(K = k | λ).
pub fn poisson_pmf(k: u64, lambda: f64) -> f64 {
    let log_pmf = poisson_log_pmf(k, lambda);
    if log_pmf.is_nan() {
        return f64::NAN;
    }
    log_pmf.exp()
}
