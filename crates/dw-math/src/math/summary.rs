//! Summary statistics over samples.
//!
//! Rank operations use integer percentages so that slice bounds are exact:
//! the cut for `p` percent of `n` items is `n * p / 100` (floor).

/// Arithmetic mean. Returns NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by n). Returns NaN for an empty slice.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / values.len() as f64).sqrt()
}

/// Sort a sample ascending, placing NaN last.
pub fn sort_ascending(values: &mut [f64]) {
    values.sort_by(|a, b| a.total_cmp(b));
}

/// Drop the lowest and highest `percent` of an ascending-sorted sample by rank.
///
/// Keeps `sorted[n*percent/100 .. n*(100-percent)/100]`. Percentages of 50 or
/// more return an empty slice.
pub fn trim_by_rank(sorted: &[f64], percent: u32) -> &[f64] {
    if percent >= 50 {
        return &sorted[..0];
    }
    let n = sorted.len();
    let lo = n * percent as usize / 100;
    let hi = n * (100 - percent as usize) / 100;
    &sorted[lo..hi.max(lo)]
}

/// Rank percentile of an ascending-sorted sample: `sorted[n*percent/100]`.
///
/// Returns None for an empty sample; percentages at or above 100 select the
/// largest element.
pub fn rank_percentile(sorted: &[f64], percent: u32) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let idx = (sorted.len() * percent as usize / 100).min(sorted.len() - 1);
    Some(sorted[idx])
}
