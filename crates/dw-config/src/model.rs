//! Day-to-day model training settings and the tap set.

use dw_common::Tap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::validate::{ValidationError, ValidationResult};

/// How the day-to-day variation model is trained from reference series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelConfig {
    /// Size of the reference basket (busiest entities by last observation).
    #[serde(default = "default_reference_count")]
    pub reference_count: usize,

    /// Percent of values dropped from each tail before taking mean/std.
    #[serde(default = "default_trim_percent")]
    pub trim_percent: u32,

    /// Mean used where a position has too little data.
    #[serde(default)]
    pub default_mean: f64,

    /// Std-dev used where a position has too little data.
    #[serde(default = "default_std")]
    pub default_std: f64,

    /// A trimmed mean beyond ±this is treated as corrupt training data.
    #[serde(default = "default_outlier_mean_bound")]
    pub outlier_mean_bound: f64,
}

fn default_reference_count() -> usize {
    50
}
fn default_trim_percent() -> u32 {
    5
}
fn default_std() -> f64 {
    0.02
}
fn default_outlier_mean_bound() -> f64 {
    10.0
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            reference_count: default_reference_count(),
            trim_percent: default_trim_percent(),
            default_mean: 0.0,
            default_std: default_std(),
            outlier_mean_bound: default_outlier_mean_bound(),
        }
    }
}

impl ModelConfig {
    /// The fallback (mean, std) pair.
    pub fn default_params(&self) -> (f64, f64) {
        (self.default_mean, self.default_std)
    }
}

/// A validated set of taps: non-empty, no zero, no duplicates, ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct TapSet(Vec<Tap>);

impl TapSet {
    /// Build a tap set from day lags.
    pub fn new(days: impl IntoIterator<Item = u32>) -> ValidationResult<Self> {
        let mut taps: Vec<u32> = days.into_iter().collect();
        if taps.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "taps".to_string(),
                message: "at least one tap is required".to_string(),
            });
        }
        if taps.contains(&0) {
            return Err(ValidationError::InvalidValue {
                field: "taps".to_string(),
                message: "taps must be positive day lags".to_string(),
            });
        }
        taps.sort_unstable();
        let before = taps.len();
        taps.dedup();
        if taps.len() != before {
            return Err(ValidationError::InvalidValue {
                field: "taps".to_string(),
                message: "taps must not repeat".to_string(),
            });
        }
        Ok(TapSet(taps.into_iter().map(Tap).collect()))
    }

    /// Parse a comma-separated list such as `"1,7"`.
    pub fn parse(s: &str) -> ValidationResult<Self> {
        let days = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u32>().map_err(|_| ValidationError::InvalidValue {
                    field: "taps".to_string(),
                    message: format!("'{}' is not a day lag", part),
                })
            })
            .collect::<ValidationResult<Vec<u32>>>()?;
        Self::new(days)
    }

    pub fn as_slice(&self) -> &[Tap] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, tap: Tap) -> bool {
        self.0.binary_search(&tap).is_ok()
    }

    /// Largest lag in the set.
    pub fn max(&self) -> Tap {
        self.0.last().copied().unwrap_or(Tap(1))
    }

    pub fn iter(&self) -> impl Iterator<Item = Tap> + '_ {
        self.0.iter().copied()
    }
}

impl Default for TapSet {
    /// Day-over-day and week-over-week.
    fn default() -> Self {
        TapSet(vec![Tap(1), Tap(7)])
    }
}

impl TryFrom<Vec<u32>> for TapSet {
    type Error = ValidationError;

    fn try_from(days: Vec<u32>) -> ValidationResult<Self> {
        TapSet::new(days)
    }
}

impl From<TapSet> for Vec<u32> {
    fn from(taps: TapSet) -> Self {
        taps.0.into_iter().map(|t| t.0).collect()
    }
}

impl std::fmt::Display for TapSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|t| t.0.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

impl std::str::FromStr for TapSet {
    type Err = ValidationError;

    fn from_str(s: &str) -> ValidationResult<Self> {
        TapSet::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tapset_sorts() {
        let taps = TapSet::new([7, 1]).unwrap();
        assert_eq!(taps.as_slice(), &[Tap(1), Tap(7)]);
        assert_eq!(taps.max(), Tap(7));
        assert!(taps.contains(Tap(7)));
        assert!(!taps.contains(Tap(3)));
    }

    #[test]
    fn tapset_rejects_bad_input() {
        assert!(TapSet::new(Vec::<u32>::new()).is_err());
        assert!(TapSet::new([0, 1]).is_err());
        assert!(TapSet::new([1, 1]).is_err());
        assert!(TapSet::parse("1,x").is_err());
    }

    #[test]
    fn tapset_parse_and_display() {
        let taps: TapSet = " 7, 1 ".parse().unwrap();
        assert_eq!(taps.to_string(), "1,7");
        assert_eq!(taps, TapSet::default());
    }

    #[test]
    fn tapset_serde_validates() {
        let taps: TapSet = serde_json::from_str("[1, 14]").unwrap();
        assert_eq!(serde_json::to_string(&taps).unwrap(), "[1,14]");
        assert!(serde_json::from_str::<TapSet>("[0]").is_err());
    }

    #[test]
    fn model_defaults() {
        let m = ModelConfig::default();
        assert_eq!(m.reference_count, 50);
        assert_eq!(m.trim_percent, 5);
        assert_eq!(m.default_params(), (0.0, 0.02));
        assert_eq!(m.outlier_mean_bound, 10.0);
    }
}
