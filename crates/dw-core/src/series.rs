//! In-memory container for aligned daily count series.
//!
//! A provider fills a [`SeriesSet`] with one calendar (the dates) and, per
//! entity, one observation per date. Every series in the set has the same
//! length as the calendar; insertion enforces it.
//!
//! The JSON transport accepted by the CLI is:
//!
//! ```json
//! {
//!   "dates": ["2024-01-01", "2024-01-02"],
//!   "series": { "de": [120, null], "cn": [40, 3] }
//! }
//! ```

use dw_common::{EntityKey, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keys that name aggregates or metadata rather than real entities.
pub const AGGREGATE_KEYS: &[&str] = &["all", "??", "date"];

/// One entity's observations: a count per day, `None` where missing.
pub type RawSeries = Vec<Option<u64>>;

/// Aligned per-entity daily series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSet {
    dates: Vec<String>,
    series: BTreeMap<EntityKey, RawSeries>,
}

impl SeriesSet {
    /// Empty set over the given calendar.
    pub fn new(dates: Vec<String>) -> Self {
        SeriesSet {
            dates,
            series: BTreeMap::new(),
        }
    }

    /// Parse and validate the JSON transport.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: SeriesSet = serde_json::from_str(json)?;
        let mut set = SeriesSet::new(raw.dates);
        for (key, values) in raw.series {
            set.insert(key, values)?;
        }
        Ok(set)
    }

    /// Add or replace an entity's series. Fails if its length differs from the calendar.
    pub fn insert(&mut self, key: impl Into<EntityKey>, values: RawSeries) -> Result<()> {
        let key = key.into();
        if values.len() != self.dates.len() {
            return Err(Error::MisalignedSeries {
                entity: key.to_string(),
                expected: self.dates.len(),
                actual: values.len(),
            });
        }
        self.series.insert(key, values);
        Ok(())
    }

    /// Number of days covered.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    /// Number of entities.
    pub fn entity_count(&self) -> usize {
        self.series.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &EntityKey> {
        self.series.keys()
    }

    /// An entity's raw series.
    pub fn get(&self, key: &EntityKey) -> Result<&[Option<u64>]> {
        self.series
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::UnknownEntity {
                entity: key.to_string(),
            })
    }

    /// The `n` busiest entities, ranked by their last observation.
    ///
    /// Aggregate keys are skipped. A missing last observation ranks below any
    /// count; ties are broken by key, descending.
    pub fn largest(&self, n: usize) -> Vec<EntityKey> {
        let mut ranked: Vec<(Option<u64>, &EntityKey)> = self
            .series
            .iter()
            .filter(|(key, _)| !AGGREGATE_KEYS.contains(&key.as_str()))
            .map(|(key, values)| (values.last().copied().flatten(), key))
            .collect();
        ranked.sort();
        ranked.reverse();
        ranked.into_iter().take(n).map(|(_, k)| k.clone()).collect()
    }

    /// The trailing `days` positions of every series. A window at least as
    /// long as the set returns a copy of it.
    pub fn window(&self, days: usize) -> SeriesSet {
        let start = self.dates.len().saturating_sub(days);
        SeriesSet {
            dates: self.dates[start..].to_vec(),
            series: self
                .series
                .iter()
                .map(|(k, v)| (k.clone(), v[start..].to_vec()))
                .collect(),
        }
    }
}

/// Fill missing observations for filtering.
///
/// Each gap takes the most recent earlier value; a leading run of gaps takes
/// the first value present. Fails when nothing is present.
pub fn forward_fill(entity: &EntityKey, values: &[Option<u64>]) -> Result<Vec<u64>> {
    let first = values
        .iter()
        .flatten()
        .copied()
        .next()
        .ok_or_else(|| Error::EmptySeries {
            entity: entity.to_string(),
        })?;

    let mut last = first;
    Ok(values
        .iter()
        .map(|v| {
            if let Some(x) = v {
                last = *x;
            }
            last
        })
        .collect())
}
