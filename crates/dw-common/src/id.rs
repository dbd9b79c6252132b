//! Identity types for particles, time steps, taps, and series entities.
//!
//! A particle is addressed by `(Step, ParticleId)`: ids are unique only
//! within the population of one step, and a parent link always names a
//! particle of the previous step.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Slot of a particle inside the population of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticleId(pub u32);

impl ParticleId {
    /// Slot index into a population vector.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

impl From<u32> for ParticleId {
    fn from(id: u32) -> Self {
        ParticleId(id)
    }
}

/// Position in the daily series (0 = first day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Step(pub usize);

impl Step {
    /// Step `delay` positions earlier, or None before the start of history.
    pub fn back(self, delay: usize) -> Option<Step> {
        self.0.checked_sub(delay).map(Step)
    }

    /// The following step.
    pub fn next(self) -> Step {
        Step(self.0 + 1)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Day lag used to compare a rate with its past (1 = day-over-day, 7 = week-over-week).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tap(pub u32);

impl Tap {
    /// The lag in days.
    pub fn days(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Tap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.0)
    }
}

impl From<u32> for Tap {
    fn from(days: u32) -> Self {
        Tap(days)
    }
}

/// Key of an observed entity (e.g. a country code).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(pub String);

impl EntityKey {
    pub fn new(key: impl Into<String>) -> Self {
        EntityKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityKey {
    fn from(key: &str) -> Self {
        EntityKey(key.to_string())
    }
}
