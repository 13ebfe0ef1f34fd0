//! Baseline type definitions.
//!
//! A baseline is a subject's learned expected-normal interval for each
//! tracked parameter. Key types: `NormalRange` (one interval) and
//! `SubjectBaseline` (all intervals for one subject).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{VitalError, VitalResult};
use crate::observation::SubjectId;
use crate::parameter::VitalParameter;

// ── Normal Range ────────────────────────────────────────────────────────

/// Closed interval `[min, max]` of expected values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalRange {
    pub min: f64,
    pub max: f64,
}

impl NormalRange {
    /// Create a range, rejecting `min > max` and non-finite bounds.
    pub fn new(min: f64, max: f64) -> VitalResult<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(VitalError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// The `(0, 0)` sentinel carried by compound results.
    pub const fn sentinel() -> Self {
        Self { min: 0.0, max: 0.0 }
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Pull both bounds toward `value` by `weight` (0 keeps the range, 1
    /// collapses it onto the value). Equal weights on both bounds keep
    /// `min <= max`.
    pub fn blend(&self, value: f64, weight: f64) -> Self {
        let keep = 1.0 - weight;
        let min = self.min * keep + value * weight;
        let max = self.max * keep + value * weight;
        // Guard against rounding pushing the bounds past each other.
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }
}

impl std::fmt::Display for NormalRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

// ── Subject Baseline ────────────────────────────────────────────────────

/// Per-subject adaptive baseline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubjectBaseline {
    pub subject_id: SubjectId,
    /// Learned interval per tracked parameter.
    pub ranges: BTreeMap<VitalParameter, NormalRange>,
    /// Observations folded into this baseline.
    pub sample_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl SubjectBaseline {
    /// Seed a fresh baseline from the global normal ranges.
    pub fn seeded(subject_id: SubjectId, ranges: BTreeMap<VitalParameter, NormalRange>) -> Self {
        let now = Utc::now();
        Self {
            subject_id,
            ranges,
            sample_count: 0,
            created_at: now,
            last_updated: now,
        }
    }

    pub fn range(&self, parameter: VitalParameter) -> Option<NormalRange> {
        self.ranges.get(&parameter).copied()
    }

    pub fn tracks(&self, parameter: VitalParameter) -> bool {
        self.ranges.contains_key(&parameter)
    }

    /// Weight given to the next observation: `1 / (sample_count + 1)`.
    pub fn next_weight(&self) -> f64 {
        1.0 / (self.sample_count as f64 + 1.0)
    }
}
