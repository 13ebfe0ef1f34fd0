//! Detector configuration snapshot.
//!
//! Supplied once at engine construction and never mutated afterward.
//! Every section carries serde defaults so partial configuration files
//! deserialize cleanly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::baseline::NormalRange;
use crate::error::{VitalError, VitalResult};
use crate::parameter::VitalParameter;

/// Default per-subject history capacity.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Default floor for the range width used as the relative-deviation divisor.
pub const DEFAULT_MIN_RANGE_WIDTH: f64 = 1.0;

/// Upper bound on rule-based confidence.
pub const RULE_CONFIDENCE_CAP: f64 = 0.95;

/// Top-level configuration for the anomaly engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Global normal range per parameter; seeds every new baseline.
    /// Parameters missing here are not tracked.
    #[serde(default = "default_normal_ranges")]
    pub normal_ranges: BTreeMap<VitalParameter, NormalRange>,

    /// Relative-deviation tier boundaries.
    #[serde(default)]
    pub thresholds: DeviationThresholds,

    /// Smallest range width used when normalizing deviations.
    #[serde(default = "default_min_range_width")]
    pub min_range_width: f64,

    /// Maximum retained anomaly results per subject.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    #[serde(default)]
    pub features: FeatureFlags,

    #[serde(default)]
    pub model: ModelAugmentationConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            normal_ranges: default_normal_ranges(),
            thresholds: DeviationThresholds::default(),
            min_range_width: DEFAULT_MIN_RANGE_WIDTH,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            features: FeatureFlags::default(),
            model: ModelAugmentationConfig::default(),
        }
    }
}

impl DetectorConfig {
    /// Check every constraint the engine relies on.
    pub fn validate(&self) -> VitalResult<()> {
        for (parameter, range) in &self.normal_ranges {
            if !range.min.is_finite() || !range.max.is_finite() {
                return Err(VitalError::InvalidConfig(format!(
                    "normal range for {} must be finite",
                    parameter
                )));
            }
            if range.min > range.max {
                return Err(VitalError::InvalidConfig(format!(
                    "normal range for {}: min {} > max {}",
                    parameter, range.min, range.max
                )));
            }
        }

        self.thresholds.validate()?;

        if !(self.min_range_width.is_finite() && self.min_range_width > 0.0) {
            return Err(VitalError::InvalidConfig(format!(
                "min_range_width must be positive, got {}",
                self.min_range_width
            )));
        }
        if self.history_capacity == 0 {
            return Err(VitalError::InvalidConfig(
                "history_capacity must be at least 1".into(),
            ));
        }

        self.model.validate()
    }

    /// Parameters tracked by new baselines.
    pub fn tracked_parameters(&self) -> impl Iterator<Item = VitalParameter> + '_ {
        self.normal_ranges.keys().copied()
    }
}

/// Relative-deviation boundaries between severity tiers.
///
/// A relative deviation below `low` is LOW, below `medium` MEDIUM, below
/// `high` HIGH and anything else CRITICAL.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviationThresholds {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl Default for DeviationThresholds {
    fn default() -> Self {
        Self {
            low: 0.10,
            medium: 0.25,
            high: 0.50,
        }
    }
}

impl DeviationThresholds {
    pub fn validate(&self) -> VitalResult<()> {
        let all_finite = [self.low, self.medium, self.high]
            .iter()
            .all(|t| t.is_finite());
        if !all_finite || self.low <= 0.0 {
            return Err(VitalError::InvalidConfig(format!(
                "thresholds must be positive and finite: {:?}",
                self
            )));
        }
        if !(self.low < self.medium && self.medium < self.high) {
            return Err(VitalError::InvalidConfig(format!(
                "thresholds must be strictly increasing: {} < {} < {}",
                self.low, self.medium, self.high
            )));
        }
        Ok(())
    }
}

/// Optional behaviours toggled by configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Raise a compound result when two or more parameters are anomalous.
    #[serde(default = "default_true")]
    pub multi_parameter: bool,

    /// Consult an installed outlier model.
    #[serde(default = "default_true")]
    pub ml_augmentation: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            multi_parameter: true,
            ml_augmentation: true,
        }
    }
}

/// How an outlier model verdict adjusts rule-based results.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelAugmentationConfig {
    /// Scores at or above this value corroborate the rule-based results.
    #[serde(default = "default_outlier_threshold")]
    pub outlier_threshold: f64,

    /// Confidence added to each corroborated result (capped at 1.0).
    #[serde(default = "default_confidence_boost")]
    pub confidence_boost: f64,
}

impl Default for ModelAugmentationConfig {
    fn default() -> Self {
        Self {
            outlier_threshold: default_outlier_threshold(),
            confidence_boost: default_confidence_boost(),
        }
    }
}

impl ModelAugmentationConfig {
    pub fn validate(&self) -> VitalResult<()> {
        if !(0.0..=1.0).contains(&self.outlier_threshold) {
            return Err(VitalError::InvalidConfig(format!(
                "model.outlier_threshold must be within [0, 1], got {}",
                self.outlier_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_boost) {
            return Err(VitalError::InvalidConfig(format!(
                "model.confidence_boost must be within [0, 1], got {}",
                self.confidence_boost
            )));
        }
        Ok(())
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_min_range_width() -> f64 {
    DEFAULT_MIN_RANGE_WIDTH
}

fn default_outlier_threshold() -> f64 {
    0.5
}

fn default_confidence_boost() -> f64 {
    0.05
}

/// Adult resting reference ranges.
pub fn default_normal_ranges() -> BTreeMap<VitalParameter, NormalRange> {
    use VitalParameter::*;
    [
        (HeartRate, NormalRange { min: 60.0, max: 100.0 }),
        (BloodPressureSystolic, NormalRange { min: 90.0, max: 140.0 }),
        (Glucose, NormalRange { min: 70.0, max: 140.0 }),
        (OxygenSaturation, NormalRange { min: 95.0, max: 100.0 }),
        (Temperature, NormalRange { min: 36.1, max: 37.2 }),
        (RespiratoryRate, NormalRange { min: 12.0, max: 20.0 }),
    ]
    .into_iter()
    .collect()
}
