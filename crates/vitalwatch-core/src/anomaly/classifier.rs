//! Severity classification of a single out-of-range value.

use crate::config::{DeviationThresholds, RULE_CONFIDENCE_CAP};

use super::types::{Severity, SeverityAssessment};

/// Pure mapping from (value, normal range) to severity and confidence.
///
/// The deviation is measured from the farther bound,
/// `max(|value - min|, |value - max|)`, and divided by the range width with
/// the width floored at `min_range_width` so collapsed baselines never
/// divide by zero.
#[derive(Clone, Copy, Debug)]
pub struct SeverityClassifier {
    thresholds: DeviationThresholds,
    min_range_width: f64,
}

impl SeverityClassifier {
    pub fn new(thresholds: DeviationThresholds, min_range_width: f64) -> Self {
        Self {
            thresholds,
            min_range_width,
        }
    }

    /// Classify `value` against `[normal_min, normal_max]`.
    ///
    /// Returns `None` when the value lies within the range.
    pub fn classify(&self, value: f64, normal_min: f64, normal_max: f64) -> Option<SeverityAssessment> {
        if normal_min <= value && value <= normal_max {
            return None;
        }

        let deviation = (value - normal_min).abs().max((value - normal_max).abs());
        let width = (normal_max - normal_min).max(self.min_range_width);
        let relative_deviation = deviation / width;

        Some(SeverityAssessment {
            severity: self.tier(relative_deviation),
            confidence: Self::confidence(relative_deviation),
            relative_deviation,
        })
    }

    /// Tier for a relative deviation; non-decreasing in its argument.
    pub fn tier(&self, relative_deviation: f64) -> Severity {
        let t = &self.thresholds;
        if relative_deviation < t.low {
            Severity::Low
        } else if relative_deviation < t.medium {
            Severity::Medium
        } else if relative_deviation < t.high {
            Severity::High
        } else {
            Severity::Critical
        }
    }

    /// `min(0.95, 0.5 + relative_deviation)`.
    pub fn confidence(relative_deviation: f64) -> f64 {
        (0.5 + relative_deviation).min(RULE_CONFIDENCE_CAP)
    }
}

impl Default for SeverityClassifier {
    fn default() -> Self {
        Self::new(
            DeviationThresholds::default(),
            crate::config::DEFAULT_MIN_RANGE_WIDTH,
        )
    }
}
