//! Optional outlier-model augmentation.
//!
//! An `OutlierModel` scores the whole observation as one feature vector.
//! A score at or above the configured threshold corroborates the rule-based
//! results; anything else (low score, model error, non-finite score) leaves
//! them untouched.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::baseline::{NormalRange, SubjectBaseline};
use crate::config::ModelAugmentationConfig;
use crate::observation::Observation;
use crate::parameter::VitalParameter;

use super::types::AnomalyResult;

/// Risk tag added to results the model agrees with.
pub const MODEL_CORROBORATED_RISK: &str = "Model-corroborated outlier";

/// Errors reported by an outlier model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("not enough features to score: {0}")]
    InsufficientFeatures(usize),

    #[error("model unavailable: {0}")]
    Unavailable(String),

    #[error("scoring failed: {0}")]
    Failed(String),
}

/// Tracked measurements of one observation in canonical parameter order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureVector {
    features: Vec<(VitalParameter, f64)>,
}

impl FeatureVector {
    /// Measurements of `observation` that `baseline` tracks.
    pub fn from_observation(observation: &Observation, baseline: &SubjectBaseline) -> Self {
        let features = observation
            .measurements()
            .filter(|(parameter, _)| baseline.tracks(*parameter))
            .collect();
        Self { features }
    }

    pub fn iter(&self) -> impl Iterator<Item = (VitalParameter, f64)> + '_ {
        self.features.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Pluggable multivariate outlier scorer.
pub trait OutlierModel: Send + Sync {
    /// Outlier score in `[0, 1]`; higher means more anomalous.
    fn score(&self, features: &FeatureVector) -> Result<f64, ModelError>;

    /// Model name for provenance in logs.
    fn name(&self) -> &str;
}

/// Applies a model verdict to rule-based results.
#[derive(Clone)]
pub struct ModelAugmenter {
    model: Arc<dyn OutlierModel>,
    config: ModelAugmentationConfig,
}

impl ModelAugmenter {
    pub fn new(model: Arc<dyn OutlierModel>, config: ModelAugmentationConfig) -> Self {
        Self { model, config }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Score `features` and, when the model corroborates, raise each
    /// result's confidence and tag it. Returns whether it corroborated.
    pub fn augment(&self, features: &FeatureVector, results: &mut [AnomalyResult]) -> bool {
        if results.is_empty() {
            return false;
        }

        let score = match self.model.score(features) {
            Ok(score) if score.is_finite() => score,
            Ok(score) => {
                info!(model = self.model.name(), score, "ignoring non-finite outlier score");
                return false;
            }
            Err(e) => {
                info!(model = self.model.name(), error = %e, "outlier model failed, keeping rule-based results");
                return false;
            }
        };

        if score < self.config.outlier_threshold {
            debug!(model = self.model.name(), score, "outlier model did not corroborate");
            return false;
        }

        for result in results.iter_mut() {
            result.confidence = (result.confidence + self.config.confidence_boost).min(1.0);
            if !result.risk_factors.iter().any(|r| r == MODEL_CORROBORATED_RISK) {
                result.risk_factors.push(MODEL_CORROBORATED_RISK.to_string());
            }
        }
        debug!(
            model = self.model.name(),
            score,
            corroborated = results.len(),
            "outlier model corroborated results"
        );
        true
    }
}

impl std::fmt::Debug for ModelAugmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelAugmenter")
            .field("model", &self.model.name())
            .field("config", &self.config)
            .finish()
    }
}

// ── Built-in model ──────────────────────────────────────────────────────

/// Lightweight multivariate scorer over fixed reference ranges.
///
/// Each feature contributes its squared out-of-range distance in units of
/// range width; the sum `d` is squashed to `d / (1 + d)`. A single feature
/// one full width outside its range scores 0.5.
#[derive(Clone, Debug)]
pub struct RangeDistanceModel {
    reference: BTreeMap<VitalParameter, NormalRange>,
    min_range_width: f64,
}

impl RangeDistanceModel {
    pub fn new(reference: BTreeMap<VitalParameter, NormalRange>, min_range_width: f64) -> Self {
        Self {
            reference,
            min_range_width,
        }
    }
}

impl OutlierModel for RangeDistanceModel {
    fn score(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let mut distance = 0.0;
        let mut scored = 0usize;
        for (parameter, value) in features.iter() {
            let Some(range) = self.reference.get(&parameter) else {
                continue;
            };
            let outside = if value < range.min {
                range.min - value
            } else if value > range.max {
                value - range.max
            } else {
                0.0
            };
            let z = outside / range.width().max(self.min_range_width);
            distance += z * z;
            scored += 1;
        }

        if scored == 0 {
            return Err(ModelError::InsufficientFeatures(features.len()));
        }
        Ok(distance / (1.0 + distance))
    }

    fn name(&self) -> &str {
        "range-distance"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::{AnomalyId, Severity};
    use crate::config::default_normal_ranges;
    use crate::observation::SubjectId;
    use crate::parameter::AnomalyType;
    use chrono::Utc;

    struct Fixed(Result<f64, String>);

    impl OutlierModel for Fixed {
        fn score(&self, _: &FeatureVector) -> Result<f64, ModelError> {
            self.0.clone().map_err(ModelError::Failed)
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn result(confidence: f64) -> AnomalyResult {
        AnomalyResult {
            id: AnomalyId::new(),
            anomaly_type: AnomalyType::HeartRate,
            severity: Severity::High,
            confidence,
            value: 115.0,
            normal_range: NormalRange { min: 60.0, max: 100.0 },
            timestamp: Utc::now(),
            description: String::new(),
            recommendations: vec![],
            risk_factors: vec![],
        }
    }

    fn augmenter(score: Result<f64, String>) -> ModelAugmenter {
        ModelAugmenter::new(Arc::new(Fixed(score)), ModelAugmentationConfig::default())
    }

    #[test]
    fn features_follow_tracked_parameters() {
        let mut ranges = default_normal_ranges();
        ranges.remove(&VitalParameter::Glucose);
        let baseline = SubjectBaseline::seeded(SubjectId::parse("p1").unwrap(), ranges);
        let obs = Observation::new(
            "p1",
            [("oxygen_saturation", 97.0), ("glucose", 90.0), ("heart_rate", 70.0)],
        )
        .unwrap();

        let features = FeatureVector::from_observation(&obs, &baseline);
        assert_eq!(features.len(), 2);
        assert_eq!(
            features.iter().collect::<Vec<_>>(),
            vec![(VitalParameter::HeartRate, 70.0), (VitalParameter::OxygenSaturation, 97.0)]
        );
    }

    #[test]
    fn high_score_corroborates() {
        let mut results = vec![result(0.8), result(0.98)];
        assert!(augmenter(Ok(0.9)).augment(&FeatureVector::default(), &mut results));
        assert!((results[0].confidence - 0.85).abs() < 1e-9);
        assert_eq!(results[1].confidence, 1.0);
        assert!(results
            .iter()
            .all(|r| r.risk_factors == vec![MODEL_CORROBORATED_RISK.to_string()]));
    }

    #[test]
    fn low_score_changes_nothing() {
        let mut results = vec![result(0.8)];
        assert!(!augmenter(Ok(0.2)).augment(&FeatureVector::default(), &mut results));
        assert_eq!(results[0].confidence, 0.8);
        assert!(results[0].risk_factors.is_empty());
    }

    #[test]
    fn model_failure_and_nan_are_ignored() {
        let mut results = vec![result(0.8)];
        assert!(!augmenter(Err("boom".into())).augment(&FeatureVector::default(), &mut results));
        assert!(!augmenter(Ok(f64::NAN)).augment(&FeatureVector::default(), &mut results));
        assert_eq!(results[0].confidence, 0.8);
    }

    #[test]
    fn range_distance_model_scores() {
        let model = RangeDistanceModel::new(default_normal_ranges(), 1.0);
        let baseline = SubjectBaseline::seeded(SubjectId::parse("p1").unwrap(), default_normal_ranges());

        let calm = Observation::new("p1", [("heart_rate", 72.0)]).unwrap();
        let score = model
            .score(&FeatureVector::from_observation(&calm, &baseline))
            .unwrap();
        assert_eq!(score, 0.0);

        // 140 vs (60, 100): one full width above -> d = 1 -> 0.5
        let racing = Observation::new("p1", [("heart_rate", 140.0)]).unwrap();
        let score = model
            .score(&FeatureVector::from_observation(&racing, &baseline))
            .unwrap();
        assert!((score - 0.5).abs() < 1e-9);

        assert!(matches!(
            model.score(&FeatureVector::default()),
            Err(ModelError::InsufficientFeatures(0))
        ));
    }
}
