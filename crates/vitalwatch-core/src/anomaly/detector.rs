//! Single-parameter detection.
//!
//! Compares one measured value against the subject's learned interval and,
//! when it falls outside, builds a fully described `AnomalyResult` from the
//! parameter's profile.

use chrono::{DateTime, Utc};

use crate::baseline::SubjectBaseline;
use crate::parameter::{ParameterProfile, ProfileTable, VitalParameter};

use super::classifier::SeverityClassifier;
use super::types::{dedup_preserving_order, AnomalyId, AnomalyResult, SeverityAssessment};

/// Prepended to recommendations of urgent results.
pub const URGENT_RECOMMENDATION: &str = "Seek immediate medical attention";

/// Appended to recommendations of urgent results.
pub const URGENT_FOLLOW_UP: &str = "Prepare emergency contact information";

/// Risk tag added to urgent results.
pub const HIGH_SEVERITY_RISK: &str = "High severity anomaly";

/// Detects out-of-range values for one parameter at a time.
#[derive(Clone, Debug)]
pub struct SingleParameterDetector {
    profiles: ProfileTable,
    classifier: SeverityClassifier,
}

impl SingleParameterDetector {
    pub fn new(profiles: ProfileTable, classifier: SeverityClassifier) -> Self {
        Self {
            profiles,
            classifier,
        }
    }

    pub fn classifier(&self) -> &SeverityClassifier {
        &self.classifier
    }

    /// Evaluate one measurement against `baseline`.
    ///
    /// Returns `None` when the parameter is untracked, has no profile, or the
    /// value is within the learned range.
    pub fn evaluate(
        &self,
        parameter: VitalParameter,
        value: f64,
        baseline: &SubjectBaseline,
        timestamp: DateTime<Utc>,
    ) -> Option<AnomalyResult> {
        let range = baseline.range(parameter)?;
        let profile = self.profiles.get(parameter)?;
        let assessment = self.classifier.classify(value, range.min, range.max)?;

        let direction = if value > range.max { "above" } else { "below" };
        let description = format!(
            "{} of {} is {} normal range ({}-{})",
            profile.label,
            profile.format_value(value),
            direction,
            format_bound(profile, range.min),
            profile.format_value(range.max),
        );

        Some(AnomalyResult {
            id: AnomalyId::new(),
            anomaly_type: parameter.anomaly_type(),
            severity: assessment.severity,
            confidence: assessment.confidence,
            value,
            normal_range: range,
            timestamp,
            description,
            recommendations: recommendations(profile, &assessment),
            risk_factors: risk_factors(profile, value, &assessment),
        })
    }
}

impl Default for SingleParameterDetector {
    fn default() -> Self {
        Self::new(ProfileTable::standard(), SeverityClassifier::default())
    }
}

// Lower bound of a "min-max unit" span: precision only, no unit.
fn format_bound(profile: &ParameterProfile, value: f64) -> String {
    format!("{:.*}", profile.precision, value)
}

fn recommendations(profile: &ParameterProfile, assessment: &SeverityAssessment) -> Vec<String> {
    let generic = profile.recommendations.iter().cloned();
    if assessment.severity.is_urgent() {
        dedup_preserving_order(
            std::iter::once(URGENT_RECOMMENDATION.to_string())
                .chain(generic)
                .chain(std::iter::once(URGENT_FOLLOW_UP.to_string())),
        )
    } else {
        dedup_preserving_order(generic)
    }
}

fn risk_factors(profile: &ParameterProfile, value: f64, assessment: &SeverityAssessment) -> Vec<String> {
    let mut risks = Vec::new();
    if assessment.severity.is_urgent() {
        risks.push(HIGH_SEVERITY_RISK.to_string());
    }
    risks.extend(profile.matching_risks(value));
    dedup_preserving_order(risks)
}
