//! Anomaly result types.
//!
//! `AnomalyResult` is the unit handed to external consumers (notification,
//! persistence, audit); every field is plain serde data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::baseline::NormalRange;
use crate::parameter::AnomalyType;

// ── Identifier ──────────────────────────────────────────────────────────

/// Unique identifier for a detected anomaly.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnomalyId(pub String);

impl AnomalyId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for AnomalyId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AnomalyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "anomaly:{}", self.0)
    }
}

// ── Severity ────────────────────────────────────────────────────────────

/// Ordered severity tier of a deviation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Numeric rank, 1 (low) through 4 (critical).
    pub fn rank(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }

    /// HIGH and CRITICAL require escalation.
    pub fn is_urgent(&self) -> bool {
        *self >= Self::High
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Classifier output for an out-of-range value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeverityAssessment {
    pub severity: Severity,
    /// Rule-based confidence in `[0.5, 0.95]`.
    pub confidence: f64,
    /// Out-of-range distance divided by the (guarded) range width.
    pub relative_deviation: f64,
}

// ── Anomaly Result ──────────────────────────────────────────────────────

/// One detected anomaly.
///
/// For `AnomalyType::MultiParameter`, `value` is the number of contributing
/// results and `normal_range` is the `(0, 0)` sentinel; neither is a
/// physiological quantity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResult {
    pub id: AnomalyId,
    pub anomaly_type: AnomalyType,
    pub severity: Severity,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    pub value: f64,
    pub normal_range: NormalRange,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    /// Ordered, duplicate-free guidance.
    pub recommendations: Vec<String>,
    pub risk_factors: Vec<String>,
}

impl AnomalyResult {
    pub fn is_multi_parameter(&self) -> bool {
        self.anomaly_type == AnomalyType::MultiParameter
    }
}

/// Remove duplicates while keeping the first occurrence of each entry.
pub fn dedup_preserving_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
