//! Per-subject anomaly history.
//!
//! A bounded FIFO of shared results per subject. When a subject's list
//! reaches capacity the oldest entries are evicted first, regardless of age.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::anomaly::{AnomalyResult, Severity};
use crate::observation::SubjectId;
use crate::parameter::AnomalyType;

/// Aggregate view of a subject's recent anomalies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub subject_id: SubjectId,
    /// Start of the summarized window.
    pub since: DateTime<Utc>,
    pub total_anomalies: usize,
    pub severity_breakdown: BTreeMap<Severity, usize>,
    pub type_breakdown: BTreeMap<AnomalyType, usize>,
    /// Mean confidence; 0.0 when there are no anomalies.
    pub average_confidence: f64,
}

impl HistorySummary {
    fn from_results(subject_id: SubjectId, since: DateTime<Utc>, results: &[Arc<AnomalyResult>]) -> Self {
        let mut severity_breakdown = BTreeMap::new();
        let mut type_breakdown = BTreeMap::new();
        for r in results {
            *severity_breakdown.entry(r.severity).or_insert(0) += 1;
            *type_breakdown.entry(r.anomaly_type).or_insert(0) += 1;
        }

        let average_confidence = if results.is_empty() {
            0.0
        } else {
            results.iter().map(|r| r.confidence).sum::<f64>() / results.len() as f64
        };

        Self {
            subject_id,
            since,
            total_anomalies: results.len(),
            severity_breakdown,
            type_breakdown,
            average_confidence,
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.severity_breakdown.get(&severity).copied().unwrap_or(0)
    }
}

/// Bounded per-subject anomaly log.
pub struct AnomalyHistory {
    entries: DashMap<SubjectId, VecDeque<Arc<AnomalyResult>>>,
    capacity: usize,
}

impl AnomalyHistory {
    /// `capacity` is clamped to at least one entry.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append results in order, evicting the oldest beyond capacity.
    pub fn record(&self, subject_id: &SubjectId, results: &[Arc<AnomalyResult>]) {
        if results.is_empty() {
            return;
        }
        let mut log = self.entries.entry(subject_id.clone()).or_default();
        for result in results {
            log.push_back(Arc::clone(result));
        }
        while log.len() > self.capacity {
            log.pop_front();
        }
    }

    /// Summarize results with `timestamp >= since`.
    pub fn query(&self, subject_id: &SubjectId, since: DateTime<Utc>) -> HistorySummary {
        let recent: Vec<Arc<AnomalyResult>> = self
            .entries
            .get(subject_id)
            .map(|log| log.iter().filter(|r| r.timestamp >= since).cloned().collect())
            .unwrap_or_default();
        HistorySummary::from_results(subject_id.clone(), since, &recent)
    }

    /// Every retained result, oldest first.
    pub fn entries(&self, subject_id: &SubjectId) -> Vec<Arc<AnomalyResult>> {
        self.entries
            .get(subject_id)
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }
}
