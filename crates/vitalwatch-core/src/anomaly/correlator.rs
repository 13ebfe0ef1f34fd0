//! Multi-parameter correlation.
//!
//! When two or more parameters are out of range in the same observation the
//! correlator raises one synthetic `MultiParameter` result summarizing them.

use std::borrow::Borrow;

use chrono::{DateTime, Utc};

use crate::baseline::NormalRange;
use crate::parameter::AnomalyType;

use super::types::{dedup_preserving_order, AnomalyId, AnomalyResult};

/// Minimum number of single-parameter results that triggers correlation.
pub const MIN_CORRELATED_RESULTS: usize = 2;

/// Risk tag carried by every compound result.
pub const MULTIPLE_ANOMALIES_RISK: &str = "Multiple simultaneous anomalies";

/// Stateless combiner of simultaneous single-parameter results.
#[derive(Clone, Copy, Debug, Default)]
pub struct MultiParameterCorrelator;

impl MultiParameterCorrelator {
    pub fn new() -> Self {
        Self
    }

    /// Build the compound result, or `None` for fewer than two inputs.
    ///
    /// Accepts owned results or shared (`Arc`) handles.
    pub fn correlate<R>(&self, results: &[R], timestamp: DateTime<Utc>) -> Option<AnomalyResult>
    where
        R: Borrow<AnomalyResult>,
    {
        if results.len() < MIN_CORRELATED_RESULTS {
            return None;
        }

        let results: Vec<&AnomalyResult> = results
            .iter()
            .map(|r| <R as Borrow<AnomalyResult>>::borrow(r))
            .collect();

        let severity = results.iter().map(|r| r.severity).max()?;
        let confidence =
            results.iter().map(|r| r.confidence).sum::<f64>() / results.len() as f64;

        let titles: Vec<&str> = results.iter().map(|r| r.anomaly_type.title()).collect();
        let recommendations = dedup_preserving_order(
            results
                .iter()
                .flat_map(|r| r.recommendations.iter().cloned()),
        );

        Some(AnomalyResult {
            id: AnomalyId::new(),
            anomaly_type: AnomalyType::MultiParameter,
            severity,
            confidence,
            value: results.len() as f64,
            normal_range: NormalRange::sentinel(),
            timestamp,
            description: format!(
                "Multiple parameter anomalies detected: {}",
                titles.join(", ")
            ),
            recommendations,
            risk_factors: vec![MULTIPLE_ANOMALIES_RISK.to_string()],
        })
    }
}
