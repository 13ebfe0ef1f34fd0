//! Anomaly detection: severity scoring, per-parameter detection, optional
//! model corroboration and multi-parameter correlation.
//!
//! ## Pipeline
//!
//! ```text
//!   Observation + SubjectBaseline (pre-update snapshot)
//!       │
//!       ├──► SingleParameterDetector ×N ──► SeverityClassifier
//!       │         (profile: label, unit, guidance, risk rules)
//!       │
//!       ├──► ModelAugmenter (optional OutlierModel)
//!       │
//!       └──► MultiParameterCorrelator (≥ 2 results)
//!             │
//!             ▼
//!       Vec<Arc<AnomalyResult>> ──► AnomalyHistory
//! ```

pub mod classifier;
pub mod correlator;
pub mod detector;
pub mod model;
pub mod types;

pub use classifier::SeverityClassifier;
pub use correlator::{MultiParameterCorrelator, MULTIPLE_ANOMALIES_RISK};
pub use detector::{
    SingleParameterDetector, HIGH_SEVERITY_RISK, URGENT_FOLLOW_UP, URGENT_RECOMMENDATION,
};
pub use model::{
    FeatureVector, ModelAugmenter, ModelError, OutlierModel, RangeDistanceModel,
    MODEL_CORROBORATED_RISK,
};
pub use types::{dedup_preserving_order, AnomalyId, AnomalyResult, Severity, SeverityAssessment};
