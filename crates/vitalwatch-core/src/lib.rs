//! # vitalwatch-core
//!
//! Adaptive, per-subject anomaly detection for physiological measurements.
//!
//! Each monitored subject gets a baseline, a learned normal interval per
//! vital parameter. Incoming observations are judged against the subject's
//! baseline; out-of-range values become graded, described `AnomalyResult`s,
//! and simultaneous anomalies are folded into one compound result.
//!
//! ## Architecture
//!
//! ```text
//!   Observation (validated)
//!       │
//!       ▼
//!   ┌──────────────────────────────────────────────────────┐
//!   │  AnomalyEngine          (per-subject lock)           │
//!   │                                                      │
//!   │   BaselineStore ──snapshot──► SingleParameterDetector │
//!   │        ▲                         │  SeverityClassifier│
//!   │        │                         ▼                    │
//!   │        │               ModelAugmenter (optional)      │
//!   │        │                         │                    │
//!   │        │               MultiParameterCorrelator       │
//!   │        │                         │                    │
//!   │     update ◄──── commit ────► AnomalyHistory          │
//!   └──────────────────────────────────────────────────────┘
//!       │
//!       ▼
//!   Vec<Arc<AnomalyResult>>
//! ```
//!
//! ## Guarantees
//!
//! - Invalid input is rejected before any state changes.
//! - Detection reads the pre-update baseline; the update and the history
//!   record are committed afterwards.
//! - Baseline bounds never invert and `sample_count` only grows.
//! - History per subject is a bounded FIFO.
//! - Rule-based confidence never exceeds 0.95.
//!
//! ## Quick Start
//!
//! ```rust
//! use vitalwatch_core::{AnomalyEngine, Severity};
//!
//! let engine = AnomalyEngine::with_defaults().unwrap();
//! let results = engine
//!     .process_measurements("p1", [("heart_rate", 130.0)])
//!     .unwrap();
//!
//! assert_eq!(results.len(), 1);
//! assert_eq!(results[0].severity, Severity::Critical);
//! ```

#![deny(unsafe_code)]

pub mod anomaly;
pub mod baseline;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod history;
pub mod observation;
pub mod parameter;

// ── Re-exports ──────────────────────────────────────────────────────────

pub use anomaly::{
    AnomalyId, AnomalyResult, FeatureVector, ModelAugmenter, ModelError,
    MultiParameterCorrelator, OutlierModel, RangeDistanceModel, Severity, SeverityAssessment,
    SeverityClassifier, SingleParameterDetector,
};
pub use baseline::{
    BaselinePersistence, BaselineStore, InMemoryBaseline, JsonFileBaseline, NormalRange,
    SubjectBaseline,
};
pub use config::{
    DetectorConfig, DeviationThresholds, FeatureFlags, ModelAugmentationConfig,
    DEFAULT_HISTORY_CAPACITY, DEFAULT_MIN_RANGE_WIDTH, RULE_CONFIDENCE_CAP,
};
pub use engine::AnomalyEngine;
pub use error::{VitalError, VitalResult};
pub use export::SubjectExport;
pub use history::{AnomalyHistory, HistorySummary};
pub use observation::{Observation, RawObservation, SubjectId, MAX_SUBJECT_ID_LEN};
pub use parameter::{
    AnomalyType, ParameterProfile, ProfileTable, RiskRule, Threshold, VitalParameter,
};
