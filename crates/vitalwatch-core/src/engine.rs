//! The anomaly engine: one entry point tying baselines, detection,
//! correlation and history together.
//!
//! Every call for a subject runs under that subject's lock; different
//! subjects proceed in parallel. Detection reads a snapshot of the
//! pre-update baseline and state is committed only after detection is done.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info, instrument};

use crate::anomaly::{
    AnomalyResult, FeatureVector, ModelAugmenter, MultiParameterCorrelator, OutlierModel,
    SeverityClassifier, SingleParameterDetector,
};
use crate::baseline::{BaselinePersistence, BaselineStore, SubjectBaseline};
use crate::config::DetectorConfig;
use crate::error::VitalResult;
use crate::export::SubjectExport;
use crate::history::{AnomalyHistory, HistorySummary};
use crate::observation::{Observation, SubjectId};
use crate::parameter::ProfileTable;

/// Per-subject adaptive anomaly detector.
///
/// `Send + Sync`; share it behind an `Arc`.
pub struct AnomalyEngine {
    config: DetectorConfig,
    baselines: BaselineStore,
    detector: SingleParameterDetector,
    correlator: MultiParameterCorrelator,
    history: AnomalyHistory,
    augmenter: Option<ModelAugmenter>,
    subject_locks: DashMap<SubjectId, Arc<Mutex<()>>>,
}

impl AnomalyEngine {
    /// Build an engine from a validated configuration.
    pub fn new(config: DetectorConfig) -> VitalResult<Self> {
        config.validate()?;

        let classifier = SeverityClassifier::new(config.thresholds, config.min_range_width);
        Ok(Self {
            baselines: BaselineStore::new(config.normal_ranges.clone()),
            detector: SingleParameterDetector::new(ProfileTable::standard(), classifier),
            correlator: MultiParameterCorrelator::new(),
            history: AnomalyHistory::new(config.history_capacity),
            augmenter: None,
            subject_locks: DashMap::new(),
            config,
        })
    }

    /// Engine with the default configuration.
    pub fn with_defaults() -> VitalResult<Self> {
        Self::new(DetectorConfig::default())
    }

    /// Replace the parameter profile table.
    pub fn with_profiles(mut self, profiles: ProfileTable) -> Self {
        let classifier = *self.detector.classifier();
        self.detector = SingleParameterDetector::new(profiles, classifier);
        self
    }

    /// Install an outlier model. It is consulted only while the
    /// `ml_augmentation` feature is enabled.
    pub fn with_outlier_model(mut self, model: Arc<dyn OutlierModel>) -> Self {
        self.augmenter = Some(ModelAugmenter::new(model, self.config.model));
        self
    }

    /// Attach a baseline persistence backend.
    pub fn with_persistence(mut self, persistence: Arc<dyn BaselinePersistence>) -> Self {
        self.baselines = self.baselines.with_persistence(persistence);
        self
    }

    /// Eagerly load every stored baseline from `persistence`.
    pub fn restore_baselines(&self, persistence: &dyn BaselinePersistence) -> VitalResult<usize> {
        let stored = persistence.load_all()?;
        let count = stored.len();
        self.baselines.load_baselines(stored.into_values());
        info!(count, "restored baselines");
        Ok(count)
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Name of the installed outlier model, if any.
    pub fn outlier_model(&self) -> Option<&str> {
        self.augmenter.as_ref().map(|a| a.model_name())
    }

    // ── Processing ──────────────────────────────────────────────────────

    /// Run detection for one observation and commit its effects.
    ///
    /// Returns single-parameter results in canonical parameter order,
    /// followed by the multi-parameter result when one was raised. An empty
    /// list means nothing was anomalous.
    #[instrument(skip(self, observation), fields(subject = %observation.subject_id()))]
    pub fn process(&self, observation: &Observation) -> Vec<Arc<AnomalyResult>> {
        let subject_id = observation.subject_id();
        let lock = self.subject_lock(subject_id);
        let _guard = lock.lock();

        if !observation.unrecognized().is_empty() {
            debug!(names = ?observation.unrecognized(), "skipping unrecognized parameters");
        }

        let snapshot = self.baselines.get_or_create(subject_id);

        let mut singles: Vec<AnomalyResult> = observation
            .measurements()
            .filter_map(|(parameter, value)| {
                if !snapshot.tracks(parameter) {
                    debug!(parameter = %parameter, "parameter not tracked by baseline");
                    return None;
                }
                self.detector
                    .evaluate(parameter, value, &snapshot, observation.timestamp())
            })
            .collect();

        if self.config.features.ml_augmentation {
            if let Some(augmenter) = &self.augmenter {
                let features = FeatureVector::from_observation(observation, &snapshot);
                augmenter.augment(&features, &mut singles);
            }
        }

        let mut results: Vec<Arc<AnomalyResult>> = singles.into_iter().map(Arc::new).collect();

        if self.config.features.multi_parameter {
            if let Some(compound) = self.correlator.correlate(&results, observation.timestamp()) {
                results.push(Arc::new(compound));
            }
        }

        self.baselines.update(subject_id, observation);
        self.history.record(subject_id, &results);

        for result in &results {
            info!(
                anomaly_type = %result.anomaly_type,
                severity = %result.severity,
                confidence = result.confidence,
                value = result.value,
                "anomaly detected"
            );
        }

        results
    }

    /// Validate raw measurements (stamped now) and process them.
    pub fn process_measurements<I, K>(
        &self,
        subject_id: &str,
        measurements: I,
    ) -> VitalResult<Vec<Arc<AnomalyResult>>>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let observation = Observation::new(subject_id, measurements)?;
        Ok(self.process(&observation))
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Summary of the subject's anomalies from the last `hours` hours.
    ///
    /// A window reaching past the earliest representable time covers the
    /// whole history.
    pub fn history_summary(&self, subject_id: &SubjectId, hours: u32) -> HistorySummary {
        let since = Utc::now()
            .checked_sub_signed(Duration::hours(i64::from(hours)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.history.query(subject_id, since)
    }

    /// Every retained result for the subject, oldest first.
    pub fn anomaly_history(&self, subject_id: &SubjectId) -> Vec<Arc<AnomalyResult>> {
        self.history.entries(subject_id)
    }

    pub fn baseline(&self, subject_id: &SubjectId) -> Option<SubjectBaseline> {
        self.baselines.get(subject_id)
    }

    /// Subjects with a baseline, sorted.
    pub fn subjects(&self) -> Vec<SubjectId> {
        self.baselines.subjects()
    }

    /// Snapshot of the subject's baseline and retained history. An unseen
    /// subject exports with no baseline and an empty history.
    pub fn export(&self, subject_id: &SubjectId) -> SubjectExport {
        SubjectExport {
            subject_id: subject_id.clone(),
            baseline: self.baselines.get(subject_id),
            anomaly_history: self.history.entries(subject_id),
            exported_at: Utc::now(),
        }
    }

    pub fn export_json(&self, subject_id: &SubjectId) -> VitalResult<String> {
        self.export(subject_id).to_json()
    }

    fn subject_lock(&self, subject_id: &SubjectId) -> Arc<Mutex<()>> {
        self.subject_locks
            .entry(subject_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }
}

impl std::fmt::Debug for AnomalyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnomalyEngine")
            .field("subjects", &self.baselines.len())
            .field("history_capacity", &self.history.capacity())
            .field("outlier_model", &self.outlier_model())
            .finish()
    }
}
