//! Baseline store - incremental learning of per-subject normal ranges.
//!
//! Each observation pulls the tracked interval bounds toward the measured
//! value with weight `1 / (sample_count + 1)`, so the first sample moves the
//! baseline fully and later samples carry decreasing marginal weight.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::observation::{Observation, SubjectId};
use crate::parameter::VitalParameter;

use super::persistence::BaselinePersistence;
use super::types::{NormalRange, SubjectBaseline};

/// Owns every subject's baseline.
///
/// Cross-subject access needs no coordination; callers serialize updates for
/// the same subject (the engine does this with per-subject locks).
pub struct BaselineStore {
    baselines: DashMap<SubjectId, SubjectBaseline>,
    /// Global normal ranges used to seed new baselines.
    seed: BTreeMap<VitalParameter, NormalRange>,
    persistence: Option<Arc<dyn BaselinePersistence>>,
}

impl BaselineStore {
    pub fn new(seed: BTreeMap<VitalParameter, NormalRange>) -> Self {
        Self {
            baselines: DashMap::new(),
            seed,
            persistence: None,
        }
    }

    /// Attach a persistence backend consulted on first access and written
    /// after every update.
    pub fn with_persistence(mut self, persistence: Arc<dyn BaselinePersistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Return the subject's baseline, creating it if absent.
    ///
    /// A stored baseline from the persistence backend wins over the seed;
    /// backend failures fall back to the seed. Never fails.
    pub fn get_or_create(&self, subject_id: &SubjectId) -> SubjectBaseline {
        if let Some(existing) = self.baselines.get(subject_id) {
            return existing.clone();
        }

        let restored = self.restore(subject_id);
        self.baselines
            .entry(subject_id.clone())
            .or_insert_with(|| match restored {
                Some(baseline) => baseline,
                None => {
                    debug!(subject = %subject_id, "seeding baseline from global normal ranges");
                    SubjectBaseline::seeded(subject_id.clone(), self.seed.clone())
                }
            })
            .clone()
    }

    /// Fold an observation into the subject's baseline.
    ///
    /// Only parameters present in the observation and tracked by the
    /// baseline move; `sample_count` always advances by one.
    pub fn update(&self, subject_id: &SubjectId, observation: &Observation) -> SubjectBaseline {
        if !self.baselines.contains_key(subject_id) {
            self.get_or_create(subject_id);
        }

        let updated = {
            let mut entry = self
                .baselines
                .entry(subject_id.clone())
                .or_insert_with(|| SubjectBaseline::seeded(subject_id.clone(), self.seed.clone()));
            let baseline = entry.value_mut();

            let weight = baseline.next_weight();
            for (parameter, value) in observation.measurements() {
                if let Some(range) = baseline.ranges.get_mut(&parameter) {
                    *range = range.blend(value, weight);
                }
            }
            baseline.sample_count += 1;
            baseline.last_updated = observation.timestamp();
            baseline.clone()
        };

        debug!(
            subject = %subject_id,
            samples = updated.sample_count,
            "baseline updated"
        );

        if let Some(persistence) = &self.persistence {
            if let Err(e) = persistence.save(&updated) {
                warn!(subject = %subject_id, error = %e, "failed to persist baseline");
            }
        }

        updated
    }

    /// Current baseline, if the subject has been seen.
    pub fn get(&self, subject_id: &SubjectId) -> Option<SubjectBaseline> {
        self.baselines.get(subject_id).map(|b| b.clone())
    }

    /// Insert restored baselines, replacing any in-memory state.
    pub fn load_baselines(&self, baselines: impl IntoIterator<Item = SubjectBaseline>) {
        for baseline in baselines {
            self.baselines.insert(baseline.subject_id.clone(), baseline);
        }
    }

    pub fn subjects(&self) -> Vec<SubjectId> {
        let mut ids: Vec<SubjectId> = self.baselines.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    fn restore(&self, subject_id: &SubjectId) -> Option<SubjectBaseline> {
        let persistence = self.persistence.as_ref()?;
        match persistence.load(subject_id) {
            Ok(Some(baseline)) if Self::is_consistent(&baseline, subject_id) => {
                debug!(
                    subject = %subject_id,
                    samples = baseline.sample_count,
                    "restored baseline from persistence"
                );
                Some(baseline)
            }
            Ok(Some(_)) => {
                warn!(subject = %subject_id, "discarding inconsistent stored baseline");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(subject = %subject_id, error = %e, "baseline load failed, reseeding");
                None
            }
        }
    }

    fn is_consistent(baseline: &SubjectBaseline, subject_id: &SubjectId) -> bool {
        &baseline.subject_id == subject_id
            && baseline
                .ranges
                .values()
                .all(|r| r.min.is_finite() && r.max.is_finite() && r.min <= r.max)
    }
}
