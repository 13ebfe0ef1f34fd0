//! Baseline persistence - save and load subject baselines across restarts.
//!
//! The core only talks to storage through `BaselinePersistence`, keyed by
//! subject. `JsonFileBaseline` keeps every baseline in one JSON map file;
//! `InMemoryBaseline` is for tests and embedding.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{VitalError, VitalResult};
use crate::observation::SubjectId;

use super::types::SubjectBaseline;

/// Storage capability for subject baselines.
pub trait BaselinePersistence: Send + Sync {
    /// Load one subject's baseline; `Ok(None)` when nothing is stored.
    fn load(&self, subject_id: &SubjectId) -> VitalResult<Option<SubjectBaseline>>;

    /// Store (insert or replace) one subject's baseline.
    fn save(&self, baseline: &SubjectBaseline) -> VitalResult<()>;

    /// Load every stored baseline.
    fn load_all(&self) -> VitalResult<HashMap<SubjectId, SubjectBaseline>>;
}

/// JSON-file based baseline persistence.
///
/// Writes are atomic (write to `.tmp`, then rename) so an interrupted write
/// never leaves a truncated file behind.
pub struct JsonFileBaseline {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file.
    write_lock: Mutex<()>,
}

impl JsonFileBaseline {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> VitalResult<HashMap<SubjectId, SubjectBaseline>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&contents).map_err(|e| {
            VitalError::PersistenceError(format!(
                "deserialization of {} failed: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn write_map(&self, baselines: &HashMap<SubjectId, SubjectBaseline>) -> VitalResult<()> {
        let json = serde_json::to_string_pretty(baselines)
            .map_err(|e| VitalError::PersistenceError(format!("serialization failed: {}", e)))?;

        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl BaselinePersistence for JsonFileBaseline {
    fn load(&self, subject_id: &SubjectId) -> VitalResult<Option<SubjectBaseline>> {
        Ok(self.read_map()?.remove(subject_id))
    }

    fn save(&self, baseline: &SubjectBaseline) -> VitalResult<()> {
        let _guard = self.write_lock.lock();
        let mut all = self.read_map()?;
        all.insert(baseline.subject_id.clone(), baseline.clone());
        self.write_map(&all)
    }

    fn load_all(&self) -> VitalResult<HashMap<SubjectId, SubjectBaseline>> {
        self.read_map()
    }
}

/// In-memory baseline persistence.
#[derive(Default)]
pub struct InMemoryBaseline {
    data: Mutex<HashMap<SubjectId, SubjectBaseline>>,
}

impl InMemoryBaseline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }
}

impl BaselinePersistence for InMemoryBaseline {
    fn load(&self, subject_id: &SubjectId) -> VitalResult<Option<SubjectBaseline>> {
        Ok(self.data.lock().get(subject_id).cloned())
    }

    fn save(&self, baseline: &SubjectBaseline) -> VitalResult<()> {
        self.data
            .lock()
            .insert(baseline.subject_id.clone(), baseline.clone());
        Ok(())
    }

    fn load_all(&self) -> VitalResult<HashMap<SubjectId, SubjectBaseline>> {
        Ok(self.data.lock().clone())
    }
}
