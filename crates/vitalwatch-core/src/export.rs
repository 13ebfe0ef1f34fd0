//! Serialized per-subject snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::anomaly::AnomalyResult;
use crate::baseline::SubjectBaseline;
use crate::error::VitalResult;
use crate::observation::SubjectId;

/// Everything the engine knows about one subject at a point in time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubjectExport {
    pub subject_id: SubjectId,
    /// `None` for subjects never observed.
    pub baseline: Option<SubjectBaseline>,
    /// Retained history, oldest first.
    pub anomaly_history: Vec<Arc<AnomalyResult>>,
    pub exported_at: DateTime<Utc>,
}

impl SubjectExport {
    pub fn to_json(&self) -> VitalResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> VitalResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
