//! Validated observation input.
//!
//! An `Observation` is one timestamped bundle of simultaneous measurements
//! for one subject. Validation happens at construction, so the engine never
//! sees malformed input and never has to roll back state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{VitalError, VitalResult};
use crate::parameter::VitalParameter;

/// Maximum subject identifier length.
pub const MAX_SUBJECT_ID_LEN: usize = 128;

// ── Subject identification ──────────────────────────────────────────────

/// Identifies a monitored individual.
///
/// ASCII alphanumerics plus `-`, `_`, `.`, `:` and `@`; at most
/// `MAX_SUBJECT_ID_LEN` characters.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectId(String);

impl SubjectId {
    pub fn parse(id: impl Into<String>) -> VitalResult<Self> {
        let id = id.into();
        let reason = if id.is_empty() {
            Some("must not be empty".to_string())
        } else if id.len() > MAX_SUBJECT_ID_LEN {
            Some(format!("longer than {} characters", MAX_SUBJECT_ID_LEN))
        } else {
            id.chars()
                .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '@')))
                .map(|c| format!("contains disallowed character {:?}", c))
        };

        match reason {
            Some(reason) => Err(VitalError::InvalidSubjectId { id, reason }),
            None => Ok(Self(id)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SubjectId {
    type Error = VitalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<SubjectId> for String {
    fn from(id: SubjectId) -> Self {
        id.0
    }
}

impl std::str::FromStr for SubjectId {
    type Err = VitalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Observation ─────────────────────────────────────────────────────────

/// One validated bundle of simultaneous measurements.
///
/// Fields are read through accessors so a constructed observation cannot be
/// altered past validation.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    pub(crate) subject_id: SubjectId,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) measurements: BTreeMap<VitalParameter, f64>,
    pub(crate) unrecognized: Vec<String>,
}

impl Observation {
    /// Build an observation stamped with the current time.
    pub fn new<I, K>(subject_id: &str, measurements: I) -> VitalResult<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        Self::at(subject_id, Utc::now(), measurements)
    }

    /// Build an observation with an explicit timestamp.
    ///
    /// Unknown names are recorded and skipped. A recognized parameter must
    /// be finite and may appear only once, aliases included.
    pub fn at<I, K>(subject_id: &str, timestamp: DateTime<Utc>, measurements: I) -> VitalResult<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let subject_id = SubjectId::parse(subject_id)?;
        let mut recognized = BTreeMap::new();
        let mut unrecognized = Vec::new();

        for (name, value) in measurements {
            let name = name.as_ref();
            let Some(parameter) = VitalParameter::from_name(name) else {
                unrecognized.push(name.to_string());
                continue;
            };
            if !value.is_finite() {
                return Err(VitalError::InvalidMeasurement {
                    parameter: name.to_string(),
                    reason: format!("value {} is not finite", value),
                });
            }
            if recognized.insert(parameter, value).is_some() {
                return Err(VitalError::InvalidMeasurement {
                    parameter: name.to_string(),
                    reason: format!("duplicate value for {}", parameter),
                });
            }
        }

        Ok(Self {
            subject_id,
            timestamp,
            measurements: recognized,
            unrecognized,
        })
    }

    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Finite measurements in canonical parameter order.
    pub fn measurements(&self) -> impl Iterator<Item = (VitalParameter, f64)> + '_ {
        self.measurements
            .iter()
            .filter(|(_, value)| value.is_finite())
            .map(|(parameter, value)| (*parameter, *value))
    }

    pub fn get(&self, parameter: VitalParameter) -> Option<f64> {
        self.measurements
            .get(&parameter)
            .copied()
            .filter(|value| value.is_finite())
    }

    /// Names in the payload that are not known parameters.
    pub fn unrecognized(&self) -> &[String] {
        &self.unrecognized
    }

    pub fn is_empty(&self) -> bool {
        self.measurements().next().is_none()
    }
}

/// Observation as received on the wire, before validation.
///
/// ```json
/// {"subject_id": "p1", "timestamp": "2024-01-01T08:00:00Z",
///  "measurements": {"heart_rate": 72, "oxygen_saturation": 98}}
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawObservation {
    pub subject_id: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub measurements: BTreeMap<String, serde_json::Value>,
}

impl RawObservation {
    /// Parse one JSON document into a raw observation.
    pub fn from_json(json: &str) -> VitalResult<Self> {
        serde_json::from_str(json).map_err(|e| VitalError::InvalidObservation(e.to_string()))
    }

    /// Validate into an `Observation`; a missing timestamp becomes "now".
    ///
    /// Only recognized parameters must carry numbers; anything else under an
    /// unknown name is recorded and skipped.
    pub fn into_observation(self) -> VitalResult<Observation> {
        let mut values = Vec::with_capacity(self.measurements.len());
        let mut unrecognized = Vec::new();
        for (name, value) in self.measurements {
            if VitalParameter::from_name(&name).is_none() {
                unrecognized.push(name);
                continue;
            }
            let number = value.as_f64().ok_or_else(|| VitalError::InvalidMeasurement {
                parameter: name.clone(),
                reason: format!("expected a number, got {}", value),
            })?;
            values.push((name, number));
        }
        let timestamp = self.timestamp.unwrap_or_else(Utc::now);
        let mut observation = Observation::at(&self.subject_id, timestamp, values)?;
        observation.unrecognized = unrecognized;
        Ok(observation)
    }
}
