use thiserror::Error;

/// Errors from the detection core.
///
/// Only input validation, configuration and explicit persistence calls
/// surface errors. A live observation stream never fails because of a
/// missing baseline or an unavailable outlier model.
#[derive(Debug, Error)]
pub enum VitalError {
    #[error("invalid subject id {id:?}: {reason}")]
    InvalidSubjectId { id: String, reason: String },

    #[error("invalid measurement for {parameter}: {reason}")]
    InvalidMeasurement { parameter: String, reason: String },

    #[error("invalid observation: {0}")]
    InvalidObservation(String),

    #[error("invalid normal range: min {min} > max {max}")]
    InvalidRange { min: f64, max: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("persistence error: {0}")]
    PersistenceError(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for VitalError {
    fn from(e: std::io::Error) -> Self {
        VitalError::PersistenceError(e.to_string())
    }
}

impl From<serde_json::Error> for VitalError {
    fn from(e: serde_json::Error) -> Self {
        VitalError::Serialization(e.to_string())
    }
}

/// Convenience type alias for core results.
pub type VitalResult<T> = Result<T, VitalError>;
