//! Error types for campus-engine operations.

use serde::Serialize;
use thiserror::Error;

/// Machine-distinguishable category of a rejected operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Internal,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A venue double-booking or resource oversubscription.
    ///
    /// `entity` names the conflicting row when it is known
    /// (e.g. `"event 17"`, `"resource 4"`).
    #[error("Conflict: {reason}")]
    Conflict {
        reason: String,
        entity: Option<String>,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation(_) => ErrorKind::Validation,
            EngineError::Conflict { .. } => ErrorKind::Conflict,
            EngineError::NotFound { .. } => ErrorKind::NotFound,
            EngineError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn conflict(reason: impl Into<String>, entity: impl Into<String>) -> Self {
        EngineError::Conflict {
            reason: reason.into(),
            entity: Some(entity.into()),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Internal(format!("dataset serialization failed: {e}"))
    }
}

impl From<rrule::RRuleError> for EngineError {
    fn from(e: rrule::RRuleError) -> Self {
        EngineError::Validation(format!("invalid recurrence: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
