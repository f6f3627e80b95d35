//! Planner error types
//!
//! Error codes:
//! - AERO_QUERY_INDEX_NOT_FOUND (REJECT)
//! - AERO_QUERY_INVALID_ADDITION (REJECT)
//!
//! Partial compound-index coverage is not an error; it is reported as a
//! plan diagnostic.

use thiserror::Error;

use crate::error::Severity;

/// Result type for planning
pub type PlanResult<T> = Result<T, PlanError>;

/// Planning failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// Ordering target has no index and cursor fallback is disabled
    #[error("no index on ordering field '{field}' and cursor fallback is disabled")]
    IndexNotFound { field: String },

    /// Malformed query addition
    #[error("invalid query addition {addition}: {reason}")]
    InvalidAddition { addition: String, reason: String },
}

impl PlanError {
    pub fn index_not_found(field: impl Into<String>) -> Self {
        PlanError::IndexNotFound {
            field: field.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            PlanError::IndexNotFound { .. } => "AERO_QUERY_INDEX_NOT_FOUND",
            PlanError::InvalidAddition { .. } => "AERO_QUERY_INVALID_ADDITION",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}
