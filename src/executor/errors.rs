//! Executor error types
//!
//! Error codes:
//! - AERO_EXECUTION_STORAGE (ERROR)
//! - AERO_EXECUTION_CANCELLED (ERROR)
//! - AERO_EXECUTION_MISSING_PRIMARY_KEY (ERROR)
//!
//! Any error aborts the whole query; no partial result is returned.

use thiserror::Error;

use crate::error::Severity;
use crate::store::StoreError;

/// Result type for query execution
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Execution failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    /// Store failure, propagated verbatim
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    /// Cancellation token fired before completion
    #[error("query cancelled")]
    Cancelled,

    /// A fetched record lacks a primary-key field, so it cannot be
    /// deduplicated
    #[error("record is missing primary-key field '{field}'")]
    MissingPrimaryKey { field: String },
}

impl ExecutorError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorError::Storage(_) => "AERO_EXECUTION_STORAGE",
            ExecutorError::Cancelled => "AERO_EXECUTION_CANCELLED",
            ExecutorError::MissingPrimaryKey { .. } => "AERO_EXECUTION_MISSING_PRIMARY_KEY",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Error
    }

    /// Returns true for storage failures
    pub fn is_storage(&self) -> bool {
        matches!(self, ExecutorError::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_wrap_verbatim() {
        let err: ExecutorError = StoreError::Backend("disk".into()).into();
        assert!(err.is_storage());
        assert_eq!(err.code(), "AERO_EXECUTION_STORAGE");
        assert_eq!(err.to_string(), "storage failure: storage backend failure: disk");
        assert_eq!(ExecutorError::Cancelled.severity(), Severity::Error);
    }
}
