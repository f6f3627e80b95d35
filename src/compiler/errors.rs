//! Compiler error types
//!
//! Error codes:
//! - AERO_QUERY_UNSUPPORTED_OPERATION (REJECT)
//! - AERO_QUERY_UNSUPPORTED_SHAPE (REJECT)
//! - AERO_QUERY_INVALID_CONDITION (REJECT)

use thiserror::Error;

use crate::condition::ConditionError;
use crate::error::Severity;

/// Result type for predicate compilation
pub type CompileResult<T> = Result<T, CompileError>;

/// Compilation failures. All are fatal: no partial DNF is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Expression outside the supported operation set
    #[error("unsupported predicate operation: {operation}")]
    UnsupportedPredicateOperation { operation: String },

    /// Expression nesting the compiler cannot normalize
    #[error("unsupported predicate shape: {reason}")]
    UnsupportedPredicateShape { reason: String },

    /// A produced condition violates the condition invariants
    #[error(transparent)]
    InvalidCondition(#[from] ConditionError),
}

impl CompileError {
    pub fn unsupported_operation(operation: impl Into<String>) -> Self {
        CompileError::UnsupportedPredicateOperation {
            operation: operation.into(),
        }
    }

    pub fn unsupported_shape(reason: impl Into<String>) -> Self {
        CompileError::UnsupportedPredicateShape {
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::UnsupportedPredicateOperation { .. } => {
                "AERO_QUERY_UNSUPPORTED_OPERATION"
            }
            CompileError::UnsupportedPredicateShape { .. } => "AERO_QUERY_UNSUPPORTED_SHAPE",
            CompileError::InvalidCondition(_) => "AERO_QUERY_INVALID_CONDITION",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(
            CompileError::unsupported_operation("matches").code(),
            "AERO_QUERY_UNSUPPORTED_OPERATION"
        );
        let err: CompileError = ConditionError::EmptyProperty.into();
        assert_eq!(err.code(), "AERO_QUERY_INVALID_CONDITION");
        assert_eq!(err.severity(), Severity::Reject);
    }
}
