//! Condition model validation errors

use thiserror::Error;

/// Result type for condition validation
pub type ConditionResult<T> = Result<T, ConditionError>;

/// A field condition violates the model invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    /// Value-carrying operation without a value
    #[error("condition on '{property}' with operation '{operation}' requires a value")]
    MissingValue { property: String, operation: String },

    /// Null check or type check carrying a value
    #[error("condition on '{property}' with operation '{operation}' must not carry a value")]
    UnexpectedValue { property: String, operation: String },

    /// Operand of the wrong shape (e.g. `In` without a list)
    #[error("condition on '{property}' expects {expected}")]
    InvalidValue { property: String, expected: String },

    /// Empty property name
    #[error("condition has an empty property name")]
    EmptyProperty,
}

impl ConditionError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ConditionError::MissingValue { .. } => "AERO_QUERY_CONDITION_MISSING_VALUE",
            ConditionError::UnexpectedValue { .. } => "AERO_QUERY_CONDITION_UNEXPECTED_VALUE",
            ConditionError::InvalidValue { .. } => "AERO_QUERY_CONDITION_INVALID_VALUE",
            ConditionError::EmptyProperty => "AERO_QUERY_CONDITION_EMPTY_PROPERTY",
        }
    }
}
