//! A single field comparison

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{ConditionError, ConditionResult};
use super::operation::FilterOperation;
use crate::value::value_key;

/// One comparison against one record field.
///
/// `value` is absent only for null checks and type checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// Field name or dotted path
    pub property: String,
    /// Operation applied to the field
    pub operation: FilterOperation,
    /// Operand, if the operation takes one
    pub value: Option<Value>,
    /// Field holds string data
    pub is_string: bool,
    /// String comparison respects case
    pub case_sensitive: bool,
}

impl FilterCondition {
    /// Create a condition with a value operand
    pub fn new(property: impl Into<String>, operation: FilterOperation, value: Value) -> Self {
        let is_string = value.is_string();
        Self {
            property: property.into(),
            operation,
            value: Some(value),
            is_string,
            case_sensitive: true,
        }
    }

    /// Create a null check or type check condition
    pub fn unary(property: impl Into<String>, operation: FilterOperation) -> Self {
        Self {
            property: property.into(),
            operation,
            value: None,
            is_string: false,
            case_sensitive: true,
        }
    }

    pub fn eq(property: impl Into<String>, value: Value) -> Self {
        Self::new(property, FilterOperation::Equal, value)
    }

    pub fn ne(property: impl Into<String>, value: Value) -> Self {
        Self::new(property, FilterOperation::NotEqual, value)
    }

    pub fn gt(property: impl Into<String>, value: Value) -> Self {
        Self::new(property, FilterOperation::GreaterThan, value)
    }

    pub fn gte(property: impl Into<String>, value: Value) -> Self {
        Self::new(property, FilterOperation::GreaterThanOrEqual, value)
    }

    pub fn lt(property: impl Into<String>, value: Value) -> Self {
        Self::new(property, FilterOperation::LessThan, value)
    }

    pub fn lte(property: impl Into<String>, value: Value) -> Self {
        Self::new(property, FilterOperation::LessThanOrEqual, value)
    }

    pub fn starts_with(property: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::new(property, FilterOperation::StartsWith, Value::String(prefix.into()))
    }

    pub fn is_null(property: impl Into<String>) -> Self {
        Self::unary(property, FilterOperation::IsNull)
    }

    pub fn is_not_null(property: impl Into<String>) -> Self {
        Self::unary(property, FilterOperation::IsNotNull)
    }

    /// Sets the string flag
    pub fn with_string(mut self, is_string: bool) -> Self {
        self.is_string = is_string;
        self
    }

    /// Sets case sensitivity
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Returns the logically negated condition
    pub fn negated(&self) -> Self {
        Self {
            operation: self.operation.negate(),
            ..self.clone()
        }
    }

    /// Returns true if a secondary index can serve this condition.
    ///
    /// Indexes hold scalar keys only, so array and object operands (or
    /// `In` lists containing them) always need in-memory evaluation.
    pub fn is_indexable(&self) -> bool {
        let scalar = |v: &Value| !v.is_array() && !v.is_object();
        let operand_ok = match (&self.operation, &self.value) {
            (FilterOperation::In, Some(Value::Array(values))) => values.iter().all(scalar),
            (_, Some(value)) => scalar(value),
            (_, None) => false,
        };
        operand_ok && self.operation.is_indexable(self.case_sensitive)
    }

    /// Checks the value/operation invariants
    pub fn validate(&self) -> ConditionResult<()> {
        if self.property.is_empty() {
            return Err(ConditionError::EmptyProperty);
        }

        let value = match (&self.value, self.operation.requires_value()) {
            (None, false) => return Ok(()),
            (Some(_), false) => {
                return Err(ConditionError::UnexpectedValue {
                    property: self.property.clone(),
                    operation: self.operation.op_name(),
                })
            }
            (None, true) => {
                return Err(ConditionError::MissingValue {
                    property: self.property.clone(),
                    operation: self.operation.op_name(),
                })
            }
            (Some(v), true) => v,
        };

        let expected = match self.operation {
            FilterOperation::In | FilterOperation::NotIn if !value.is_array() => Some("a list"),
            FilterOperation::Length(_) | FilterOperation::DatePart(..) if !value.is_number() => {
                Some("a number")
            }
            op if op.is_string_predicate() && !value.is_string() => Some("a string"),
            _ => None,
        };

        match expected {
            Some(expected) => Err(ConditionError::InvalidValue {
                property: self.property.clone(),
                expected: expected.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Canonical ordering: property, then operation, then serialized value
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.property
            .cmp(&other.property)
            .then_with(|| self.operation.cmp(&other.operation))
            .then_with(|| self.value_key().cmp(&other.value_key()))
            .then_with(|| other.case_sensitive.cmp(&self.case_sensitive))
    }

    /// Returns true if both conditions are the same after canonicalization
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.canonical_cmp(other) == Ordering::Equal
    }

    /// Serialized operand used for canonical ordering
    pub fn value_key(&self) -> String {
        self.value.as_ref().map(value_key).unwrap_or_default()
    }
}

impl fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.property, self.operation)?;
        if let Some(value) = &self.value {
            write!(f, " {}", value)?;
        }
        if !self.case_sensitive {
            write!(f, " (ignore case)")?;
        }
        Ok(())
    }
}
