//! Filter operations and their inversion tables

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::ValueKind;

/// Binary comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Comparison {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl Comparison {
    /// Logical negation: `>` becomes `<=`, `==` becomes `!=`
    pub fn negate(self) -> Self {
        match self {
            Comparison::Equal => Comparison::NotEqual,
            Comparison::NotEqual => Comparison::Equal,
            Comparison::GreaterThan => Comparison::LessThanOrEqual,
            Comparison::GreaterThanOrEqual => Comparison::LessThan,
            Comparison::LessThan => Comparison::GreaterThanOrEqual,
            Comparison::LessThanOrEqual => Comparison::GreaterThan,
        }
    }

    /// Operand swap: `5 < x` is `x > 5`
    pub fn flip(self) -> Self {
        match self {
            Comparison::GreaterThan => Comparison::LessThan,
            Comparison::GreaterThanOrEqual => Comparison::LessThanOrEqual,
            Comparison::LessThan => Comparison::GreaterThan,
            Comparison::LessThanOrEqual => Comparison::GreaterThanOrEqual,
            symmetric => symmetric,
        }
    }

    /// Returns true if `ordering` (actual vs expected) satisfies this comparison
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Comparison::Equal => ordering == Ordering::Equal,
            Comparison::NotEqual => ordering != Ordering::Equal,
            Comparison::GreaterThan => ordering == Ordering::Greater,
            Comparison::GreaterThanOrEqual => ordering != Ordering::Less,
            Comparison::LessThan => ordering == Ordering::Less,
            Comparison::LessThanOrEqual => ordering != Ordering::Greater,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Equal => "==",
            Comparison::NotEqual => "!=",
            Comparison::GreaterThan => ">",
            Comparison::GreaterThanOrEqual => ">=",
            Comparison::LessThan => "<",
            Comparison::LessThanOrEqual => "<=",
        }
    }
}

/// Component extracted from a date/time value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DatePart {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    /// 0 = Sunday
    DayOfWeek,
    /// 1-based
    DayOfYear,
}

impl DatePart {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatePart::Year => "year",
            DatePart::Month => "month",
            DatePart::Day => "day",
            DatePart::Hour => "hour",
            DatePart::Minute => "minute",
            DatePart::Second => "second",
            DatePart::DayOfWeek => "day_of_week",
            DatePart::DayOfYear => "day_of_year",
        }
    }
}

/// Operation of a single field condition.
///
/// The derived ordering is the canonical operation order used when
/// normalizing AND-groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FilterOperation {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    In,
    NotIn,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
    Contains,
    NotContains,
    ArrayContains,
    ArrayNotContains,
    Length(Comparison),
    DatePart(DatePart, Comparison),
    IsType(ValueKind),
    IsNotType(ValueKind),
    IsNull,
    IsNotNull,
}

impl FilterOperation {
    /// Lifts a plain comparison into a field operation
    pub fn compare(comparison: Comparison) -> Self {
        match comparison {
            Comparison::Equal => FilterOperation::Equal,
            Comparison::NotEqual => FilterOperation::NotEqual,
            Comparison::GreaterThan => FilterOperation::GreaterThan,
            Comparison::GreaterThanOrEqual => FilterOperation::GreaterThanOrEqual,
            Comparison::LessThan => FilterOperation::LessThan,
            Comparison::LessThanOrEqual => FilterOperation::LessThanOrEqual,
        }
    }

    /// Returns the plain comparison, if this is one
    pub fn as_comparison(&self) -> Option<Comparison> {
        match self {
            FilterOperation::Equal => Some(Comparison::Equal),
            FilterOperation::NotEqual => Some(Comparison::NotEqual),
            FilterOperation::GreaterThan => Some(Comparison::GreaterThan),
            FilterOperation::GreaterThanOrEqual => Some(Comparison::GreaterThanOrEqual),
            FilterOperation::LessThan => Some(Comparison::LessThan),
            FilterOperation::LessThanOrEqual => Some(Comparison::LessThanOrEqual),
            _ => None,
        }
    }

    /// Inversion table used by negation rewriting
    pub fn negate(&self) -> Self {
        match *self {
            Self::In => Self::NotIn,
            Self::NotIn => Self::In,
            Self::StartsWith => Self::NotStartsWith,
            Self::NotStartsWith => Self::StartsWith,
            Self::EndsWith => Self::NotEndsWith,
            Self::NotEndsWith => Self::EndsWith,
            Self::Contains => Self::NotContains,
            Self::NotContains => Self::Contains,
            Self::ArrayContains => Self::ArrayNotContains,
            Self::ArrayNotContains => Self::ArrayContains,
            Self::Length(cmp) => Self::Length(cmp.negate()),
            Self::DatePart(part, cmp) => Self::DatePart(part, cmp.negate()),
            Self::IsType(kind) => Self::IsNotType(kind),
            Self::IsNotType(kind) => Self::IsType(kind),
            Self::IsNull => Self::IsNotNull,
            Self::IsNotNull => Self::IsNull,
            plain => match plain.as_comparison() {
                Some(cmp) => Self::compare(cmp.negate()),
                None => plain,
            },
        }
    }

    /// Returns false only for null checks and type checks
    pub fn requires_value(&self) -> bool {
        !matches!(
            self,
            FilterOperation::IsNull
                | FilterOperation::IsNotNull
                | FilterOperation::IsType(_)
                | FilterOperation::IsNotType(_)
        )
    }

    /// Returns true if a secondary index can serve this operation
    pub fn is_indexable(&self, case_sensitive: bool) -> bool {
        matches!(
            self,
            FilterOperation::Equal
                | FilterOperation::NotEqual
                | FilterOperation::GreaterThan
                | FilterOperation::GreaterThanOrEqual
                | FilterOperation::LessThan
                | FilterOperation::LessThanOrEqual
                | FilterOperation::In
                | FilterOperation::StartsWith
        ) && case_sensitive
    }

    /// Returns true for `>`, `>=`, `<`, `<=`
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            FilterOperation::GreaterThan
                | FilterOperation::GreaterThanOrEqual
                | FilterOperation::LessThan
                | FilterOperation::LessThanOrEqual
        )
    }

    /// Returns true for operations whose value is a string operand
    pub fn is_string_predicate(&self) -> bool {
        matches!(
            self,
            FilterOperation::StartsWith
                | FilterOperation::NotStartsWith
                | FilterOperation::EndsWith
                | FilterOperation::NotEndsWith
                | FilterOperation::Contains
                | FilterOperation::NotContains
        )
    }

    /// Returns the operation name for explain output
    pub fn op_name(&self) -> String {
        match self {
            Self::In => "in".into(),
            Self::NotIn => "not_in".into(),
            Self::StartsWith => "starts_with".into(),
            Self::NotStartsWith => "not_starts_with".into(),
            Self::EndsWith => "ends_with".into(),
            Self::NotEndsWith => "not_ends_with".into(),
            Self::Contains => "contains".into(),
            Self::NotContains => "not_contains".into(),
            Self::ArrayContains => "array_contains".into(),
            Self::ArrayNotContains => "array_not_contains".into(),
            Self::Length(cmp) => format!("length {}", cmp.symbol()),
            Self::DatePart(part, cmp) => format!("{} {}", part.as_str(), cmp.symbol()),
            Self::IsType(kind) => format!("is {}", kind),
            Self::IsNotType(kind) => format!("is not {}", kind),
            Self::IsNull => "is null".into(),
            Self::IsNotNull => "is not null".into(),
            plain => plain
                .as_comparison()
                .map(|cmp| cmp.symbol().to_string())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for FilterOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.op_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negation_is_involution() {
        let ops = [
            FilterOperation::Equal,
            FilterOperation::GreaterThan,
            FilterOperation::LessThanOrEqual,
            FilterOperation::In,
            FilterOperation::Contains,
            FilterOperation::ArrayContains,
            FilterOperation::Length(Comparison::GreaterThan),
            FilterOperation::DatePart(DatePart::Year, Comparison::Equal),
            FilterOperation::IsType(ValueKind::String),
            FilterOperation::IsNull,
        ];
        for op in ops {
            assert_ne!(op.negate(), op);
            assert_eq!(op.negate().negate(), op);
        }
    }

    #[test]
    fn test_comparison_inversion_table() {
        assert_eq!(
            FilterOperation::GreaterThan.negate(),
            FilterOperation::LessThanOrEqual
        );
        assert_eq!(FilterOperation::LessThan.negate(), FilterOperation::GreaterThanOrEqual);
        assert_eq!(FilterOperation::NotEqual.negate(), FilterOperation::Equal);
    }

    #[test]
    fn test_flip() {
        assert_eq!(Comparison::LessThan.flip(), Comparison::GreaterThan);
        assert_eq!(Comparison::Equal.flip(), Comparison::Equal);
    }

    #[test]
    fn test_indexable_requires_case_sensitivity() {
        assert!(FilterOperation::StartsWith.is_indexable(true));
        assert!(!FilterOperation::StartsWith.is_indexable(false));
        assert!(!FilterOperation::EndsWith.is_indexable(true));
        assert!(!FilterOperation::IsNull.is_indexable(true));
    }

    #[test]
    fn test_requires_value() {
        assert!(!FilterOperation::IsNull.requires_value());
        assert!(!FilterOperation::IsType(ValueKind::Bool).requires_value());
        assert!(FilterOperation::Length(Comparison::Equal).requires_value());
    }
}
