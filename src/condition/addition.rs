//! Ordering and windowing directives ("query additions")
//!
//! Additions form an ordered list; application order is preserved from the
//! builder through the plan to the windower.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One ordering or windowing directive
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryAddition {
    OrderBy(String),
    OrderByDescending(String),
    Skip(usize),
    Take(usize),
    TakeLast(usize),
    First,
    Last,
    /// Suppress index-native ordering in favor of the explicit fallback order
    StableOrdering,
}

impl QueryAddition {
    /// Returns the ordering field for `OrderBy`/`OrderByDescending`
    pub fn order_field(&self) -> Option<&str> {
        match self {
            QueryAddition::OrderBy(field) | QueryAddition::OrderByDescending(field) => {
                Some(field)
            }
            _ => None,
        }
    }

    pub fn is_ordering(&self) -> bool {
        self.order_field().is_some()
    }

    /// Skip, Take, TakeLast, First, Last
    pub fn is_pagination(&self) -> bool {
        matches!(
            self,
            QueryAddition::Skip(_)
                | QueryAddition::Take(_)
                | QueryAddition::TakeLast(_)
                | QueryAddition::First
                | QueryAddition::Last
        )
    }
}

impl fmt::Display for QueryAddition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryAddition::OrderBy(field) => write!(f, "order_by({})", field),
            QueryAddition::OrderByDescending(field) => write!(f, "order_by_descending({})", field),
            QueryAddition::Skip(n) => write!(f, "skip({})", n),
            QueryAddition::Take(n) => write!(f, "take({})", n),
            QueryAddition::TakeLast(n) => write!(f, "take_last({})", n),
            QueryAddition::First => write!(f, "first()"),
            QueryAddition::Last => write!(f, "last()"),
            QueryAddition::StableOrdering => write!(f, "stable_ordering()"),
        }
    }
}

/// Returns true if any addition paginates
pub fn has_pagination(additions: &[QueryAddition]) -> bool {
    additions.iter().any(QueryAddition::is_pagination)
}

/// Returns true if any addition orders
pub fn has_ordering(additions: &[QueryAddition]) -> bool {
    additions.iter().any(QueryAddition::is_ordering)
}

/// Returns true if `StableOrdering` is present
pub fn has_stable_ordering(additions: &[QueryAddition]) -> bool {
    additions.contains(&QueryAddition::StableOrdering)
}

/// Ordering fields in application order, without duplicates
pub fn ordering_fields(additions: &[QueryAddition]) -> Vec<&str> {
    let mut fields: Vec<&str> = Vec::new();
    for field in additions.iter().filter_map(QueryAddition::order_field) {
        if !fields.contains(&field) {
            fields.push(field);
        }
    }
    fields
}

/// Returns true if a `TakeLast` appears before any ordering directive
pub fn take_last_without_ordering(additions: &[QueryAddition]) -> bool {
    for addition in additions {
        match addition {
            a if a.is_ordering() => return false,
            QueryAddition::TakeLast(_) => return true,
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_last_needs_preceding_order() {
        assert!(take_last_without_ordering(&[QueryAddition::TakeLast(2)]));
        assert!(take_last_without_ordering(&[
            QueryAddition::TakeLast(2),
            QueryAddition::OrderBy("age".into()),
        ]));
        assert!(!take_last_without_ordering(&[
            QueryAddition::OrderBy("age".into()),
            QueryAddition::TakeLast(2),
        ]));
        assert!(!take_last_without_ordering(&[QueryAddition::Take(2)]));
    }

    #[test]
    fn test_ordering_fields_dedup_preserves_order() {
        let additions = [
            QueryAddition::OrderBy("b".into()),
            QueryAddition::Skip(1),
            QueryAddition::OrderByDescending("a".into()),
            QueryAddition::OrderBy("b".into()),
        ];
        assert_eq!(ordering_fields(&additions), vec!["b", "a"]);
    }

    #[test]
    fn test_classification() {
        assert!(QueryAddition::First.is_pagination());
        assert!(!QueryAddition::StableOrdering.is_pagination());
        assert!(!QueryAddition::StableOrdering.is_ordering());
        assert!(has_stable_ordering(&[QueryAddition::StableOrdering]));
    }
}
