//! Structural simplification of a DNF list
//!
//! Runs after distribution: canonicalizes every AND-group, drops groups
//! that can never match, removes duplicates and drops every group that is a
//! strict superset of another group in the same list.

use std::cmp::Ordering;

use serde_json::Value;

use crate::condition::{AndGroup, FilterCondition, FilterOperation, OrGroup};
use crate::value::{compare_scalars, fold_case, values_equal, ValueKind};

/// Canonical, contradiction-free, subsumption-reduced OR-list
pub(crate) fn simplify(groups: Vec<Vec<FilterCondition>>) -> OrGroup {
    let candidates: Vec<AndGroup> = groups
        .into_iter()
        .map(AndGroup::new)
        .filter(|group| !is_contradiction(group))
        .collect();

    // Sorted and deduplicated, shortest groups first
    let sorted = OrGroup::new(candidates).into_groups();

    let mut kept: Vec<AndGroup> = Vec::with_capacity(sorted.len());
    for group in sorted {
        if !kept.iter().any(|k| k.is_subset_of(&group)) {
            kept.push(group);
        }
    }
    OrGroup::new(kept)
}

/// Returns true if no record can satisfy every condition of `group`
pub(crate) fn is_contradiction(group: &AndGroup) -> bool {
    group.fields().into_iter().any(|field| {
        let conditions: Vec<&FilterCondition> = group.conditions_on(field).collect();
        conditions.iter().enumerate().any(|(i, a)| {
            conditions[i + 1..]
                .iter()
                .any(|b| conflicts(a, b) || conflicts(b, a))
        })
    })
}

/// One-directional conflict check between two conditions on the same field
fn conflicts(a: &FilterCondition, b: &FilterCondition) -> bool {
    use FilterOperation as Op;

    match (&a.operation, &b.operation) {
        // Null satisfies only null checks and type checks
        (Op::IsNull, Op::IsNotNull) => true,
        (Op::IsNull, Op::IsType(kind)) => *kind != ValueKind::Null,
        (Op::IsNull, op) => op.requires_value(),
        (Op::IsType(x), Op::IsType(y)) => x.is_disjoint(y),
        (Op::IsType(x), Op::IsNotType(y)) => x == y,
        (Op::IsType(kind), Op::Equal) => b.value.as_ref().is_some_and(|v| !kind.matches(v)),
        (Op::Equal, other) => match (&a.value, &b.value, comparable(a, b)) {
            (Some(x), Some(y), Some(case_sensitive)) => {
                let (x, y) = normalize(x, y, case_sensitive);
                match other {
                    Op::Equal => !values_equal(&x, &y),
                    Op::NotEqual => values_equal(&x, &y),
                    op => match op.as_comparison() {
                        Some(cmp) => !compare_scalars(&x, &y).is_some_and(|o| cmp.holds(o)),
                        None => false,
                    },
                }
            }
            _ => false,
        },
        (lower, upper) if is_lower(lower) && is_upper(upper) => {
            match (&a.value, &b.value, comparable(a, b)) {
                (Some(x), Some(y), Some(case_sensitive)) => {
                    let (x, y) = normalize(x, y, case_sensitive);
                    match compare_scalars(&x, &y) {
                        Some(Ordering::Greater) | None => true,
                        Some(Ordering::Equal) => {
                            *lower == Op::GreaterThan || *upper == Op::LessThan
                        }
                        Some(Ordering::Less) => false,
                    }
                }
                _ => false,
            }
        }
        _ => false,
    }
}

fn is_lower(op: &FilterOperation) -> bool {
    matches!(op, FilterOperation::GreaterThan | FilterOperation::GreaterThanOrEqual)
}

fn is_upper(op: &FilterOperation) -> bool {
    matches!(op, FilterOperation::LessThan | FilterOperation::LessThanOrEqual)
}

/// Returns the shared case sensitivity, or `None` when the two conditions
/// compare strings under different rules
fn comparable(a: &FilterCondition, b: &FilterCondition) -> Option<bool> {
    let is_string = |c: &FilterCondition| c.value.as_ref().is_some_and(Value::is_string);
    if !is_string(a) || !is_string(b) {
        return Some(true);
    }
    (a.case_sensitive == b.case_sensitive).then_some(a.case_sensitive)
}

fn normalize(x: &Value, y: &Value, case_sensitive: bool) -> (Value, Value) {
    if case_sensitive {
        (x.clone(), y.clone())
    } else {
        (fold_case(x), fold_case(y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn group(conditions: Vec<FilterCondition>) -> AndGroup {
        AndGroup::new(conditions)
    }

    #[test]
    fn test_conflicting_equalities() {
        assert!(is_contradiction(&group(vec![
            FilterCondition::eq("a", json!(1)),
            FilterCondition::eq("a", json!(2)),
        ])));
        assert!(!is_contradiction(&group(vec![
            FilterCondition::eq("a", json!(1)),
            FilterCondition::eq("a", json!(1.0)),
        ])));
        assert!(is_contradiction(&group(vec![
            FilterCondition::eq("a", json!(1)),
            FilterCondition::ne("a", json!(1)),
        ])));
        assert!(is_contradiction(&group(vec![
            FilterCondition::eq("a", json!(3)),
            FilterCondition::gt("a", json!(5)),
        ])));
    }

    #[test]
    fn test_empty_ranges() {
        assert!(is_contradiction(&group(vec![
            FilterCondition::gt("a", json!(5)),
            FilterCondition::lt("a", json!(5)),
        ])));
        assert!(is_contradiction(&group(vec![
            FilterCondition::gte("a", json!(5)),
            FilterCondition::lt("a", json!(5)),
        ])));
        assert!(!is_contradiction(&group(vec![
            FilterCondition::gte("a", json!(5)),
            FilterCondition::lte("a", json!(5)),
        ])));
        assert!(is_contradiction(&group(vec![
            FilterCondition::gt("a", json!(5)),
            FilterCondition::lt("a", json!("z")),
        ])));
    }

    #[test]
    fn test_null_and_type_conflicts() {
        assert!(is_contradiction(&group(vec![
            FilterCondition::is_null("a"),
            FilterCondition::ne("a", json!(1)),
        ])));
        assert!(is_contradiction(&group(vec![
            FilterCondition::is_null("a"),
            FilterCondition::is_not_null("a"),
        ])));
        assert!(is_contradiction(&group(vec![
            FilterCondition::unary("a", FilterOperation::IsType(ValueKind::String)),
            FilterCondition::unary("a", FilterOperation::IsType(ValueKind::Bool)),
        ])));
        assert!(!is_contradiction(&group(vec![
            FilterCondition::unary("a", FilterOperation::IsType(ValueKind::Number)),
            FilterCondition::unary("a", FilterOperation::IsType(ValueKind::Integer)),
        ])));
        assert!(is_contradiction(&group(vec![
            FilterCondition::unary("a", FilterOperation::IsType(ValueKind::String)),
            FilterCondition::eq("a", json!(4)),
        ])));
    }

    #[test]
    fn test_case_insensitive_equalities() {
        let upper = FilterCondition::eq("name", json!("BOB")).with_case_sensitive(false);
        let lower = FilterCondition::eq("name", json!("bob")).with_case_sensitive(false);
        assert!(!is_contradiction(&group(vec![upper.clone(), lower])));
        // Mixed sensitivity is never declared contradictory
        let exact = FilterCondition::eq("name", json!("alice"));
        assert!(!is_contradiction(&group(vec![upper, exact])));
    }

    #[test]
    fn test_subsumption_and_dedup() {
        let a = FilterCondition::eq("a", json!(1));
        let b = FilterCondition::eq("b", json!(2));
        let c = FilterCondition::eq("c", json!(3));
        let or_group = simplify(vec![
            vec![a.clone(), b.clone()],
            vec![b.clone(), a.clone()],
            vec![a.clone()],
            vec![c.clone(), b.clone()],
        ]);
        assert_eq!(or_group.len(), 2);
        assert_eq!(or_group.groups()[0].conditions(), &[a]);
        assert_eq!(or_group.groups()[1].conditions(), &[b, c]);
    }

    #[test]
    fn test_empty_group_subsumes_everything() {
        let or_group = simplify(vec![vec![FilterCondition::eq("a", json!(1))], vec![]]);
        assert!(or_group.is_always());
        assert_eq!(or_group.len(), 1);
    }
}
