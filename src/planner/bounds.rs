//! Range bound merging
//!
//! Folds the `>`/`>=`/`<`/`<=` conditions of one field into a single
//! `KeyRange` holding the tightest lower and upper bound with exact
//! inclusivity. Bounds whose values cannot be compared keep the first one
//! seen; such groups are contradictions and are removed by the compiler.

use std::cmp::Ordering;

use crate::condition::{FilterCondition, FilterOperation};
use crate::store::{KeyRange, RangeBound};
use crate::value::compare_scalars;

/// Builds the merged range of `conditions`, ignoring non-range operations.
///
/// Returns `None` when no range condition is present.
pub fn merge_range<'a>(conditions: impl IntoIterator<Item = &'a FilterCondition>) -> Option<KeyRange> {
    let mut range = KeyRange::default();
    let mut seen = false;

    for condition in conditions {
        let Some(value) = &condition.value else {
            continue;
        };
        match condition.operation {
            FilterOperation::GreaterThan | FilterOperation::GreaterThanOrEqual => {
                let bound = RangeBound {
                    value: value.clone(),
                    inclusive: condition.operation == FilterOperation::GreaterThanOrEqual,
                };
                range.lower = Some(tighter(range.lower.take(), bound, Ordering::Greater));
                seen = true;
            }
            FilterOperation::LessThan | FilterOperation::LessThanOrEqual => {
                let bound = RangeBound {
                    value: value.clone(),
                    inclusive: condition.operation == FilterOperation::LessThanOrEqual,
                };
                range.upper = Some(tighter(range.upper.take(), bound, Ordering::Less));
                seen = true;
            }
            _ => {}
        }
    }

    seen.then_some(range)
}

/// Picks the more restrictive bound. `direction` is the ordering a tighter
/// value has relative to a looser one.
fn tighter(current: Option<RangeBound>, candidate: RangeBound, direction: Ordering) -> RangeBound {
    let Some(current) = current else {
        return candidate;
    };
    match compare_scalars(&candidate.value, &current.value) {
        Some(o) if o == direction => candidate,
        // Same value: exclusive is tighter
        Some(Ordering::Equal) if !candidate.inclusive => candidate,
        _ => current,
    }
}
