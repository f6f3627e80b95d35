//! Result windowing
//!
//! Applies query additions, in order, to a candidate sequence:
//!
//! 1. Base order: primary key (or scan sequence), unless the store already
//!    delivered the first ordering natively
//! 2. `OrderBy` / `OrderByDescending`: stable sorts; ties keep base order
//! 3. `Skip`, `Take`, `TakeLast`, `First`, `Last`: positional windows
//!
//! Missing ordering values sort first (last when descending).

use std::cmp::Ordering;

use serde_json::Value;

use crate::condition::QueryAddition;
use crate::value::compare_values;

/// An item the windower can order
pub trait Windowable {
    /// Value of an ordering field
    fn sort_value(&self, field: &str) -> Option<&Value>;

    /// Base order used before any explicit ordering
    fn base_cmp(&self, other: &Self) -> Ordering;
}

/// Applies ordering and windowing additions
pub struct ResultWindower;

impl ResultWindower {
    /// Orders and windows `items`.
    ///
    /// With `native_ordering` the input is trusted to be in the order of the
    /// first addition (an `OrderBy`), so neither the base sort nor that sort
    /// runs.
    pub fn apply<T: Windowable>(
        mut items: Vec<T>,
        additions: &[QueryAddition],
        native_ordering: bool,
    ) -> Vec<T> {
        let mut native = native_ordering;
        if !native {
            items.sort_by(|a, b| a.base_cmp(b));
        }

        for addition in additions {
            match addition {
                QueryAddition::OrderBy(field) => {
                    if std::mem::take(&mut native) {
                        continue;
                    }
                    items.sort_by(|a, b| compare_values(a.sort_value(field), b.sort_value(field)));
                }
                QueryAddition::OrderByDescending(field) => {
                    native = false;
                    items.sort_by(|a, b| compare_values(b.sort_value(field), a.sort_value(field)));
                }
                QueryAddition::Skip(n) => {
                    let at = (*n).min(items.len());
                    items = items.split_off(at);
                }
                QueryAddition::Take(n) => items.truncate(*n),
                QueryAddition::TakeLast(n) => {
                    let at = items.len().saturating_sub(*n);
                    items = items.split_off(at);
                }
                QueryAddition::First => items.truncate(1),
                QueryAddition::Last => {
                    let at = items.len().saturating_sub(1);
                    items = items.split_off(at);
                }
                QueryAddition::StableOrdering => {}
            }
        }

        items
    }
}
