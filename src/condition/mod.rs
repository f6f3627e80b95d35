//! Condition model
//!
//! Canonical data types shared by every query stage:
//!
//! - `FilterCondition`: one field comparison
//! - `AndGroup`: conjunction of conditions (canonical order, no duplicates)
//! - `OrGroup`: disjunction of AND-groups, the DNF root
//! - `QueryAddition`: ordered ordering/windowing directives
//!
//! Instances are immutable once built; extending a group produces a new one.

mod addition;
#[allow(clippy::module_inception)]
mod condition;
mod errors;
mod group;
mod operation;

pub use addition::{
    has_ordering, has_pagination, has_stable_ordering, ordering_fields,
    take_last_without_ordering, QueryAddition,
};
pub use condition::FilterCondition;
pub use errors::{ConditionError, ConditionResult};
pub use group::{AndGroup, OrGroup};
pub use operation::{Comparison, DatePart, FilterOperation};
