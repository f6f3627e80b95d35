//! Query planner
//!
//! Partitions a compiled filter into indexed lookups and cursor-evaluated
//! groups, and decides whether ordering or pagination force the whole query
//! onto the cursor path.
//!
//! # Forcing rules
//!
//! - Ordering on a field without a single-field index
//! - `TakeLast` before any ordering
//! - Pagination over more than one indexed lookup
//!
//! A forced plan evaluates every AND-group during one ordered cursor pass.

mod bounds;
mod errors;
mod explain;
mod lookup;
#[allow(clippy::module_inception)]
mod planner;

pub use bounds::merge_range;
pub use errors::{PlanError, PlanResult};
pub use explain::ExplainPlan;
pub use lookup::{IndexAccess, IndexedLookup};
pub use planner::{plan, ForceReason, PlanDiagnostic, QueryPlan, QueryPlanner};
