//! Query execution
//!
//! Consumes a `QueryPlan` and produces records from a `RecordStore`.
//!
//! # Execution flow
//!
//! 1. Indexed lookups, concurrently with a small bound
//! 2. One primary-key ordered cursor pass for the remaining AND-groups
//! 3. Deduplication by primary key across every source
//! 4. Ordering and windowing
//!
//! Store calls are the only suspension points. Each one is raced against the
//! query's `CancelToken`; a cancelled or failed query returns no records.

mod cancel;
mod cursor;
mod errors;
#[allow(clippy::module_inception)]
mod executor;
mod filters;
mod indexed;
mod keyset;
mod result;
mod window;

pub use cancel::CancelToken;
pub use cursor::{CursorExecutor, CursorOutput};
pub use errors::{ExecutorError, ExecutorResult};
pub use executor::{
    execute, ExecutorOptions, QueryExecutor, DEFAULT_FETCH_BATCH_SIZE,
    DEFAULT_MAX_CONCURRENT_LOOKUPS,
};
pub use filters::ConditionFilter;
pub use indexed::{IndexedExecutor, IndexedOutput};
pub use keyset::KeySet;
pub use result::{CursorEntry, CursorMode, ExecutionResult, KeyedRecord};
pub use window::{ResultWindower, Windowable};
