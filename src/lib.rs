//! aeroquery - adaptive predicate compiler and query planner for record stores
//!
//! A query runs in three stages:
//!
//! 1. `compiler` lowers a boolean filter expression into disjunctive normal
//!    form (an OR of AND-groups of atomic conditions)
//! 2. `planner` partitions the groups into indexed lookups and groups that
//!    need a full primary-key ordered cursor pass
//! 3. `executor` runs both against a `RecordStore`, deduplicates by primary
//!    key and applies ordering and pagination
//!
//! `QueryEngine` wires the stages together with configuration, logging and
//! metrics.

pub mod catalog;
pub mod compiler;
pub mod condition;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod observability;
pub mod planner;
pub mod query;
pub mod store;
pub mod value;

pub use catalog::IndexCatalog;
pub use compiler::{compile, CompiledFilter, Expr, FieldRef, Operand, PredicateCompiler};
pub use condition::{AndGroup, FilterCondition, FilterOperation, QueryAddition};
pub use config::EngineConfig;
pub use engine::QueryEngine;
pub use error::{QueryError, QueryResult};
pub use executor::{execute, CancelToken, ExecutionResult};
pub use planner::{plan, ExplainPlan, QueryPlan};
pub use query::Query;
pub use store::{MemoryStore, Record, RecordStore};
