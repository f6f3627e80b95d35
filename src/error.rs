//! Crate-level error type
//!
//! Every subsystem owns its error enum with a stable `AERO_*` code. `QueryError`
//! wraps them so host code can propagate with `?` across the whole pipeline.
//!
//! Severity:
//! - `Reject`: the query itself is unacceptable (compile, plan, config)
//! - `Error`: a valid query failed while running (storage, cancellation)

use std::fmt;

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::compiler::CompileError;
use crate::config::ConfigError;
use crate::executor::ExecutorError;
use crate::planner::PlanError;
use crate::store::StoreError;

/// Error severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Rejected before touching the store
    Reject,
    /// Failed during execution
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Reject => "REJECT",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result type spanning the whole pipeline
pub type QueryResult<T> = Result<T, QueryError>;

/// Any failure of compile, plan or execute
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Execution(#[from] ExecutorError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl QueryError {
    /// Returns the stable error code of the wrapped error
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Compile(e) => e.code(),
            QueryError::Plan(e) => e.code(),
            QueryError::Execution(e) => e.code(),
            QueryError::Catalog(e) => e.code(),
            QueryError::Config(e) => e.code(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            QueryError::Execution(e) => e.severity(),
            _ => Severity::Reject,
        }
    }

    /// Returns true if the query was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, QueryError::Execution(ExecutorError::Cancelled))
    }
}

impl From<StoreError> for QueryError {
    fn from(err: StoreError) -> Self {
        QueryError::Execution(ExecutorError::Storage(err))
    }
}
