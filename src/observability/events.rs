//! Query lifecycle events
//!
//! Events are explicit and typed; each has a stable name and a default
//! severity.

use std::fmt;

use super::logger::Severity;

/// Observable events of the query pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Engine configuration loaded and validated
    ConfigLoaded,

    // Compilation
    CompileBegin,
    CompileComplete,
    /// Predicate rejected by the compiler
    CompileRejected,

    // Planning
    PlanComplete,
    /// Plan rejected (e.g. unindexed ordering with fallback disabled)
    PlanRejected,
    /// Whole query forced onto the cursor path
    PlanForcedCursor,
    /// AND-group partially covers a compound index
    AmbiguousCompoundIndex,

    // Execution
    QueryBegin,
    /// Indexed lookups finished
    IndexedLookups,
    /// Cursor pass finished
    CursorScanComplete,
    QueryComplete,
    QueryCancelled,
    QueryFailed,

    // Explain
    ExplainComplete,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::CompileBegin => "COMPILE_BEGIN",
            Event::CompileComplete => "COMPILE_COMPLETE",
            Event::CompileRejected => "COMPILE_REJECTED",
            Event::PlanComplete => "PLAN_COMPLETE",
            Event::PlanRejected => "PLAN_REJECTED",
            Event::PlanForcedCursor => "PLAN_FORCED_CURSOR",
            Event::AmbiguousCompoundIndex => "AMBIGUOUS_COMPOUND_INDEX",
            Event::QueryBegin => "QUERY_BEGIN",
            Event::IndexedLookups => "INDEXED_LOOKUPS",
            Event::CursorScanComplete => "CURSOR_SCAN_COMPLETE",
            Event::QueryComplete => "QUERY_COMPLETE",
            Event::QueryCancelled => "QUERY_CANCELLED",
            Event::QueryFailed => "QUERY_FAILED",
            Event::ExplainComplete => "EXPLAIN_COMPLETE",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::CompileBegin | Event::IndexedLookups | Event::CursorScanComplete => {
                Severity::Trace
            }
            Event::CompileRejected
            | Event::PlanRejected
            | Event::AmbiguousCompoundIndex
            | Event::QueryCancelled => Severity::Warn,
            Event::QueryFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
