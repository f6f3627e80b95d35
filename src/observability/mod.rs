//! Observability for the query pipeline
//!
//! - Structured logging (one JSON object per line, off by default)
//! - Lock-free counters
//! - Typed lifecycle events
//!
//! Observability is read-only: it never changes query results.
//!
//! ```ignore
//! use aeroquery::observability::{Event, LogLevel, Logger, MetricsRegistry};
//!
//! let logger = Logger::new(LogLevel::Info);
//! logger.event(Event::QueryComplete, &[("returned", "42")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_executed();
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{LogBuffer, LogLevel, Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::ObservationScope;
