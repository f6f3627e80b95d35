//! ObservationScope for begin/complete logging
//!
//! - Logs `{name}_BEGIN` on creation
//! - Logs `{name}_COMPLETE` on `complete`, `{name}_ERROR` on `fail`
//! - Logs `{name}_INCOMPLETE` if dropped without either

use std::time::Instant;

use super::logger::{Logger, Severity};

/// A scope that logs the start and outcome of one operation
///
/// ```ignore
/// let scope = ObservationScope::new(&logger, "QUERY");
/// // ... do work ...
/// scope.complete_with_fields(&[("returned", "3")]);
/// ```
pub struct ObservationScope<'a> {
    logger: &'a Logger,
    name: &'a str,
    completed: bool,
    fields: Vec<(&'a str, String)>,
    started: Instant,
}

impl<'a> ObservationScope<'a> {
    /// Create a new observation scope; logs `{name}_BEGIN` immediately
    pub fn new(logger: &'a Logger, name: &'a str) -> Self {
        Self::with_fields(logger, name, &[])
    }

    /// Create a new observation scope whose fields repeat on every line
    pub fn with_fields(logger: &'a Logger, name: &'a str, fields: &[(&'a str, &str)]) -> Self {
        logger.log(Severity::Trace, &format!("{}_BEGIN", name), fields);
        Self {
            logger,
            name,
            completed: false,
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            started: Instant::now(),
        }
    }

    /// Logs `{name}_COMPLETE` at INFO level
    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    /// Logs `{name}_COMPLETE` with extra fields and the elapsed time
    pub fn complete_with_fields(mut self, extra: &[(&str, &str)]) {
        self.completed = true;
        let elapsed = self.elapsed_ms();
        let mut fields = self.field_refs();
        fields.extend(extra.iter().copied());
        fields.push(("elapsed_ms", elapsed.as_str()));
        self.logger
            .log(Severity::Info, &format!("{}_COMPLETE", self.name), &fields);
    }

    /// Logs `{name}_ERROR` with the failure's code and reason
    pub fn fail(mut self, severity: Severity, code: &str, reason: &str) {
        self.completed = true;
        let mut fields = self.field_refs();
        fields.push(("code", code));
        fields.push(("reason", reason));
        self.logger
            .log(severity, &format!("{}_ERROR", self.name), &fields);
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    fn field_refs(&self) -> Vec<(&str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect()
    }

    fn elapsed_ms(&self) -> String {
        self.started.elapsed().as_millis().to_string()
    }
}

impl Drop for ObservationScope<'_> {
    fn drop(&mut self) {
        if !self.completed {
            let event = format!("{}_INCOMPLETE", self.name);
            self.logger
                .warn(&event, &[("reason", "scope dropped without completion")]);
        }
    }
}
