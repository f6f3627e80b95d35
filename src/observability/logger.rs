//! Structured JSON logger
//!
//! - One log line = one event
//! - `event` first, `severity` second, then fields sorted by key
//! - Synchronous, no buffering
//! - Gated by a `LogLevel` threshold; `Off` (the default) emits nothing

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::events::Event;

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug-level detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Minimum severity a logger emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Off,
    Trace,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn threshold(self) -> Option<Severity> {
        match self {
            LogLevel::Off => None,
            LogLevel::Trace => Some(Severity::Trace),
            LogLevel::Info => Some(Severity::Info),
            LogLevel::Warn => Some(Severity::Warn),
            LogLevel::Error => Some(Severity::Error),
        }
    }
}

/// In-memory log sink, shared between a logger and its reader
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl LogBuffer {
    /// Everything written so far
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Parsed log lines; unparseable lines are skipped
    pub fn lines(&self) -> Vec<Value> {
        self.contents()
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    /// Event names in emission order
    pub fn events(&self) -> Vec<String> {
        self.lines()
            .iter()
            .filter_map(|line| line["event"].as_str().map(str::to_string))
            .collect()
    }

    fn append(&self, line: &str) {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(line.as_bytes());
    }
}

#[derive(Debug, Clone)]
enum Sink {
    /// stdout, stderr for errors
    Std,
    Buffer(LogBuffer),
}

/// A structured logger that outputs JSON lines
#[derive(Debug, Clone)]
pub struct Logger {
    level: LogLevel,
    sink: Sink,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogLevel::Off)
    }
}

impl Logger {
    /// Logger writing to stdout/stderr
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            sink: Sink::Std,
        }
    }

    /// Logger writing into a shared buffer
    pub fn capturing(level: LogLevel) -> (Self, LogBuffer) {
        let buffer = LogBuffer::default();
        let logger = Self {
            level,
            sink: Sink::Buffer(buffer.clone()),
        };
        (logger, buffer)
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Returns true if lines of `severity` are emitted
    pub fn enabled(&self, severity: Severity) -> bool {
        self.level
            .threshold()
            .is_some_and(|threshold| severity >= threshold)
    }

    /// Log an event with the given severity and fields
    pub fn log(&self, severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if !self.enabled(severity) {
            return;
        }
        match &self.sink {
            Sink::Std if severity >= Severity::Error => {
                Self::log_to_writer(severity, event, fields, &mut io::stderr())
            }
            Sink::Std => Self::log_to_writer(severity, event, fields, &mut io::stdout()),
            Sink::Buffer(buffer) => buffer.append(&Self::format_line(severity, event, fields)),
        }
    }

    /// Log a typed lifecycle event at its default severity
    pub fn event(&self, event: Event, fields: &[(&str, &str)]) {
        self.log(event.severity(), event.as_str(), fields);
    }

    /// Writes one line to `writer`, ignoring write failures
    pub fn log_to_writer<W: Write>(
        severity: Severity,
        event: &str,
        fields: &[(&str, &str)],
        writer: &mut W,
    ) {
        let line = Self::format_line(severity, event, fields);
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }

    /// Renders one newline-terminated JSON object
    pub fn format_line(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut output = String::with_capacity(128);
        output.push_str("{\"event\":");
        output.push_str(&Value::from(event).to_string());
        output.push_str(",\"severity\":\"");
        output.push_str(severity.as_str());
        output.push('"');

        let mut sorted: Vec<&(&str, &str)> = fields.iter().collect();
        sorted.sort_by_key(|(key, _)| *key);
        for (key, value) in sorted {
            output.push(',');
            output.push_str(&Value::from(*key).to_string());
            output.push(':');
            output.push_str(&Value::from(*value).to_string());
        }

        output.push_str("}\n");
        output
    }

    /// Log at TRACE level
    pub fn trace(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Trace, event, fields);
    }

    /// Log at INFO level
    pub fn info(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Info, event, fields);
    }

    /// Log at WARN level
    pub fn warn(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Warn, event, fields);
    }

    /// Log at ERROR level
    pub fn error(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Error, event, fields);
    }
}
