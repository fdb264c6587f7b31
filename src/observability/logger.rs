//! Structured JSON logger
//!
//! Conventions:
//! - One log line is one event, terminated by a newline
//! - The `event` key comes first, then `severity`, then the remaining
//!   fields sorted by key, so output is deterministic and diffable
//! - Writes are synchronous and unbuffered
//! - TRACE/INFO/WARN go to stdout, ERROR/FATAL to stderr
//!
//! String escaping is delegated to serde_json's serializer; only the
//! line framing (key order, commas, braces) is assembled here. A
//! process-wide minimum severity gates emission; embedded hosts that
//! want a quiet library raise it to `Warn`.

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU8, Ordering};

/// Log severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Per-operation detail (index queries, stride counts)
    Trace = 0,
    /// Normal lifecycle events
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// Unrecoverable state, the caller is expected to stop
    Fatal = 4,
}

impl Severity {
    /// String form used in log output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    fn from_u8(raw: u8) -> Severity {
        match raw {
            0 => Severity::Trace,
            1 => Severity::Info,
            2 => Severity::Warn,
            3 => Severity::Error,
            _ => Severity::Fatal,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Minimum severity that is actually emitted. Defaults to `Info`.
static MIN_SEVERITY: AtomicU8 = AtomicU8::new(Severity::Info as u8);

/// Structured JSON logger.
pub struct Logger;

impl Logger {
    /// Set the process-wide minimum severity.
    pub fn set_min_severity(severity: Severity) {
        MIN_SEVERITY.store(severity as u8, Ordering::Relaxed);
    }

    /// Current minimum severity.
    pub fn min_severity() -> Severity {
        Severity::from_u8(MIN_SEVERITY.load(Ordering::Relaxed))
    }

    /// Log an event with the given severity and fields.
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if severity < Self::min_severity() {
            return;
        }

        let line = render_line(severity, event, fields);
        if severity >= Severity::Error {
            Self::emit(&line, &mut io::stderr());
        } else {
            Self::emit(&line, &mut io::stdout());
        }
    }

    /// Log at TRACE level.
    pub fn trace(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Trace, event, fields);
    }

    /// Log at INFO level.
    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    /// Log at WARN level.
    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    /// Log at ERROR level.
    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Error, event, fields);
    }

    /// Log at FATAL level.
    pub fn fatal(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Fatal, event, fields);
    }

    fn emit<W: Write>(line: &str, writer: &mut W) {
        // One write_all so concurrent loggers cannot interleave a line
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }
}

/// Renders one complete log line.
///
/// The line is a flat walk over `(event, severity, sorted fields)` as a
/// single key/value sequence; position zero decides where the commas go
/// and nothing else is special-cased.
fn render_line(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut ordered: Vec<(&str, &str)> = fields.to_vec();
    ordered.sort_by_key(|(key, _)| *key);

    let head = [("event", event), ("severity", severity.as_str())];

    let mut line = String::with_capacity(64 + 32 * ordered.len());
    line.push('{');
    for (position, (key, value)) in head.into_iter().chain(ordered).enumerate() {
        if position > 0 {
            line.push(',');
        }
        push_json_string(&mut line, key);
        line.push(':');
        push_json_string(&mut line, value);
    }
    line.push_str("}\n");
    line
}

/// Appends `raw` as a quoted, escaped JSON string.
fn push_json_string(line: &mut String, raw: &str) {
    match serde_json::to_string(raw) {
        Ok(quoted) => line.push_str(&quoted),
        // Serializing a bare &str cannot fail; keep the line well formed
        // regardless
        Err(_) => line.push_str("\"\""),
    }
}
