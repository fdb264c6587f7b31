//! Observability for relicdb
//!
//! Structured JSON logging only. One log line = one event, synchronous,
//! deterministic key ordering. There are no metrics exporters and no
//! tracing spans; the database is embedded and the host application owns
//! any wider telemetry.

mod logger;

pub use logger::{Logger, Severity};
