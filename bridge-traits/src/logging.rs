//! Host Logging Abstraction
//!
//! Diagnostics produced by the core travel through `tracing`; hosts that
//! want them in their own pipeline (Logcat, OSLog, a devtools console)
//! implement [`LoggerSink`] and hand it to the runtime's logging setup.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One diagnostic record as delivered to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    /// Emitting module, e.g. `core_stream::adapter`.
    pub target: String,
    /// Formatted human-readable message.
    pub message: String,
    /// Extra structured fields recorded on the event.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
    /// Name of the innermost span the event was emitted in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            target: target.into(),
            message: message.into(),
            fields: BTreeMap::new(),
            span: None,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_span(mut self, span: impl Into<String>) -> Self {
        self.span = Some(span.into());
        self
    }
}

/// Destination for diagnostics forwarded to the host.
///
/// Implementations must not log message bodies or full phone numbers they
/// did not receive already redacted.
#[async_trait::async_trait]
pub trait LoggerSink: Send + Sync {
    async fn log(&self, entry: LogEntry) -> Result<()>;

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Entries below this level are dropped before `log` is called.
    fn min_level(&self) -> LogLevel {
        LogLevel::Info
    }
}

/// Writes entries to standard error, one line each.
#[derive(Debug, Clone)]
pub struct StderrLogger {
    pub min_level: LogLevel,
}

impl Default for StderrLogger {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
        }
    }
}

#[async_trait::async_trait]
impl LoggerSink for StderrLogger {
    async fn log(&self, entry: LogEntry) -> Result<()> {
        let fields = entry
            .fields
            .iter()
            .map(|(k, v)| format!(" {}={}", k, v))
            .collect::<String>();
        eprintln!(
            "{} {:>5} {}: {}{}",
            entry.timestamp.format("%H:%M:%S%.3f"),
            entry.level.as_str().to_uppercase(),
            entry.target,
            entry.message,
            fields
        );
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        self.min_level
    }
}

/// Keeps every entry in memory. Handy for hosts that batch-upload
/// diagnostics and for asserting on log output in tests.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Messages of all recorded entries, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.message).collect()
    }
}

#[async_trait::async_trait]
impl LoggerSink for MemoryLogger {
    async fn log(&self, entry: LogEntry) -> Result<()> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entry_builder() {
        let entry = LogEntry::new(LogLevel::Error, "core_stream", "Reading failed")
            .with_field("collection", "threads")
            .with_span("get_threads");

        assert_eq!(entry.level, LogLevel::Error);
        assert_eq!(entry.target, "core_stream");
        assert_eq!(entry.fields.get("collection"), Some(&"threads".to_string()));
        assert_eq!(entry.span.as_deref(), Some("get_threads"));
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Error > LogLevel::Warn);
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert_eq!(LogLevel::Warn.to_string(), "warn");
    }

    #[tokio::test]
    async fn test_memory_logger_records_messages() {
        let logger = MemoryLogger::new();
        logger
            .log(LogEntry::new(LogLevel::Info, "t", "first"))
            .await
            .unwrap();
        logger
            .log(LogEntry::new(LogLevel::Error, "t", "second"))
            .await
            .unwrap();

        assert_eq!(logger.messages(), vec!["first", "second"]);
        assert_eq!(logger.min_level(), LogLevel::Trace);
    }

    #[tokio::test]
    async fn test_stderr_logger_accepts_entries() {
        let logger = StderrLogger::default();
        logger
            .log(LogEntry::new(LogLevel::Warn, "t", "hello").with_field("k", "v"))
            .await
            .unwrap();
    }
}
