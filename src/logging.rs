//! Request-event log.
//!
//! Every gateway event goes to `tracing` and into a bounded in-memory ring.
//! When a log file is configured, events are also appended to it as JSON
//! lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Events kept in memory for `recent`; tracing and the log file hold the rest.
pub const RECENT_ENTRIES: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub component: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl LogEntry {
    pub fn new(level: LogLevel, component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            component: component.into(),
            message: message.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, ctx: serde_json::Value) -> Self {
        self.context = Some(ctx);
        self
    }

    fn emit_tracing(&self) {
        let component = self.component.as_str();
        let message = self.message.as_str();
        match (self.level, &self.context) {
            (LogLevel::Debug, Some(ctx)) => tracing::debug!(component, %ctx, "{message}"),
            (LogLevel::Debug, None) => tracing::debug!(component, "{message}"),
            (LogLevel::Info, Some(ctx)) => tracing::info!(component, %ctx, "{message}"),
            (LogLevel::Info, None) => tracing::info!(component, "{message}"),
            (LogLevel::Warn, Some(ctx)) => tracing::warn!(component, %ctx, "{message}"),
            (LogLevel::Warn, None) => tracing::warn!(component, "{message}"),
            (LogLevel::Error, Some(ctx)) => tracing::error!(component, %ctx, "{message}"),
            (LogLevel::Error, None) => tracing::error!(component, "{message}"),
        }
    }
}

struct Logger {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    writer: Option<BufWriter<File>>,
}

impl Logger {
    fn open(file_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            ..Self::in_memory(RECENT_ENTRIES)
        })
    }

    fn in_memory(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(RECENT_ENTRIES)),
            capacity: capacity.max(1),
            writer: None,
        }
    }

    fn log(&mut self, entry: LogEntry) {
        if let Some(ref mut writer) = self.writer {
            if let Ok(json) = serde_json::to_string(&entry) {
                let _ = writeln!(writer, "{}", json);
                let _ = writer.flush();
            }
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    fn recent(&self, limit: usize) -> Vec<LogEntry> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }
}

/// Cheaply cloneable handle shared by every request.
#[derive(Clone)]
pub struct SharedLogger(Arc<Mutex<Logger>>);

impl SharedLogger {
    /// Log to `file_path` (JSON lines, appended) as well as memory.
    pub fn new(file_path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self(Arc::new(Mutex::new(Logger::open(file_path.as_ref())?))))
    }

    /// Keep only the last [`RECENT_ENTRIES`] events in memory.
    pub fn in_memory() -> Self {
        Self::with_capacity(RECENT_ENTRIES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Arc::new(Mutex::new(Logger::in_memory(capacity))))
    }

    pub fn log(&self, entry: LogEntry) {
        entry.emit_tracing();
        if let Ok(mut logger) = self.0.lock() {
            logger.log(entry);
        }
    }

    pub fn info(&self, component: impl Into<String>, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Info, component, message));
    }

    pub fn warn(&self, component: impl Into<String>, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Warn, component, message));
    }

    pub fn error(&self, component: impl Into<String>, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Error, component, message));
    }

    pub fn debug(&self, component: impl Into<String>, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Debug, component, message));
    }

    pub fn log_with_context(
        &self,
        level: LogLevel,
        component: impl Into<String>,
        message: impl Into<String>,
        context: serde_json::Value,
    ) {
        self.log(LogEntry::new(level, component, message).with_context(context));
    }

    /// Most recent entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        self.0.lock().map(|l| l.recent(limit)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_is_newest_first() {
        let logger = SharedLogger::in_memory();
        logger.info("proxy", "first");
        logger.warn("proxy", "second");

        let recent = logger.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "second");
        assert_eq!(recent[0].level, LogLevel::Warn);
        assert_eq!(recent[1].message, "first");
    }

    #[test]
    fn test_ring_is_bounded() {
        let logger = SharedLogger::with_capacity(3);
        for i in 0..5 {
            logger.debug("stream", format!("event {i}"));
        }

        let recent = logger.recent(10);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].message, "event 4");
        assert_eq!(recent[2].message, "event 2");
    }

    #[test]
    fn test_default_ring_stays_small() {
        let logger = SharedLogger::in_memory();
        for i in 0..RECENT_ENTRIES + 44 {
            logger.debug("proxy", format!("event {i}"));
        }

        let recent = logger.recent(usize::MAX);
        assert_eq!(recent.len(), RECENT_ENTRIES);
        assert_eq!(recent[0].message, format!("event {}", RECENT_ENTRIES + 43));
        assert_eq!(recent[RECENT_ENTRIES - 1].message, "event 44");
    }

    #[test]
    fn test_file_gets_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("gateway.log");

        let logger = SharedLogger::new(&path).unwrap();
        logger.log_with_context(
            LogLevel::Error,
            "stream",
            "read failed",
            serde_json::json!({"bytes": 12}),
        );

        let content = std::fs::read_to_string(&path).unwrap();
        let entry: LogEntry = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(entry.component, "stream");
        assert_eq!(entry.level, LogLevel::Error);
        assert_eq!(entry.context.unwrap()["bytes"], 12);
    }
}
