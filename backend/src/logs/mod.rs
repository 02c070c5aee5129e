//! Run log for the report pipeline.
//!
//! Every stage reports what it did through the free functions below. Entries
//! are echoed to stderr and published on a broadcast channel. A [`RunLog`]
//! subscribes for the length of one run and hands back what was logged, which
//! the pipeline attaches to its result.

use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Entries a slow run-log reader may fall behind by before older ones are skipped.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    fn marker(&self) -> &'static str {
        match self {
            LogLevel::Info => " ",
            LogLevel::Success => "✓",
            LogLevel::Warning => "⚠",
            LogLevel::Error => "✗",
        }
    }
}

/// One line of the run log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth for per-stage detail lines
    #[serde(default)]
    pub indent: u8,
    pub logged_at: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            indent: 0,
            logged_at: Utc::now(),
        }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = "   ".repeat(self.indent as usize + 1);
        write!(f, "{}{} {}", indent, self.level.marker(), self.message)
    }
}

/// Process-wide run log channel
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Echo to stderr, then publish; no subscriber is fine.
    pub fn log(&self, entry: LogEntry) {
        eprintln!("{}", entry);
        let _ = self.sender.send(entry);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Run Capture
// =============================================================================

/// Collects the entries logged between [`RunLog::start`] and [`RunLog::finish`].
///
/// Entries from other threads logging at the same time are collected too.
pub struct RunLog {
    rx: broadcast::Receiver<LogEntry>,
}

impl RunLog {
    pub fn start() -> Self {
        Self::on(&LOG_BROADCASTER)
    }

    pub fn on(broadcaster: &LogBroadcaster) -> Self {
        Self {
            rx: broadcaster.subscribe(),
        }
    }

    /// Everything buffered so far; entries lost to lag are skipped.
    pub fn finish(mut self) -> Vec<LogEntry> {
        use broadcast::error::TryRecvError;

        let mut entries = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(entry) => entries.push(entry),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        entries
    }
}

fn emit(level: LogLevel, msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::new(level, msg).with_indent(indent));
}

pub fn log_info(msg: impl Into<String>) {
    emit(LogLevel::Info, msg, 0);
}

pub fn log_success(msg: impl Into<String>) {
    emit(LogLevel::Success, msg, 0);
}

pub fn log_warning(msg: impl Into<String>) {
    emit(LogLevel::Warning, msg, 0);
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    emit(LogLevel::Info, msg, indent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_log_collects_entries() {
        let broadcaster = LogBroadcaster::new();
        let run = RunLog::on(&broadcaster);

        broadcaster.log(LogEntry::new(LogLevel::Warning, "master data unavailable").with_indent(1));
        broadcaster.log(LogEntry::new(LogLevel::Success, "done"));

        let entries = run.finish();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, LogLevel::Warning);
        assert_eq!(entries[0].indent, 1);
        assert_eq!(entries[1].message, "done");
    }

    #[test]
    fn test_run_log_skips_lagged_entries() {
        let broadcaster = LogBroadcaster::new();
        let run = RunLog::on(&broadcaster);
        for i in 0..CHANNEL_CAPACITY + 10 {
            broadcaster.log(LogEntry::new(LogLevel::Info, format!("line {}", i)));
        }

        let entries = run.finish();
        assert_eq!(entries.len(), CHANNEL_CAPACITY);
        assert_eq!(entries.last().unwrap().message, format!("line {}", CHANNEL_CAPACITY + 9));
    }

    #[test]
    fn test_log_without_subscribers_is_silent() {
        let broadcaster = LogBroadcaster::new();
        broadcaster.log(LogEntry::new(LogLevel::Info, "nobody listening"));
    }

    #[test]
    fn test_display_indents_and_marks() {
        let entry = LogEntry::new(LogLevel::Success, "Read 3 rows").with_indent(1);
        assert_eq!(entry.to_string(), "      ✓ Read 3 rows");
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let json = serde_json::to_value(LogEntry::new(LogLevel::Success, "done")).unwrap();
        assert_eq!(json["level"], "success");
        assert_eq!(json["indent"], 0);
        assert!(json["loggedAt"].is_string());
    }
}
