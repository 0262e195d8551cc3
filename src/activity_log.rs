//! Operator-facing activity log.
//!
//! Every decision the generator takes lands here as one entry: a local
//! timestamp, a severity and a message. The log is newest-first and capped at
//! [`MAX_ENTRIES`]; appending past the cap drops the oldest entry.
//!
//! On disk it is a JSON array:
//!
//! ```json
//! [
//!   { "date": "2026-10-18 09:12:44", "message": "Image saved: gatos-raros.jpg", "type": "SUCCESS" },
//!   { "date": "2026-10-18 09:12:41", "message": "Search term: Gatos Raros", "type": "INFO" }
//! ]
//! ```
//!
//! Entries are mirrored to the `log` facade as they are appended, so
//! `RUST_LOG=info` shows the same trail on stderr.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MAX_ENTRIES: usize = 100;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid activity log: {0}")]
    Json(#[from] serde_json::Error),
}

/// Entry severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogKind {
    Info,
    Success,
    Error,
}

impl LogKind {
    pub fn label(self) -> &'static str {
        match self {
            LogKind::Info => "INFO",
            LogKind::Success => "SUCCESS",
            LogKind::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub date: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: LogKind,
}

impl LogEntry {
    /// Entry stamped with the current local time.
    pub fn now(kind: LogKind, message: impl Into<String>) -> Self {
        Self {
            date: Local::now().format(DATE_FORMAT).to_string(),
            message: message.into(),
            kind,
        }
    }
}

/// Where activity entries go.
pub trait LogSink {
    fn append(&mut self, entry: LogEntry);

    fn info(&mut self, message: &str) {
        log::info!("{message}");
        self.append(LogEntry::now(LogKind::Info, message));
    }

    fn success(&mut self, message: &str) {
        log::info!("{message}");
        self.append(LogEntry::now(LogKind::Success, message));
    }

    fn error(&mut self, message: &str) {
        log::warn!("{message}");
        self.append(LogEntry::now(LogKind::Error, message));
    }
}

/// Capped, newest-first activity log, optionally backed by a JSON file.
#[derive(Debug, Default)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
    path: Option<PathBuf>,
}

impl ActivityLog {
    /// In-memory log with no backing file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the log at `path`. A missing file gives an empty log that will be
    /// written there on [`save`](Self::save).
    pub fn load(path: &Path) -> Result<Self, LogError> {
        let mut entries: VecDeque<LogEntry> = if path.exists() {
            let content = fs::read_to_string(path)?;
            if content.trim().is_empty() {
                VecDeque::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            VecDeque::new()
        };
        entries.truncate(MAX_ENTRIES);
        Ok(Self {
            entries,
            path: Some(path.to_path_buf()),
        })
    }

    /// Write the log back to its file. No-op for in-memory logs.
    pub fn save(&self) -> Result<(), LogError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries newest-first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LogSink for ActivityLog {
    fn append(&mut self, entry: LogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(MAX_ENTRIES);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn newest_entry_first() {
        let mut log = ActivityLog::new();
        log.info("first");
        log.success("second");
        let messages: Vec<_> = log.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["second", "first"]);
    }

    #[test]
    fn capped_at_max_entries() {
        let mut log = ActivityLog::new();
        for i in 0..150 {
            log.info(&format!("entry {i}"));
        }
        assert_eq!(log.len(), MAX_ENTRIES);
        assert_eq!(log.entries().next().unwrap().message, "entry 149");
        assert_eq!(log.entries().last().unwrap().message, "entry 50");
    }

    #[test]
    fn kinds_serialize_uppercase() {
        let entry = LogEntry {
            date: "2026-01-02 03:04:05".into(),
            message: "m".into(),
            kind: LogKind::Success,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains(r#""type":"SUCCESS""#), "{json}");
    }

    #[test]
    fn date_has_mysql_shape() {
        let entry = LogEntry::now(LogKind::Info, "x");
        assert_eq!(entry.date.len(), 19);
        assert_eq!(&entry.date[4..5], "-");
        assert_eq!(&entry.date[10..11], " ");
        assert_eq!(&entry.date[13..14], ":");
    }

    // =========================================================================
    // Persistence tests
    // =========================================================================

    #[test]
    fn save_and_reload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/activity.json");

        let mut log = ActivityLog::load(&path).unwrap();
        assert!(log.is_empty());
        log.info("a");
        log.error("b");
        log.save().unwrap();

        let reloaded = ActivityLog::load(&path).unwrap();
        let kinds: Vec<_> = reloaded.entries().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![LogKind::Error, LogKind::Info]);
    }

    #[test]
    fn load_truncates_oversized_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("activity.json");
        let entries: Vec<_> = (0..120)
            .map(|i| LogEntry::now(LogKind::Info, format!("{i}")))
            .collect();
        fs::write(&path, serde_json::to_string(&entries).unwrap()).unwrap();

        let log = ActivityLog::load(&path).unwrap();
        assert_eq!(log.len(), MAX_ENTRIES);
        assert_eq!(log.entries().next().unwrap().message, "0");
    }

    #[test]
    fn load_rejects_garbage() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("activity.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(ActivityLog::load(&path), Err(LogError::Json(_))));
    }

    #[test]
    fn clear_empties_log() {
        let mut log = ActivityLog::new();
        log.info("x");
        log.clear();
        assert!(log.is_empty());
    }
}
