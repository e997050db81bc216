//! Structured event log — one JSON object per line.
//!
//! Records session, prediction, history, export and web activity to
//! `~/.gridcast/events.jsonl` (configurable). Entries below the configured
//! level are dropped.
//!
//! Best-effort: failures to create or append to the file are silently
//! ignored, logging never fails an operation.

use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::expand_home;
use crate::config::schema::LoggingConfig;

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn parse(val: &str) -> Option<Self> {
        match val.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Event entry
// ---------------------------------------------------------------------------

/// A single line in the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: String,
    pub level: Level,
    /// Dotted event name, e.g. `prediction.failed`.
    pub event: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

/// Appends events to a JSONL file. A disabled log discards everything.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: Option<PathBuf>,
    min_level: Level,
}

impl EventLog {
    pub fn from_config(config: &LoggingConfig) -> Self {
        Self {
            path: config.enabled.then(|| expand_home(&config.path)),
            min_level: Level::parse(&config.level).unwrap_or(Level::Info),
        }
    }

    /// Log to an explicit file.
    pub fn to_file(path: impl Into<PathBuf>, min_level: Level) -> Self {
        Self {
            path: Some(path.into()),
            min_level,
        }
    }

    pub fn disabled() -> Self {
        Self {
            path: None,
            min_level: Level::Error,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn debug(&self, event: &str, message: impl Into<String>) {
        self.log(Level::Debug, event, message);
    }

    pub fn info(&self, event: &str, message: impl Into<String>) {
        self.log(Level::Info, event, message);
    }

    pub fn warn(&self, event: &str, message: impl Into<String>) {
        self.log(Level::Warn, event, message);
    }

    pub fn error(&self, event: &str, message: impl Into<String>) {
        self.log(Level::Error, event, message);
    }

    pub fn log(&self, level: Level, event: &str, message: impl Into<String>) {
        if level < self.min_level {
            return;
        }
        let Some(path) = &self.path else {
            return;
        };

        let entry = Event {
            timestamp: Utc::now().to_rfc3339(),
            level,
            event: event.to_string(),
            message: message.into(),
        };
        let _ = append_event(path, &entry);
    }
}

fn append_event(path: &Path, event: &Event) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(event)?;
    writeln!(file, "{json}")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
