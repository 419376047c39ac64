//! Run report: the ordered, append-only message log of one migration run.
//!
//! Every message is also emitted through `tracing` at the matching level,
//! so the report can be rendered by a thin presentation layer while normal
//! log collection still sees everything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info, warn};

/// Severity of a report entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for ReportLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportLevel::Info => write!(f, "INFO"),
            ReportLevel::Warning => write!(f, "WARNING"),
            ReportLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// One message produced during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub level: ReportLevel,
    pub message: String,
}

/// Accumulated result of one migration run.
///
/// Created at run start, appended to while the run progresses, and handed
/// back to the caller at the end. Nothing is persisted across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Ordered messages, one per unit of work worth reporting.
    pub entries: Vec<ReportEntry>,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed. `None` while still in progress.
    pub completed_at: Option<DateTime<Utc>>,

    /// Attributes selected for migration during discovery.
    pub attributes_selected: usize,

    /// Attributes whose migration failed and was skipped.
    pub attributes_failed: usize,

    /// Rows whose stored bytes actually changed.
    pub rows_updated: u64,

    /// File lookups that found no record; the affected values were kept.
    pub lookup_misses: u64,
}

impl RunReport {
    /// Start a new, empty report.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
            attributes_selected: 0,
            attributes_failed: 0,
            rows_updated: 0,
            lookup_misses: 0,
        }
    }

    /// Append an informational message.
    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        self.entries.push(ReportEntry {
            level: ReportLevel::Info,
            message,
        });
    }

    /// Append a warning message.
    pub fn warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.entries.push(ReportEntry {
            level: ReportLevel::Warning,
            message,
        });
    }

    /// Append an error message.
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{message}");
        self.entries.push(ReportEntry {
            level: ReportLevel::Error,
            message,
        });
    }

    /// Mark the run as finished.
    pub fn finish(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Whether any error entry was recorded.
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.level == ReportLevel::Error)
    }

    /// Render the report as plain-text lines, one per entry.
    pub fn lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| format!("{}: {}", e.level, e.message))
            .collect()
    }

    /// Whether an entry at any level contains the given fragment.
    pub fn contains(&self, fragment: &str) -> bool {
        self.entries.iter().any(|e| e.message.contains(fragment))
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
