//! Structured logging contract for ferrio conformance workflows.
//!
//! Provides:
//! - [`LogEntry`]: canonical JSONL log record with required + optional fields.
//! - [`LogEmitter`]: writes JSONL lines to a file or stdout.
//! - [`validate_log_line`]: validates a single JSONL line against the schema.

use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::HarnessError;

/// Severity level for log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Scenario outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    Error,
}

/// Canonical structured log entry.
///
/// Required fields: `timestamp`, `campaign`, `level`, `event`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    // Required
    pub timestamp: u64,
    pub campaign: String,
    pub level: LogLevel,
    pub event: String,

    // Optional
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iostat: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl LogEntry {
    /// Create a new log entry with required fields only.
    #[must_use]
    pub fn new(campaign: impl Into<String>, level: LogLevel, event: impl Into<String>) -> Self {
        Self {
            timestamp: now_unix(),
            campaign: campaign.into(),
            level,
            event: event.into(),
            scenario: None,
            contract: None,
            outcome: None,
            iostat: None,
            detail: None,
            duration_ms: None,
        }
    }

    #[must_use]
    pub fn scenario(mut self, name: impl Into<String>, section: impl Into<String>) -> Self {
        self.scenario = Some(name.into());
        self.contract = Some(section.into());
        self
    }

    #[must_use]
    pub fn outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    #[must_use]
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Validate one JSONL line against the [`LogEntry`] schema.
pub fn validate_log_line(line: &str) -> Result<LogEntry, HarnessError> {
    let entry: LogEntry = serde_json::from_str(line)?;
    if entry.campaign.is_empty() {
        return Err(HarnessError::Schema("empty campaign".into()));
    }
    if entry.event.is_empty() {
        return Err(HarnessError::Schema("empty event".into()));
    }
    Ok(entry)
}

/// JSONL sink: a file or stdout.
pub enum LogEmitter {
    Stdout,
    File(std::fs::File),
}

impl LogEmitter {
    pub fn file(path: &Path) -> Result<Self, HarnessError> {
        Ok(LogEmitter::File(std::fs::File::create(path)?))
    }

    pub fn emit(&mut self, entry: &LogEntry) -> Result<(), HarnessError> {
        let line = serde_json::to_string(entry)?;
        match self {
            LogEmitter::Stdout => {
                println!("{line}");
                Ok(())
            }
            LogEmitter::File(f) => {
                writeln!(f, "{line}")?;
                Ok(())
            }
        }
    }
}
