//! Structured activity log for the dashboard.
//!
//! Every notable outcome (backend failures, availability flips, saved costs,
//! sent reports) is appended as one JSON object per line to
//! `~/.ozon-dash/events.jsonl`. Writes are best-effort: a failing log never
//! interrupts the dashboard. Warnings and errors are echoed to stderr.
//!
//! `ozon-dash events` reads the file back for display.

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::schema::LoggingConfig;

// ---------------------------------------------------------------------------
// Event entry
// ---------------------------------------------------------------------------

/// Category of a logged event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Backend unreachable at the network level.
    ServiceUnavailable,
    /// Backend answered with a non-success status.
    ServerError,
    /// Any other failure (decode errors, storage errors).
    Error,
    /// Unexpected but recoverable data.
    Warning,
    /// The liveness probe observed a change in backend reachability.
    AvailabilityChanged,
    CostsSaved,
    ReportSent,
    Login,
    Logout,
}

impl EventKind {
    fn is_noisy(self) -> bool {
        matches!(
            self,
            Self::ServiceUnavailable | Self::ServerError | Self::Error | Self::Warning
        )
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ServiceUnavailable => "service_unavailable",
            Self::ServerError => "server_error",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::AvailabilityChanged => "availability_changed",
            Self::CostsSaved => "costs_saved",
            Self::ReportSent => "report_sent",
            Self::Login => "login",
            Self::Logout => "logout",
        };
        f.write_str(s)
    }
}

/// One line of the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: String,
    pub kind: EventKind,
    pub message: String,
    /// Backend path involved, if any.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub path: Option<String>,
    /// HTTP status for server errors.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<u16>,
}

// ---------------------------------------------------------------------------
// Log handle
// ---------------------------------------------------------------------------

/// Handle to the JSONL event log. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: Option<PathBuf>,
    echo: bool,
}

impl EventLog {
    /// Build a log from the `[logging]` config section.
    pub fn from_config(config: &LoggingConfig) -> Self {
        let path = if config.enabled {
            expand_home(&config.path)
        } else {
            None
        };
        Self { path, echo: true }
    }

    /// A log that writes nowhere and prints nothing. Used by tests.
    pub fn disabled() -> Self {
        Self {
            path: None,
            echo: false,
        }
    }

    /// Log file location, if logging is enabled.
    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    /// Record an event without backend details.
    pub fn record(&self, kind: EventKind, message: impl Into<String>) {
        self.record_full(kind, message, None, None);
    }

    /// Record an event tied to a backend path and optional status.
    pub fn record_full(
        &self,
        kind: EventKind,
        message: impl Into<String>,
        path: Option<&str>,
        status: Option<u16>,
    ) {
        let event = Event {
            timestamp: Utc::now().to_rfc3339(),
            kind,
            message: message.into(),
            path: path.map(str::to_string),
            status,
        };

        if self.echo && kind.is_noisy() {
            eprintln!("[ozon-dash] {}: {}", event.kind, event.message);
        }

        let _ = self.append(&event);
    }

    /// Read the last `limit` events, oldest first. Malformed lines are skipped.
    pub fn read_recent(&self, limit: usize) -> Vec<Event> {
        let Some(path) = &self.path else {
            return Vec::new();
        };
        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        let events: Vec<Event> = BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<Event>(&line).ok())
            .collect();

        let skip = events.len().saturating_sub(limit);
        events.into_iter().skip(skip).collect()
    }

    fn append(&self, event: &Event) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let json = serde_json::to_string(event)?;
        writeln!(file, "{json}")?;

        Ok(())
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> Option<PathBuf> {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir().map(|home| home.join(rest))
    } else if path.is_empty() {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
