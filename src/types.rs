//! Core types for notarun

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Status reported by the notarization service for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotarizationStatus {
    /// Status not recognized (or not reported yet)
    Unknown,
    /// Analysis still running
    InProgress,
    /// Package approved
    Success,
    /// Package rejected
    Invalid,
}

impl NotarizationStatus {
    /// Parse the status string emitted by the tool
    pub fn from_tool(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "in progress" | "in-progress" => Self::InProgress,
            "success" => Self::Success,
            "invalid" => Self::Invalid,
            _ => Self::Unknown,
        }
    }

    /// Whether no further transition can occur
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Invalid)
    }
}

impl fmt::Display for NotarizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::InProgress => write!(f, "in progress"),
            Self::Success => write!(f, "success"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// Result of one successful status query
///
/// A new snapshot replaces the prior one; fields are never merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Request this snapshot describes
    pub request_id: String,
    /// Reported status
    pub status: NotarizationStatus,
    /// Human-friendly message associated with the status
    pub message: String,
    /// Log document URL, once the service has produced one
    pub log_url: Option<String>,
    /// Hash of the submitted file as reported by the service
    pub hash: Option<String>,
    /// Submission date as reported by the service
    pub date: Option<DateTime<Utc>>,
}

/// Client-side record of a submitted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    /// Opaque request identifier returned by submission
    pub request_id: String,
    /// When the submission completed
    pub submitted_at: DateTime<Utc>,
    /// Last status observed by a successful query
    pub last_status: NotarizationStatus,
    /// Last status message observed
    pub last_message: String,
    /// Log URL, once known
    pub log_url: Option<String>,
}

impl RequestRecord {
    /// Create a record for a freshly submitted request
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            submitted_at: Utc::now(),
            last_status: NotarizationStatus::Unknown,
            last_message: String::new(),
            log_url: None,
        }
    }

    /// Replace the status fields with those of a new snapshot
    pub fn apply(&mut self, snapshot: &StatusSnapshot) {
        self.last_status = snapshot.status;
        self.last_message.clone_from(&snapshot.message);
        self.log_url.clone_from(&snapshot.log_url);
    }
}

/// A single problem reported in the notarization log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Severity, usually "error" or "warning"
    pub severity: String,
    /// Path within the submitted artifact
    pub path: String,
    /// Description of the problem
    pub message: String,
}

/// Terminal classification of a work item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Approved with no issues
    Success,
    /// Approved; every reported issue matched the suppression rule
    SuccessWithSuppressedIssues,
    /// Not notarized
    Failed,
}

impl Classification {
    /// Whether the item counts as notarized
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success | Self::SuccessWithSuppressedIssues)
    }
}

/// Mutable state of a work item, written only by its own workflow
#[derive(Debug, Default)]
pub struct ItemState {
    /// Set exactly once when the workflow finishes notarization
    pub classification: Option<Classification>,
    /// Notarization succeeded
    pub notarized: bool,
    /// Stapling succeeded
    pub stapled: bool,
    /// Present iff submission succeeded
    pub request: Option<RequestRecord>,
    /// Issues hidden by the suppression rule
    pub suppressed: Vec<Issue>,
    /// Fatal errors, in the order they occurred
    pub errors: Vec<Error>,
    /// Non-fatal problems (e.g. the log could not be downloaded)
    pub warnings: Vec<Error>,
}

/// An artifact to notarize
#[derive(Debug)]
pub struct WorkItem {
    path: PathBuf,
    /// Resolved bundle identifier
    pub bundle_id: String,
    /// Staple the ticket after successful notarization
    pub staple: bool,
    /// Progress and outcome of this item
    pub state: ItemState,
}

impl WorkItem {
    /// Create a work item with a resolved bundle id
    pub fn new(path: impl Into<PathBuf>, bundle_id: impl Into<String>, staple: bool) -> Self {
        Self {
            path: path.into(),
            bundle_id: bundle_id.into(),
            staple,
            state: ItemState::default(),
        }
    }

    /// Path of the artifact
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the item failed notarization or stapling
    pub fn failed(&self) -> bool {
        !self.state.errors.is_empty()
            || !self
                .state
                .classification
                .is_some_and(Classification::is_success)
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())?;
        match (self.state.notarized, self.state.stapled) {
            (true, true) => write!(f, " (notarized and stapled)"),
            (true, false) => write!(f, " (notarized)"),
            _ => Ok(()),
        }
    }
}
