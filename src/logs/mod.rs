//! Notarization log documents
//!
//! Once a request reaches a terminal state the service publishes a JSON log
//! with the issues it found. This module decodes that document and
//! downloads it over HTTP.

mod fetch;

pub use fetch::{LogFetcher, RetryPolicy};

use crate::error::{Error, Result};
use crate::types::Issue;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

/// Severity used by the service for blocking issues
pub const SEVERITY_ERROR: &str = "error";

/// Severity used by the service for warnings
pub const SEVERITY_WARNING: &str = "warning";

/// Notarization log document
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotaryLog {
    /// Request id
    pub job_id: String,
    /// Final status ("Accepted", "Invalid", ...)
    pub status: String,
    /// Summary of the status
    pub status_summary: String,
    /// Numeric status
    pub status_code: i64,
    /// File name of the submitted archive
    pub archive_filename: String,
    /// Upload timestamp, as sent by the service
    pub upload_date: String,
    /// SHA-256 of the submitted archive
    pub sha256: String,
    /// Issues in reported order
    #[serde(deserialize_with = "null_as_empty")]
    pub issues: Vec<Issue>,
    /// Signed code found in the archive
    #[serde(deserialize_with = "null_as_empty")]
    pub ticket_contents: Vec<TicketContent>,
}

/// An entry of the archive covered by the ticket
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TicketContent {
    /// Path within the archive
    pub path: String,
    /// Digest algorithm of the code directory hash
    pub digest_algorithm: String,
    /// Code directory hash
    pub cdhash: String,
    /// Architecture
    pub arch: String,
}

/// The service writes `null` instead of `[]` for empty lists
fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Decode a log document
pub fn parse_log(body: &[u8]) -> Result<NotaryLog> {
    serde_json::from_slice(body).map_err(|e| Error::LogFetch(format!("invalid log document: {e}")))
}

/// Source of notarization logs
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Download and decode the log at `url`
    async fn fetch(&self, url: &str) -> Result<NotaryLog>;
}
