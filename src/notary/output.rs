//! Decoding of the notarization tool's property-list output

use crate::error::{Error, ProductError, ProductErrors, Result};
use crate::types::{NotarizationStatus, StatusSnapshot};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::SystemTime;
use tracing::debug;

/// Captured result of one tool invocation
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Process exited successfully
    pub success: bool,
    /// Standard output, where the property list is written
    pub stdout: Vec<u8>,
    /// Standard output followed by standard error, for diagnostics
    pub combined: String,
}

#[derive(Deserialize)]
struct RawProductError {
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize, Default)]
struct SubmissionDocument {
    #[serde(rename = "notarization-upload")]
    upload: Option<UploadSection>,
    #[serde(rename = "product-errors", default)]
    errors: Vec<RawProductError>,
}

#[derive(Deserialize)]
struct UploadSection {
    #[serde(rename = "RequestUUID", default)]
    request_uuid: String,
}

#[derive(Deserialize, Default)]
struct StatusDocument {
    #[serde(rename = "notarization-info")]
    info: Option<InfoSection>,
    #[serde(rename = "product-errors", default)]
    errors: Vec<RawProductError>,
}

#[derive(Deserialize)]
struct InfoSection {
    #[serde(rename = "RequestUUID", default)]
    request_uuid: String,
    #[serde(rename = "Status", default)]
    status: String,
    #[serde(rename = "Status Message", default)]
    status_message: String,
    #[serde(rename = "LogFileURL")]
    log_file_url: Option<String>,
    #[serde(rename = "Hash")]
    hash: Option<String>,
    #[serde(rename = "Date")]
    date: Option<plist::Date>,
}

fn product_errors(raw: Vec<RawProductError>) -> ProductErrors {
    ProductErrors(
        raw.into_iter()
            .map(|e| ProductError {
                code: e.code,
                message: e.message,
            })
            .collect(),
    )
}

/// Decode stdout, treating empty output as an empty document
fn decode<T>(stdout: &[u8]) -> std::result::Result<T, plist::Error>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    plist::from_bytes(stdout)
}

/// Turn the output of a submission into a request id
///
/// Structured product errors win over the exit status, since the tool
/// reports them both with and without a failing exit code.
pub fn interpret_submission(output: &ToolOutput) -> Result<String> {
    let document: SubmissionDocument = match decode(&output.stdout) {
        Ok(document) => document,
        Err(e) => {
            debug!(error = %e, "failed to decode submission output");
            return Err(if output.success {
                Error::SubmissionProtocol
            } else {
                Error::SubmissionTransport(output.combined.clone())
            });
        }
    };

    if !document.errors.is_empty() {
        return Err(Error::SubmissionRejected(product_errors(document.errors)));
    }

    if !output.success {
        return Err(Error::SubmissionTransport(output.combined.clone()));
    }

    document
        .upload
        .map(|u| u.request_uuid)
        .filter(|id| !id.is_empty())
        .ok_or(Error::SubmissionProtocol)
}

/// Turn the output of a status query into a snapshot
pub fn interpret_status(output: &ToolOutput) -> Result<StatusSnapshot> {
    let document: StatusDocument = decode(&output.stdout).map_err(|e| {
        Error::StatusTransport(format!("failed to decode notarization info output: {e}"))
    })?;

    if !document.errors.is_empty() {
        return Err(Error::StatusRejected(product_errors(document.errors)));
    }

    if !output.success {
        return Err(Error::StatusTransport(output.combined.clone()));
    }

    let info = document.info.ok_or_else(|| {
        Error::StatusTransport("tool output contained no notarization info".to_string())
    })?;

    Ok(StatusSnapshot {
        request_id: info.request_uuid,
        status: NotarizationStatus::from_tool(&info.status),
        message: info.status_message,
        log_url: info.log_file_url.filter(|url| !url.is_empty()),
        hash: info.hash,
        date: info
            .date
            .map(|d| DateTime::<Utc>::from(SystemTime::from(d))),
    })
}
