//! Error types for notarun

use crate::issues::IssueErrors;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A structured error reported by the notarization tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductError {
    /// Numeric error code (e.g. `1519`, `-18000`)
    pub code: i64,
    /// Human-readable message
    pub message: String,
}

impl fmt::Display for ProductError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.message)
    }
}

/// List of structured errors from a single tool invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductErrors(pub Vec<ProductError>);

impl ProductErrors {
    /// Whether any error carries the given code
    pub fn contains_code(&self, code: i64) -> bool {
        self.0.iter().any(|e| e.code == code)
    }

    /// Number of errors
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the errors in reported order
    pub fn iter(&self) -> std::slice::Iter<'_, ProductError> {
        self.0.iter()
    }
}

impl fmt::Display for ProductErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [single] = self.0.as_slice() {
            return write!(f, "{single}");
        }
        writeln!(f, "{} errors occurred:", self.0.len())?;
        for err in &self.0 {
            writeln!(f, "  * {err}")?;
        }
        Ok(())
    }
}

/// Errors collected from every failed item of a run
#[derive(Debug, Default)]
pub struct ItemFailures(pub Vec<(PathBuf, Vec<Error>)>);

impl fmt::Display for ItemFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of the items failed:", self.0.len())?;
        for (path, errors) in &self.0 {
            write!(f, "\n  {}:", path.display())?;
            for err in errors {
                write!(f, "\n    * {err}")?;
            }
        }
        Ok(())
    }
}

/// Error type for notarun operations
#[derive(Error, Debug)]
pub enum Error {
    /// The service rejected the submission with structured errors
    #[error("notarization submission rejected: {0}")]
    SubmissionRejected(ProductErrors),

    /// The submission tool failed without structured detail
    #[error("error submitting for notarization:\n\n{0}")]
    SubmissionTransport(String),

    /// The submission appeared to succeed but returned no request id
    #[error(
        "notarization appeared to succeed, but no request id could be parsed from the tool output"
    )]
    SubmissionProtocol,

    /// A status query returned structured errors
    #[error("notarization status query failed: {0}")]
    StatusRejected(ProductErrors),

    /// A status query failed without structured detail
    #[error("error checking on notarization status:\n\n{0}")]
    StatusTransport(String),

    /// The service reported the package as invalid
    #[error("package is invalid. To learn more download the logs at the URL: {log_url}")]
    Invalid {
        /// Request the verdict belongs to
        request_id: String,
        /// Log URL for diagnosis (empty if the service gave none)
        log_url: String,
    },

    /// Downloading or decoding the notarization log failed
    #[error("error downloading notarization log: {0}")]
    LogFetch(String),

    /// The log reported issues not covered by the suppression rule
    #[error(transparent)]
    UnsuppressedIssues(IssueErrors),

    /// Stapling the ticket failed
    #[error("stapling failed: {0}")]
    Staple(String),

    /// The run was canceled
    #[error("canceled")]
    Cancelled,

    /// One or more items of a run failed
    #[error("{0}")]
    ItemsFailed(ItemFailures),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error came from the cancellation signal
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type alias for notarun operations
pub type Result<T> = std::result::Result<T, Error>;
