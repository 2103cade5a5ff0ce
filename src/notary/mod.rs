//! Boundary to the notarization service
//!
//! The service is reached through an external tool (`xcrun altool`). This
//! module owns invoking it and decoding its property-list output into typed
//! results, with numeric error codes preserved for classification.

mod output;
mod xcrun;

pub use output::{ToolOutput, interpret_status, interpret_submission};
pub use xcrun::XcrunNotary;

use crate::error::Result;
use crate::types::StatusSnapshot;
use async_trait::async_trait;
use std::fmt;
use std::path::Path;

/// Status query error code: the service has not indexed the request yet
pub const CODE_REQUEST_NOT_FOUND: i64 = 1519;

/// Status query error code: the tool lost network connectivity
pub const CODE_NETWORK_UNAVAILABLE: i64 = -19000;

/// Account credentials passed to the notarization tool
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Apple ID, typically an email address
    pub username: String,
    /// Password; `@keychain:<name>` and `@env:<name>` are resolved by the tool
    pub password: String,
    /// Provider short name, for accounts in several teams
    pub provider: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("provider", &self.provider)
            .finish()
    }
}

/// Notarization service operations
///
/// Implementations perform exactly one remote call per method invocation;
/// retry policy belongs to the caller.
#[async_trait]
pub trait NotaryService: Send + Sync {
    /// Submit a file, returning the request id
    async fn submit(&self, file: &Path, bundle_id: &str) -> Result<String>;

    /// Query the current status of a request
    async fn status(&self, request_id: &str) -> Result<StatusSnapshot>;
}
