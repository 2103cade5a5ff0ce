//! Status observer trait for interface-agnostic progress updates
//!
//! Observers run inline on the item's own task, so implementations must not
//! block for long.

use crate::error::Error;
use crate::types::{Issue, StatusSnapshot};
use async_trait::async_trait;

/// Receives progress events for one work item
///
/// The first three events are always emitted by a workflow; the rest have
/// no-op defaults.
#[async_trait]
pub trait StatusObserver: Send + Sync {
    /// The file is about to be submitted
    async fn submitting(&self);

    /// The service accepted the submission
    async fn submitted(&self, request_id: &str);

    /// The reported status differs from the previously observed one
    async fn status_changed(&self, snapshot: &StatusSnapshot);

    /// The log listed issues not covered by the suppression rule
    async fn issues_found(&self, _issues: &[Issue]) {}

    /// Notarization succeeded
    async fn notarized(&self) {}

    /// Stapling is starting
    async fn stapling(&self) {}

    /// Stapling succeeded
    async fn stapled(&self) {}

    /// A non-fatal problem occurred
    async fn on_warning(&self, _warning: &Error) {}

    /// A stage failed
    async fn on_error(&self, _error: &Error) {}
}

/// No-op observer for callers uninterested in progress
pub struct NoopObserver;

#[async_trait]
impl StatusObserver for NoopObserver {
    async fn submitting(&self) {}
    async fn submitted(&self, _request_id: &str) {}
    async fn status_changed(&self, _snapshot: &StatusSnapshot) {}
}
