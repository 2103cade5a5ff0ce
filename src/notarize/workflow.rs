//! Per-item workflow: submit, poll, inspect the log, staple

use crate::error::Error;
use crate::issues::{SuppressionRule, classify};
use crate::logs::LogSource;
use crate::notarize::coordinator::Gate;
use crate::notarize::poller::{PollIntervals, StatusPoller};
use crate::notarize::{StatusObserver, cancellable, submitter};
use crate::notary::NotaryService;
use crate::staple::Stapler;
use crate::types::{Classification, RequestRecord, WorkItem};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runs the full notarization pipeline for one item
///
/// Stages are strictly sequential. A failing stage ends the pipeline, except
/// that the log is downloaded whenever the service produced one so issues can
/// be reported for rejected packages too.
pub struct WorkflowRunner {
    notary: Arc<dyn NotaryService>,
    logs: Arc<dyn LogSource>,
    stapler: Arc<dyn Stapler>,
    suppression: Option<Arc<SuppressionRule>>,
    intervals: PollIntervals,
}

impl WorkflowRunner {
    /// Create a runner with default poll intervals and no suppression rule
    pub fn new(
        notary: Arc<dyn NotaryService>,
        logs: Arc<dyn LogSource>,
        stapler: Arc<dyn Stapler>,
    ) -> Self {
        Self {
            notary,
            logs,
            stapler,
            suppression: None,
            intervals: PollIntervals::default(),
        }
    }

    /// Suppress issues whose path matches `rule`
    #[must_use]
    pub fn with_suppression(mut self, rule: Option<SuppressionRule>) -> Self {
        self.suppression = rule.map(Arc::new);
        self
    }

    /// Override the poll intervals
    #[must_use]
    pub const fn with_intervals(mut self, intervals: PollIntervals) -> Self {
        self.intervals = intervals;
        self
    }

    /// Run the pipeline, recording the outcome in `item.state`
    ///
    /// `submission_gate` is held only while the submission call runs.
    pub async fn run(
        &self,
        item: &mut WorkItem,
        submission_gate: &Gate,
        observer: &dyn StatusObserver,
        cancel: &CancellationToken,
    ) {
        let Some(mut record) = self.submit(item, submission_gate, observer, cancel).await else {
            item.state.classification = Some(Classification::Failed);
            return;
        };

        let poller = StatusPoller::new(self.notary.as_ref(), observer, self.intervals, cancel);
        let polled = poller.poll(&mut record).await;
        let log_url = record.log_url.clone();
        item.state.request = Some(record);

        if let Err(e) = polled {
            warn!(file = %item.path().display(), error = %e, "notarization failed");
            observer.on_error(&e).await;
            item.state.errors.push(e);
            item.state.classification = Some(Classification::Failed);
            if let Some(url) = log_url {
                self.report_rejection_issues(&url, observer, cancel).await;
            }
            return;
        }

        let classification = match log_url {
            Some(url) => self.inspect_log(item, &url, observer, cancel).await,
            None => Classification::Success,
        };
        item.state.classification = Some(classification);
        if !classification.is_success() {
            return;
        }

        item.state.notarized = true;
        info!(file = %item.path().display(), ?classification, "file notarized");
        observer.notarized().await;

        if item.staple {
            self.staple(item, observer, cancel).await;
        }
    }

    async fn submit(
        &self,
        item: &mut WorkItem,
        gate: &Gate,
        observer: &dyn StatusObserver,
        cancel: &CancellationToken,
    ) -> Option<RequestRecord> {
        observer.submitting().await;

        let submitted = {
            match cancellable(cancel, async { Ok(gate.acquire().await) }).await {
                Ok(_guard) => {
                    submitter::submit(self.notary.as_ref(), item.path(), &item.bundle_id, cancel)
                        .await
                }
                Err(e) => Err(e),
            }
        };

        match submitted {
            Ok(request_id) => {
                observer.submitted(&request_id).await;
                Some(RequestRecord::new(request_id))
            }
            Err(e) => {
                observer.on_error(&e).await;
                item.state.errors.push(e);
                None
            }
        }
    }

    /// Download the log after a successful status and classify its issues
    async fn inspect_log(
        &self,
        item: &mut WorkItem,
        url: &str,
        observer: &dyn StatusObserver,
        cancel: &CancellationToken,
    ) -> Classification {
        debug!(file = %item.path().display(), url, "downloading notarization log");
        let log = match cancellable(cancel, self.logs.fetch(url)).await {
            Ok(log) => log,
            Err(Error::Cancelled) => {
                observer.on_error(&Error::Cancelled).await;
                item.state.errors.push(Error::Cancelled);
                return Classification::Failed;
            }
            Err(e) => {
                // Without the log nothing can be suppressed; the status stands.
                warn!(url, error = %e, "error downloading log file, this isn't a fatal error");
                observer.on_warning(&e).await;
                item.state.warnings.push(e);
                return Classification::Success;
            }
        };

        let outcome = classify(&log.issues, self.suppression.as_deref());
        if let Some(issues) = outcome.error() {
            warn!(file = %item.path().display(), count = issues.len(), "unsuppressed issues during notarization");
            observer.issues_found(&outcome.reported).await;
            let err = Error::UnsuppressedIssues(issues);
            observer.on_error(&err).await;
            item.state.errors.push(err);
            item.state.suppressed = outcome.suppressed;
            return Classification::Failed;
        }

        if outcome.suppressed.is_empty() {
            Classification::Success
        } else {
            debug!(count = outcome.suppressed.len(), "issues suppressed");
            item.state.suppressed = outcome.suppressed;
            Classification::SuccessWithSuppressedIssues
        }
    }

    /// Best-effort log download after a rejection, for diagnostics only
    async fn report_rejection_issues(
        &self,
        url: &str,
        observer: &dyn StatusObserver,
        cancel: &CancellationToken,
    ) {
        match cancellable(cancel, self.logs.fetch(url)).await {
            Ok(log) => {
                let outcome = classify(&log.issues, self.suppression.as_deref());
                if !outcome.reported.is_empty() {
                    observer.issues_found(&outcome.reported).await;
                }
            }
            Err(e) => debug!(url, error = %e, "could not download log of rejected request"),
        }
    }

    async fn staple(
        &self,
        item: &mut WorkItem,
        observer: &dyn StatusObserver,
        cancel: &CancellationToken,
    ) {
        observer.stapling().await;
        match cancellable(cancel, self.stapler.staple(item.path())).await {
            Ok(()) => {
                item.state.stapled = true;
                observer.stapled().await;
            }
            Err(e) => {
                observer.on_error(&e).await;
                item.state.errors.push(e);
            }
        }
    }
}
