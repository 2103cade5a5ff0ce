//! Status polling state machine
//!
//! A fresh submission sits in a queue until the service indexes it, which
//! can take hours; until then queries fail with "request not found". Polling
//! starts at the slow interval and switches to the fast one after the first
//! successful query, since analysis usually finishes within minutes.

use crate::error::{Error, Result};
use crate::notarize::StatusObserver;
use crate::notarize::cancellable;
use crate::notary::{CODE_NETWORK_UNAVAILABLE, CODE_REQUEST_NOT_FOUND, NotaryService};
use crate::types::{NotarizationStatus, RequestRecord};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Delays between status queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    /// Used until the first successful query
    pub slow: Duration,
    /// Used once the service has acknowledged the request
    pub fast: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            slow: Duration::from_secs(10),
            fast: Duration::from_secs(5),
        }
    }
}

/// Polling state of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// The service has not indexed the request yet
    AwaitingAcknowledgement,
    /// Analysis is running
    InProgress,
    /// Terminal: approved
    Success,
    /// Terminal: rejected
    Invalid,
}

impl PollState {
    /// Whether polling stops in this state
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Invalid)
    }
}

impl From<NotarizationStatus> for PollState {
    fn from(status: NotarizationStatus) -> Self {
        match status {
            NotarizationStatus::Success => Self::Success,
            NotarizationStatus::Invalid => Self::Invalid,
            NotarizationStatus::InProgress | NotarizationStatus::Unknown => Self::InProgress,
        }
    }
}

/// How a failed status query affects polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryDisposition {
    /// Request not indexed yet; keep polling
    NotYetIndexed,
    /// Tool lost the network; keep polling
    NetworkUnavailable,
    /// Stop polling and surface the error
    Fatal,
}

/// Classify a status query error by its structured code
///
/// "Request not found" is only expected before the service acknowledges the
/// request. Once a query has succeeded it is fatal like any other code.
pub fn classify_query_error(error: &Error, state: PollState) -> QueryDisposition {
    match error {
        Error::StatusRejected(errors)
            if state == PollState::AwaitingAcknowledgement
                && errors.contains_code(CODE_REQUEST_NOT_FOUND) =>
        {
            QueryDisposition::NotYetIndexed
        }
        Error::StatusRejected(errors) if errors.contains_code(CODE_NETWORK_UNAVAILABLE) => {
            QueryDisposition::NetworkUnavailable
        }
        _ => QueryDisposition::Fatal,
    }
}

/// Polls one request until it reaches a terminal status
pub struct StatusPoller<'a> {
    service: &'a dyn NotaryService,
    observer: &'a dyn StatusObserver,
    intervals: PollIntervals,
    cancel: &'a CancellationToken,
}

impl<'a> StatusPoller<'a> {
    /// Create a poller
    pub const fn new(
        service: &'a dyn NotaryService,
        observer: &'a dyn StatusObserver,
        intervals: PollIntervals,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            service,
            observer,
            intervals,
            cancel,
        }
    }

    /// Poll until `success` or `invalid`, updating `record` after every
    /// successful query
    ///
    /// Returns `Error::Invalid` for a rejected package; `record` then still
    /// holds the final status and log URL.
    pub async fn poll(&self, record: &mut RequestRecord) -> Result<PollState> {
        let mut state = PollState::AwaitingAcknowledgement;
        let mut interval = self.intervals.slow;
        let mut last_status: Option<NotarizationStatus> = None;

        while !state.is_terminal() {
            cancellable(self.cancel, async {
                tokio::time::sleep(interval).await;
                Ok(())
            })
            .await?;

            let snapshot = match cancellable(self.cancel, self.service.status(&record.request_id))
                .await
            {
                Ok(snapshot) => snapshot,
                Err(e) => match classify_query_error(&e, state) {
                    QueryDisposition::NotYetIndexed => {
                        debug!(request_id = %record.request_id, "request not indexed yet, waiting");
                        continue;
                    }
                    QueryDisposition::NetworkUnavailable => {
                        warn!(request_id = %record.request_id, "network became unavailable, will retry");
                        continue;
                    }
                    QueryDisposition::Fatal => return Err(e),
                },
            };

            record.apply(&snapshot);
            interval = self.intervals.fast;
            state = snapshot.status.into();

            if last_status != Some(snapshot.status) {
                last_status = Some(snapshot.status);
                info!(request_id = %record.request_id, status = %snapshot.status, "notarization status changed");
                self.observer.status_changed(&snapshot).await;
            }
        }

        if state == PollState::Invalid {
            return Err(Error::Invalid {
                request_id: record.request_id.clone(),
                log_url: record.log_url.clone().unwrap_or_default(),
            });
        }
        Ok(state)
    }
}
