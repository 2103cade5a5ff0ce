//! Notarization orchestration
//!
//! 1. Submission - upload one artifact under the submission gate
//! 2. Polling - wait for the service to reach a terminal status
//! 3. Inspection - download the log and classify its issues
//! 4. Stapling - attach the ticket, if requested
//!
//! The [`Coordinator`] runs these workflows for many items at once.

mod coordinator;
mod poller;
mod progress;
mod submitter;
mod workflow;

pub use coordinator::{Coordinator, Gate, RunReport};
pub use poller::{PollIntervals, PollState, QueryDisposition, StatusPoller, classify_query_error};
pub use progress::{NoopObserver, StatusObserver};
pub use submitter::submit;
pub use workflow::WorkflowRunner;

use crate::error::{Error, Result};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Race `fut` against the cancellation token
///
/// The losing future is dropped, which kills child processes and aborts
/// in-flight requests.
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}
