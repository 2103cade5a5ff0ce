//! Concurrent notarization of many items
//!
//! Every item runs on its own task. Submissions are serialized through the
//! submission gate because the service rejects concurrent uploads for one
//! account; polling, the long part, runs fully in parallel.

use crate::error::{Error, ItemFailures, Result};
use crate::notarize::StatusObserver;
use crate::notarize::workflow::WorkflowRunner;
use crate::types::{Classification, WorkItem};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// A shared mutual-exclusion resource
///
/// Clones share the same lock. Acquisition is first come, first served.
#[derive(Debug, Clone, Default)]
pub struct Gate {
    inner: Arc<Mutex<()>>,
}

impl Gate {
    /// Create an unlocked gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access; released when the guard drops
    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.inner.lock().await
    }
}

/// Outcome of a run: every item, in input order
#[derive(Debug, Default)]
pub struct RunReport {
    /// Finished items
    pub items: Vec<WorkItem>,
}

impl RunReport {
    /// Number of items that were notarized and, if requested, stapled
    pub fn success_count(&self) -> usize {
        self.items.iter().filter(|i| !i.failed()).count()
    }

    /// Whether every item succeeded
    pub fn is_success(&self) -> bool {
        self.items.iter().all(|i| !i.failed())
    }

    /// Items that failed
    pub fn failed(&self) -> impl Iterator<Item = &WorkItem> {
        self.items.iter().filter(|i| i.failed())
    }

    /// Convert into the items, or a combined error naming every failed item
    pub fn into_result(self) -> Result<Vec<WorkItem>> {
        if self.is_success() {
            return Ok(self.items);
        }
        let failures = self
            .items
            .into_iter()
            .filter(WorkItem::failed)
            .map(|item| {
                let path = item.path().to_path_buf();
                (path, item.state.errors)
            })
            .collect();
        Err(Error::ItemsFailed(ItemFailures(failures)))
    }
}

/// Runs one workflow per item and aggregates the results
pub struct Coordinator {
    runner: Arc<WorkflowRunner>,
    submission_gate: Gate,
    output_gate: Gate,
}

impl Coordinator {
    /// Create a coordinator with its shared gates
    pub fn new(runner: WorkflowRunner, submission_gate: Gate, output_gate: Gate) -> Self {
        Self {
            runner: Arc::new(runner),
            submission_gate,
            output_gate,
        }
    }

    /// Notarize all items concurrently and wait for every one of them
    ///
    /// `make_observer` builds the observer of each item from its index, the
    /// item and the output gate. A failing item never stops the others.
    pub async fn run<F>(
        &self,
        items: Vec<WorkItem>,
        make_observer: F,
        cancel: &CancellationToken,
    ) -> RunReport
    where
        F: Fn(usize, &WorkItem, Gate) -> Arc<dyn StatusObserver>,
    {
        let total = items.len();
        info!(items = total, "starting notarization");

        let mut tasks = JoinSet::new();
        let mut paths = Vec::with_capacity(total);
        for (idx, mut item) in items.into_iter().enumerate() {
            paths.push((item.path().to_path_buf(), item.bundle_id.clone(), item.staple));
            let observer = make_observer(idx, &item, self.output_gate.clone());
            let runner = Arc::clone(&self.runner);
            let gate = self.submission_gate.clone();
            let cancel = cancel.clone();

            tasks.spawn(async move {
                runner
                    .run(&mut item, &gate, observer.as_ref(), &cancel)
                    .await;
                (idx, item)
            });
        }

        let mut slots: Vec<Option<WorkItem>> = (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, item)) => slots[idx] = Some(item),
                Err(e) => error!(error = %e, "notarization task failed"),
            }
        }

        let items = slots
            .into_iter()
            .zip(paths)
            .map(|(slot, (path, bundle_id, staple))| {
                slot.unwrap_or_else(|| {
                    let mut item = WorkItem::new(path, bundle_id, staple);
                    item.state.classification = Some(Classification::Failed);
                    item.state.errors.push(Error::Io(std::io::Error::other(
                        "notarization task panicked",
                    )));
                    item
                })
            })
            .collect();

        let report = RunReport { items };
        info!(
            items = total,
            succeeded = report.success_count(),
            "notarization finished"
        );
        report
    }
}
