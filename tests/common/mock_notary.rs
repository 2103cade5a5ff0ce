//! Scripted notarization service

#![allow(dead_code)]

use async_trait::async_trait;
use notarun::error::{Error, ProductError, ProductErrors, Result};
use notarun::notary::{CODE_NETWORK_UNAVAILABLE, CODE_REQUEST_NOT_FOUND, NotaryService};
use notarun::types::{NotarizationStatus, StatusSnapshot};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Scripted result of a submission
#[derive(Debug, Clone)]
pub enum SubmitStep {
    /// Accept with this request id
    Accept(String),
    /// Reject with a product error code
    Reject(i64),
}

/// Scripted result of one status query
#[derive(Debug, Clone)]
pub enum InfoStep {
    /// Error 1519
    NotFound,
    /// Error -19000
    NetworkDown,
    /// Any other product error code
    Fatal(i64),
    /// Successful query
    Status(NotarizationStatus, Option<String>),
}

impl InfoStep {
    pub fn in_progress() -> Self {
        Self::Status(NotarizationStatus::InProgress, None)
    }

    pub fn success(log_url: Option<&str>) -> Self {
        Self::Status(NotarizationStatus::Success, log_url.map(ToString::to_string))
    }

    pub fn invalid(log_url: Option<&str>) -> Self {
        Self::Status(NotarizationStatus::Invalid, log_url.map(ToString::to_string))
    }
}

fn product_error(code: i64) -> ProductErrors {
    ProductErrors(vec![ProductError {
        code,
        message: format!("scripted error {code}"),
    }])
}

struct Script {
    submit: SubmitStep,
    info: VecDeque<InfoStep>,
}

/// Mock service driven by per-file scripts
///
/// Status queries beyond the end of a script repeat its last step.
pub struct MockNotary {
    scripts: Mutex<HashMap<PathBuf, Script>>,
    request_files: Mutex<HashMap<String, PathBuf>>,
    submit_delay: Duration,
    submits_in_flight: AtomicUsize,
    max_submits_in_flight: AtomicUsize,
    /// (request id, time) of every status query
    queries: Mutex<Vec<(String, Instant)>>,
    /// (file, start, end) of every submission
    submissions: Mutex<Vec<(PathBuf, Instant, Instant)>>,
}

impl MockNotary {
    pub fn new() -> Self {
        Self::with_submit_delay(Duration::ZERO)
    }

    /// Each submission takes `delay` to complete
    pub fn with_submit_delay(delay: Duration) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            request_files: Mutex::new(HashMap::new()),
            submit_delay: delay,
            submits_in_flight: AtomicUsize::new(0),
            max_submits_in_flight: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
        }
    }

    /// Script the behavior for one file
    pub fn script(self, file: &str, submit: SubmitStep, info: Vec<InfoStep>) -> Self {
        self.scripts.lock().unwrap().insert(
            PathBuf::from(file),
            Script {
                submit,
                info: info.into(),
            },
        );
        self
    }

    pub fn max_concurrent_submissions(&self) -> usize {
        self.max_submits_in_flight.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<(PathBuf, Instant, Instant)> {
        self.submissions.lock().unwrap().clone()
    }

    /// Times of the status queries for one request
    pub fn query_times(&self, request_id: &str) -> Vec<Instant> {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == request_id)
            .map(|(_, t)| *t)
            .collect()
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl NotaryService for MockNotary {
    async fn submit(&self, file: &Path, _bundle_id: &str) -> Result<String> {
        let start = Instant::now();
        let in_flight = self.submits_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_submits_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);

        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }

        self.submits_in_flight.fetch_sub(1, Ordering::SeqCst);
        self.submissions
            .lock()
            .unwrap()
            .push((file.to_path_buf(), start, Instant::now()));

        let step = self
            .scripts
            .lock()
            .unwrap()
            .get(file)
            .map(|s| s.submit.clone())
            .unwrap_or_else(|| panic!("no script for {}", file.display()));

        match step {
            SubmitStep::Accept(id) => {
                self.request_files
                    .lock()
                    .unwrap()
                    .insert(id.clone(), file.to_path_buf());
                Ok(id)
            }
            SubmitStep::Reject(code) => Err(Error::SubmissionRejected(product_error(code))),
        }
    }

    async fn status(&self, request_id: &str) -> Result<StatusSnapshot> {
        self.queries
            .lock()
            .unwrap()
            .push((request_id.to_string(), Instant::now()));

        let file = self
            .request_files
            .lock()
            .unwrap()
            .get(request_id)
            .cloned()
            .unwrap_or_else(|| panic!("unknown request {request_id}"));

        let step = {
            let mut scripts = self.scripts.lock().unwrap();
            let script = scripts.get_mut(&file).unwrap();
            if script.info.len() > 1 {
                script.info.pop_front().unwrap()
            } else {
                script.info.front().cloned().expect("empty info script")
            }
        };

        match step {
            InfoStep::NotFound => Err(Error::StatusRejected(product_error(
                CODE_REQUEST_NOT_FOUND,
            ))),
            InfoStep::NetworkDown => Err(Error::StatusRejected(product_error(
                CODE_NETWORK_UNAVAILABLE,
            ))),
            InfoStep::Fatal(code) => Err(Error::StatusRejected(product_error(code))),
            InfoStep::Status(status, log_url) => Ok(StatusSnapshot {
                request_id: request_id.to_string(),
                status,
                message: format!("{status}"),
                log_url,
                hash: None,
                date: None,
            }),
        }
    }
}
