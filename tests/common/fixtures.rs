//! Test doubles for logs, stapling and progress events

#![allow(dead_code)]

use async_trait::async_trait;
use notarun::error::{Error, Result};
use notarun::logs::{LogSource, NotaryLog};
use notarun::notarize::{PollIntervals, StatusObserver};
use notarun::staple::Stapler;
use notarun::types::{Issue, NotarizationStatus, StatusSnapshot};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Default intervals, spelled out so timing assertions read clearly
pub const SLOW: Duration = Duration::from_secs(10);
pub const FAST: Duration = Duration::from_secs(5);

pub fn intervals() -> PollIntervals {
    PollIntervals {
        slow: SLOW,
        fast: FAST,
    }
}

pub fn issue(severity: &str, path: &str, message: &str) -> Issue {
    Issue {
        severity: severity.to_string(),
        path: path.to_string(),
        message: message.to_string(),
    }
}

/// A progress event as seen by an observer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Submitting,
    Submitted(String),
    StatusChanged(NotarizationStatus),
    IssuesFound(usize),
    Notarized,
    Stapling,
    Stapled,
    Warning(String),
    Error(String),
}

/// Observer that records every event in order
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl StatusObserver for RecordingObserver {
    async fn submitting(&self) {
        self.push(Event::Submitting);
    }

    async fn submitted(&self, request_id: &str) {
        self.push(Event::Submitted(request_id.to_string()));
    }

    async fn status_changed(&self, snapshot: &StatusSnapshot) {
        self.push(Event::StatusChanged(snapshot.status));
    }

    async fn issues_found(&self, issues: &[Issue]) {
        self.push(Event::IssuesFound(issues.len()));
    }

    async fn notarized(&self) {
        self.push(Event::Notarized);
    }

    async fn stapling(&self) {
        self.push(Event::Stapling);
    }

    async fn stapled(&self) {
        self.push(Event::Stapled);
    }

    async fn on_warning(&self, warning: &Error) {
        self.push(Event::Warning(warning.to_string()));
    }

    async fn on_error(&self, error: &Error) {
        self.push(Event::Error(error.to_string()));
    }
}

/// Log source serving canned documents by URL
///
/// Unknown URLs fail like an unreachable server.
#[derive(Default)]
pub struct MockLogs {
    logs: HashMap<String, NotaryLog>,
    fetched: Mutex<Vec<String>>,
}

impl MockLogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_issues(mut self, url: &str, issues: Vec<Issue>) -> Self {
        self.logs.insert(
            url.to_string(),
            NotaryLog {
                issues,
                ..NotaryLog::default()
            },
        );
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogSource for MockLogs {
    async fn fetch(&self, url: &str) -> Result<NotaryLog> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.logs
            .get(url)
            .cloned()
            .ok_or_else(|| Error::LogFetch(format!("server responded with 503 for {url}")))
    }
}

/// Stapler that records files and optionally fails
#[derive(Default)]
pub struct MockStapler {
    fail: bool,
    stapled: Mutex<Vec<PathBuf>>,
}

impl MockStapler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn stapled(&self) -> Vec<PathBuf> {
        self.stapled.lock().unwrap().clone()
    }
}

#[async_trait]
impl Stapler for MockStapler {
    async fn staple(&self, file: &Path) -> Result<()> {
        if self.fail {
            return Err(Error::Staple(format!(
                "could not validate ticket for {}",
                file.display()
            )));
        }
        self.stapled.lock().unwrap().push(file.to_path_buf());
        Ok(())
    }
}
