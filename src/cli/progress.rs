//! CLI status observer

use crate::cli::style::{Stylize, check, cross};
use anstream::{eprintln, println};
use async_trait::async_trait;
use notarun::error::Error;
use notarun::logs::SEVERITY_ERROR;
use notarun::notarize::{Gate, StatusObserver};
use notarun::types::{Issue, StatusSnapshot, WorkItem};

/// Prints progress of one item, holding the output gate for every write
pub struct CliProgress {
    prefix: String,
    output: Gate,
}

impl CliProgress {
    /// Create progress output for one item
    pub const fn new(prefix: String, output: Gate) -> Self {
        Self { prefix, output }
    }
}

#[async_trait]
impl StatusObserver for CliProgress {
    async fn submitting(&self) {
        let _out = self.output.acquire().await;
        println!("    {}Submitting file for notarization...", self.prefix);
    }

    async fn submitted(&self, request_id: &str) {
        let _out = self.output.acquire().await;
        println!(
            "    {}Submitted. Request UUID: {}",
            self.prefix,
            request_id.accent()
        );
        println!(
            "    {}{}",
            self.prefix,
            "Waiting for results from Apple. This can take minutes to hours.".muted()
        );
    }

    async fn status_changed(&self, snapshot: &StatusSnapshot) {
        let _out = self.output.acquire().await;
        println!("    {}Status: {}", self.prefix, snapshot.status);
    }

    async fn issues_found(&self, issues: &[Issue]) {
        let _out = self.output.acquire().await;
        println!(
            "    {}{}",
            self.prefix,
            format!("{} issues during notarization:", issues.len()).failure()
        );
        for (idx, issue) in issues.iter().enumerate() {
            println!("    {}  {}", self.prefix, issue_line(idx, issue));
        }
    }

    async fn notarized(&self) {
        let _out = self.output.acquire().await;
        println!("    {}{} File notarized!", self.prefix, check());
    }

    async fn stapling(&self) {
        let _out = self.output.acquire().await;
        println!("    {}{}", self.prefix, "Stapling...".emphasis());
    }

    async fn stapled(&self) {
        let _out = self.output.acquire().await;
        println!("    {}{} File notarized and stapled!", self.prefix, check());
    }

    async fn on_warning(&self, warning: &Error) {
        let _out = self.output.acquire().await;
        eprintln!("    {}{}", self.prefix, format!("Warning: {warning}").muted());
    }

    async fn on_error(&self, error: &Error) {
        let _out = self.output.acquire().await;
        let headline = match error {
            Error::Staple(_) => "Notarization succeeded but stapling failed",
            Error::Cancelled => "Canceled",
            _ => "Error notarizing",
        };
        eprintln!("    {}{} {}", self.prefix, cross(), headline.failure());
    }
}

/// One numbered issue; only error-severity issues are shown in red
fn issue_line(idx: usize, issue: &Issue) -> String {
    let line = format!(
        "Issue #{} ({}) for path {:?}: {}",
        idx + 1,
        issue.severity,
        issue.path,
        issue.message
    );
    if issue.severity.eq_ignore_ascii_case(SEVERITY_ERROR) {
        line.failure()
    } else {
        line.emphasis()
    }
}

/// Output prefixes for concurrently running items
///
/// A single item gets no prefix. Otherwise each item is tagged with its file
/// name, padded so the columns line up.
pub fn status_prefixes(items: &[WorkItem]) -> Vec<String> {
    if items.len() == 1 {
        return vec![String::new()];
    }

    let names: Vec<String> = items
        .iter()
        .map(|item| {
            item.path().file_name().map_or_else(
                || item.path().display().to_string(),
                |n| n.to_string_lossy().into_owned(),
            )
        })
        .collect();
    let width = names.iter().map(|n| n.chars().count()).max().unwrap_or(0);

    names
        .into_iter()
        .map(|name| format!("[{name:<width$}] "))
        .collect()
}
