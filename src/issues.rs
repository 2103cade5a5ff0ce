//! Issue classification
//!
//! Splits the issues of a notarization log into suppressed and reported
//! ones. Any reported issue fails the item, even when the service said
//! "success": Gatekeeper later rejects artifacts that notarized with issues.

use crate::error::{Error, Result};
use crate::types::Issue;
use regex::Regex;
use std::fmt;

/// Pattern matched against issue paths; matching issues are suppressed
#[derive(Debug, Clone)]
pub struct SuppressionRule {
    pattern: Regex,
}

impl SuppressionRule {
    /// Compile a suppression rule
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::Config(format!("invalid issue suppression pattern: {e}")))?;
        Ok(Self { pattern })
    }

    /// Whether the issue is suppressed by this rule
    pub fn matches(&self, issue: &Issue) -> bool {
        self.pattern.is_match(&issue.path)
    }

    /// The source pattern
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

/// One unsuppressed issue, rendered as an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueError(pub Issue);

impl fmt::Display for IssueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} for path {:?}: {}",
            self.0.severity, self.0.path, self.0.message
        )
    }
}

impl std::error::Error for IssueError {}

/// Aggregate of every unsuppressed issue, in log order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueErrors {
    errors: Vec<IssueError>,
}

impl IssueErrors {
    /// Number of sub-errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Always false for errors produced by [`classify`]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterate over the sub-errors
    pub fn iter(&self) -> std::slice::Iter<'_, IssueError> {
        self.errors.iter()
    }

    /// Sub-errors as a slice
    pub fn errors(&self) -> &[IssueError] {
        &self.errors
    }
}

impl fmt::Display for IssueErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} issues during notarization:", self.errors.len())?;
        for err in &self.errors {
            write!(f, "\n  * {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for IssueErrors {}

/// Issues split by the suppression rule
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueOutcome {
    /// Issues matching the suppression rule
    pub suppressed: Vec<Issue>,
    /// Issues that fail the item
    pub reported: Vec<Issue>,
}

impl IssueOutcome {
    /// True when nothing is left to report
    pub fn ok(&self) -> bool {
        self.reported.is_empty()
    }

    /// Aggregate error for the reported issues, if any
    pub fn error(&self) -> Option<IssueErrors> {
        if self.reported.is_empty() {
            return None;
        }
        Some(IssueErrors {
            errors: self.reported.iter().cloned().map(IssueError).collect(),
        })
    }
}

/// Split issues into suppressed and reported, preserving order
pub fn classify(issues: &[Issue], rule: Option<&SuppressionRule>) -> IssueOutcome {
    let (suppressed, reported): (Vec<Issue>, Vec<Issue>) = issues
        .iter()
        .cloned()
        .partition(|issue| rule.is_some_and(|r| r.matches(issue)));

    IssueOutcome {
        suppressed,
        reported,
    }
}
