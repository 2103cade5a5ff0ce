//! `xcrun altool` implementation of the notarization service

use crate::error::{Error, Result};
use crate::notary::output::{ToolOutput, interpret_status, interpret_submission};
use crate::notary::{Credentials, NotaryService};
use crate::types::StatusSnapshot;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Notarization service backed by `xcrun altool`
#[derive(Debug, Clone)]
pub struct XcrunNotary {
    program: PathBuf,
    credentials: Credentials,
}

impl XcrunNotary {
    /// Create a service that runs `xcrun` from `PATH`
    pub fn new(credentials: Credentials) -> Self {
        Self::with_program("xcrun", credentials)
    }

    /// Create a service that runs the given executable instead of `xcrun`
    pub fn with_program(program: impl Into<PathBuf>, credentials: Credentials) -> Self {
        Self {
            program: program.into(),
            credentials,
        }
    }

    fn credential_args(&self) -> Vec<String> {
        let mut args = vec![
            "-u".to_string(),
            self.credentials.username.clone(),
            "-p".to_string(),
            self.credentials.password.clone(),
        ];
        if let Some(ref provider) = self.credentials.provider {
            args.push("--asc-provider".to_string());
            args.push(provider.clone());
        }
        args
    }

    /// Run the tool, capturing output. The child is killed if the future is dropped.
    async fn run(&self, args: &[String]) -> std::io::Result<ToolOutput> {
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(ToolOutput {
            success: output.status.success(),
            stdout: output.stdout,
            combined,
        })
    }
}

#[async_trait]
impl NotaryService for XcrunNotary {
    async fn submit(&self, file: &Path, bundle_id: &str) -> Result<String> {
        let mut args = vec![
            "altool".to_string(),
            "--notarize-app".to_string(),
            "--primary-bundle-id".to_string(),
            bundle_id.to_string(),
        ];
        args.extend(self.credential_args());
        args.extend([
            "-f".to_string(),
            file.display().to_string(),
            "--output-format".to_string(),
            "xml".to_string(),
        ]);

        info!(
            file = %file.display(),
            program = %self.program.display(),
            "submitting file for notarization"
        );
        let output = self.run(&args).await.map_err(|e| {
            Error::SubmissionTransport(format!(
                "failed to run {}: {e}",
                self.program.display()
            ))
        })?;
        debug!(success = output.success, output = %output.combined, "submission command finished");

        interpret_submission(&output)
    }

    async fn status(&self, request_id: &str) -> Result<StatusSnapshot> {
        let mut args = vec![
            "altool".to_string(),
            "--notarization-info".to_string(),
            request_id.to_string(),
        ];
        args.extend(self.credential_args());
        args.extend(["--output-format".to_string(), "xml".to_string()]);

        debug!(request_id, "requesting notarization info");
        let output = self.run(&args).await.map_err(|e| {
            Error::StatusTransport(format!("failed to run {}: {e}", self.program.display()))
        })?;
        debug!(success = output.success, output = %output.combined, "info command finished");

        interpret_status(&output)
    }
}
