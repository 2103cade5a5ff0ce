//! Stapling notarization tickets onto artifacts

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

/// Attaches the notarization ticket to an artifact
#[async_trait]
pub trait Stapler: Send + Sync {
    /// Staple the ticket onto `file`
    async fn staple(&self, file: &Path) -> Result<()>;
}

/// Stapler backed by `xcrun stapler staple`
#[derive(Debug, Clone)]
pub struct XcrunStapler {
    program: PathBuf,
}

impl XcrunStapler {
    /// Run `xcrun` from `PATH`
    pub fn new() -> Self {
        Self::with_program("xcrun")
    }

    /// Run the given executable instead of `xcrun`
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for XcrunStapler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Stapler for XcrunStapler {
    async fn staple(&self, file: &Path) -> Result<()> {
        info!(file = %file.display(), "stapling");
        let output = Command::new(&self.program)
            .arg("stapler")
            .arg("staple")
            .arg(file)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::Staple(format!("failed to run {}: {e}", self.program.display())))?;

        if output.status.success() {
            info!(file = %file.display(), "stapling complete");
            return Ok(());
        }

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        warn!(file = %file.display(), output = %combined, "stapling failed");
        Err(Error::Staple(combined.trim().to_string()))
    }
}
