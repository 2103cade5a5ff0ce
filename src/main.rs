//! notarun - concurrent macOS notarization
//!
//! CLI binary that notarizes and staples the artifacts listed in a
//! configuration file.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "notarun")]
#[command(about = "Notarize and staple macOS artifacts concurrently")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    config: PathBuf,

    /// Log level (e.g. "info", "debug", or a filter like "notarun=trace").
    /// No logs are written unless this is set.
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn init_logging(cli: &Cli) -> Result<()> {
    let Some(ref level) = cli.log_level else {
        return Ok(());
    };

    let filter = EnvFilter::try_new(level).context("invalid --log-level")?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if cli.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let report = cli::run_notarize(&cli.config, &cancel)
        .await
        .with_context(|| format!("failed to notarize from {}", cli.config.display()))?;

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
