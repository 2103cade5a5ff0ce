//! Notarize command - notarize every item of a configuration file

use crate::cli::{CliProgress, status_prefixes};
use crate::cli::style::{Stylize, check, cross};
use anstream::println;
use notarun::config::Config;
use notarun::error::Result;
use notarun::logs::LogFetcher;
use notarun::notarize::{Coordinator, Gate, RunReport, StatusObserver, WorkflowRunner};
use notarun::notary::XcrunNotary;
use notarun::staple::XcrunStapler;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Run the notarize command
pub async fn run_notarize(config_path: &Path, cancel: &CancellationToken) -> Result<RunReport> {
    let settings = Config::load(config_path)?.resolve()?;

    let runner = WorkflowRunner::new(
        Arc::new(XcrunNotary::with_program(
            &settings.xcrun,
            settings.credentials.clone(),
        )),
        Arc::new(LogFetcher::new()?),
        Arc::new(XcrunStapler::with_program(&settings.xcrun)),
    )
    .with_suppression(settings.suppression)
    .with_intervals(settings.intervals);

    let coordinator = Coordinator::new(runner, Gate::new(), Gate::new());

    println!("{}", "==> Notarizing...".emphasis());
    if settings.items.len() > 1 {
        for item in &settings.items {
            println!("    Path: {}", item.path().display().to_string().accent());
        }
        println!(
            "    {}",
            "Files will be notarized concurrently to optimize queue wait".muted()
        );
    }

    let prefixes = status_prefixes(&settings.items);
    let report = coordinator
        .run(
            settings.items,
            |idx, _item, output| -> Arc<dyn StatusObserver> {
                Arc::new(CliProgress::new(prefixes[idx].clone(), output))
            },
            cancel,
        )
        .await;

    print_summary(&report);
    Ok(report)
}

/// Print every item and whether it was notarized and stapled
fn print_summary(report: &RunReport) {
    println!();
    if report.is_success() {
        println!("{}", "Notarization complete! Notarized files:".success());
    } else {
        println!(
            "{}",
            format!(
                "Notarization failed for {} of {} files:",
                report.items.len() - report.success_count(),
                report.items.len()
            )
            .failure()
        );
    }

    for item in &report.items {
        let mark = if item.failed() { cross() } else { check() };
        println!("  {mark} {item}");
        for err in &item.state.errors {
            println!("      {}", err.to_string().failure());
        }
        for warning in &item.state.warnings {
            println!("      {}", warning.to_string().muted());
        }
    }
}
