//! Sync command - Bring the game directory up to date
//!
//! Provides the `shardsync sync` CLI command which:
//! 1. Loads configuration and applies command-line overrides
//! 2. Creates the HTTP update authority for the configured server
//! 3. Runs the SyncOrchestrator, printing status lines and progress
//! 4. Displays a summary of what was installed and removed

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use shardsync_client::client::UpdateClient;
use shardsync_client::provider::HttpUpdateAuthority;
use shardsync_core::ports::{FileEvent, ISyncObserver};
use shardsync_sync::engine::{SyncOrchestrator, SyncReport};

use super::TargetArgs;
use crate::output::{get_formatter, OutputFormat, OutputFormatter};
use crate::CliContext;

#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Update server base URL (overrides server.base_url)
    #[arg(long)]
    pub server: Option<String>,
}

impl SyncCommand {
    /// Execute the sync command
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format, ctx.quiet);

        let mut config = ctx.load_config()?;
        self.target.apply(&mut config);
        if let Some(server) = &self.server {
            config.server.base_url = server.clone();
        }
        info!(config_path = %ctx.config_path.display(), root = %config.sync.root.display(), "Loaded configuration");

        let errors = config.validate();
        if !errors.is_empty() {
            for error in &errors {
                formatter.error(&error.to_string());
            }
            anyhow::bail!(
                "Invalid configuration ({} error{})",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            );
        }

        let client = UpdateClient::new(&config.server).context("Failed to create HTTP client")?;
        let authority = Arc::new(HttpUpdateAuthority::new(client));
        let orchestrator = SyncOrchestrator::from_config(&config, authority);

        let cancel = CancellationToken::new();
        let signal_token = cancel.clone();
        let signal_task = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling synchronization");
                signal_token.cancel();
            }
        });

        let observer = TerminalObserver::new(formatter.as_ref());
        let result = orchestrator.run(&observer, &cancel).await;
        signal_task.abort();

        let report = result.context("Synchronization failed")?;
        display_report(formatter.as_ref(), ctx.format, &report)?;

        Ok(())
    }
}

/// Print the final summary of a run
fn display_report(
    formatter: &dyn OutputFormatter,
    format: OutputFormat,
    report: &SyncReport,
) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        let json = serde_json::to_value(report).context("Failed to serialize sync report")?;
        formatter.print_json(&json);
        return Ok(());
    }

    let duration_display = if report.duration_ms >= 1000 {
        format!("{:.1}s", report.duration_ms as f64 / 1000.0)
    } else {
        format!("{}ms", report.duration_ms)
    };

    if report.artifacts_total == 0 && report.entries_deleted == 0 && !report.has_failures() {
        formatter.success("Already up to date");
    } else {
        formatter.success(&format!("Sync completed in {}", duration_display));
    }

    if report.artifacts_total > 0 {
        formatter.info(&format!(
            "Artifacts: {} installed, {} skipped of {}",
            report.artifacts_installed, report.artifacts_skipped, report.artifacts_total
        ));
    }
    if report.files_installed > 0 {
        formatter.info(&format!(
            "Installed: {} file{}",
            report.files_installed,
            plural(report.files_installed)
        ));
    }
    if report.files_merged > 0 {
        formatter.info(&format!("Merged:    {} settings file", report.files_merged));
    }
    if report.files_protected > 0 {
        formatter.info(&format!(
            "Protected: {} file{} kept",
            report.files_protected,
            plural(report.files_protected)
        ));
    }
    if report.entries_deleted > 0 {
        formatter.info(&format!(
            "Deleted:   {} entr{}",
            report.entries_deleted,
            if report.entries_deleted == 1 { "y" } else { "ies" }
        ));
    }

    if report.scan_failures > 0 {
        formatter.warn(&format!(
            "{} local file{} could not be read and will be fetched again",
            report.scan_failures,
            plural(report.scan_failures)
        ));
    }
    if report.artifacts_failed() > 0 || !report.errors.is_empty() {
        formatter.warn(&format!(
            "{} artifact{} failed, {} error{} occurred:",
            report.artifacts_failed(),
            plural(report.artifacts_failed()),
            report.errors.len(),
            plural(report.errors.len())
        ));
        for err in &report.errors {
            formatter.info(&format!("  - {}", err));
        }
    }

    Ok(())
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Convert a progress fraction to a whole percentage
fn whole_percent(fraction: f64) -> u8 {
    (fraction.clamp(0.0, 1.0) * 100.0).floor() as u8
}

/// Observer that forwards engine events to the terminal
///
/// Progress is printed only when the whole percentage changes.
struct TerminalObserver<'a> {
    formatter: &'a dyn OutputFormatter,
    last_percent: AtomicU8,
}

impl<'a> TerminalObserver<'a> {
    fn new(formatter: &'a dyn OutputFormatter) -> Self {
        Self {
            formatter,
            last_percent: AtomicU8::new(u8::MAX),
        }
    }
}

impl ISyncObserver for TerminalObserver<'_> {
    fn on_progress(&self, fraction: f64) {
        let percent = whole_percent(fraction);
        if self.last_percent.swap(percent, Ordering::Relaxed) != percent {
            self.formatter.progress(percent);
        }
    }

    fn on_status(&self, message: &str) {
        self.formatter.status(message);
    }

    fn on_file(&self, event: &FileEvent) {
        debug!(artifact = %event.artifact, path = %event.path, outcome = %event.outcome, "File placed");
    }
}
