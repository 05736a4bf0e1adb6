//! Scan command - Print the local manifest
//!
//! Runs only the scanning phase so the digests the server would receive can
//! be inspected without contacting it.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use shardsync_sync::scanner::ManifestScanner;

use super::TargetArgs;
use crate::output::{get_formatter, OutputFormat};
use crate::CliContext;

#[derive(Debug, Args)]
pub struct ScanCommand {
    #[command(flatten)]
    pub target: TargetArgs,
}

impl ScanCommand {
    /// Execute the scan command
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format, ctx.quiet);

        let mut config = ctx.load_config()?;
        self.target.apply(&mut config);
        if config.sync.root.as_os_str().is_empty() {
            anyhow::bail!("No game directory given. Pass --root or set sync.root");
        }

        info!(root = %config.sync.root.display(), "Scanning");
        let outcome = ManifestScanner::new(config.sync.root.clone())
            .with_exclusion(config.sync.exclusion())
            .scan()
            .await
            .context("Scan failed")?;

        if matches!(ctx.format, OutputFormat::Json) {
            let failed: Vec<String> = outcome
                .failed
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            let json = serde_json::json!({
                "root": config.sync.root.display().to_string(),
                "files": outcome.manifest,
                "failed": failed,
            });
            formatter.print_json(&json);
            return Ok(());
        }

        for (path, digest) in outcome.manifest.iter() {
            formatter.info(&format!("{}  {}", digest, path));
        }
        formatter.success(&format!(
            "{} file{} in {}",
            outcome.manifest.len(),
            if outcome.manifest.len() == 1 { "" } else { "s" },
            config.sync.root.display()
        ));
        for path in &outcome.failed {
            formatter.warn(&format!("Could not read {}", path.display()));
        }

        Ok(())
    }
}
