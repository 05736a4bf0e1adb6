//! CLI command implementations

pub mod config;
pub mod scan;
pub mod sync;

use std::path::PathBuf;

use clap::Args;
use shardsync_core::config::Config;

/// Directory options shared by `sync` and `scan`
#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// Game directory (overrides sync.root)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Skip the excluded subtree (overrides sync.skip_excluded)
    #[arg(long)]
    pub skip_excluded: bool,
}

impl TargetArgs {
    /// Apply the command-line overrides to a loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(root) = &self.root {
            config.sync.root = root.clone();
        }
        config.sync.root = expand_tilde(&config.sync.root.to_string_lossy());
        if self.skip_excluded {
            config.sync.skip_excluded = true;
        }
    }
}

/// Expand tilde (~) in a path string to the user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
