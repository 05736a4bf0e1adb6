//! shardsync CLI - Command-line interface for the game directory synchronizer
//!
//! Provides commands for:
//! - Synchronizing the game directory with the update server
//! - Inspecting the local manifest
//! - Viewing and editing configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{config::ConfigCommand, scan::ScanCommand, sync::SyncCommand};
use output::OutputFormat;
use shardsync_core::config::Config;

#[derive(Debug, Parser)]
#[command(name = "shardsync", version, about = "Keep a game directory in sync with its update server")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Synchronize the game directory with the update server
    Sync(SyncCommand),
    /// Print the local manifest without contacting the server
    Scan(ScanCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Options shared by every command
#[derive(Debug, Clone)]
pub struct CliContext {
    pub format: OutputFormat,
    pub quiet: bool,
    pub config_path: PathBuf,
}

impl CliContext {
    /// Load the configuration file
    ///
    /// A missing file yields the defaults; a file that exists but cannot be
    /// parsed is an error so it is never silently replaced.
    pub fn load_config(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }
        Config::load(&self.config_path).with_context(|| {
            format!(
                "Failed to load configuration from {}",
                self.config_path.display()
            )
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let logging = Config::load_or_default(&config_path).logging;

    // Setup tracing
    let filter = match cli.verbose {
        0 => logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let ctx = CliContext {
        format: if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        },
        quiet: cli.quiet,
        config_path,
    };

    match cli.command {
        Commands::Sync(cmd) => cmd.execute(&ctx).await,
        Commands::Scan(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
    }
}
