//! Config command - View and manage shardsync configuration
//!
//! Provides the `shardsync config` CLI command which:
//! 1. Shows the current configuration (YAML or JSON)
//! 2. Sets individual configuration values via dot-notation keys
//! 3. Validates the configuration file and reports errors

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use shardsync_core::config::Config;

use crate::output::{get_formatter, OutputFormat};
use crate::CliContext;

/// Keys accepted by `config set`, with a short description
const SUPPORTED_KEYS: &[(&str, &str)] = &[
    ("sync.root", "Game directory"),
    ("sync.excluded_prefix", "Subtree omitted when skip_excluded is set"),
    ("sync.skip_excluded", "true|false"),
    ("server.base_url", "Update server URL"),
    ("server.request_timeout_secs", "Seconds for reconcile/delete-list calls"),
    ("server.download_timeout_secs", "Seconds for one artifact download"),
    ("server.connect_timeout_secs", "TCP connect timeout in seconds"),
    ("install.protected_paths", "Comma-separated subtrees never overwritten"),
    ("install.merge_target", "Settings file merged key by key (empty disables)"),
    ("install.merge_keys", "Comma-separated keys the server may change"),
    ("logging.level", "trace|debug|info|warn|error"),
    ("logging.json", "true|false"),
];

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "server.base_url")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(ctx),
            ConfigCommand::Set { key, value } => execute_set(ctx, key, value),
            ConfigCommand::Validate => execute_validate(ctx),
        }
    }
}

fn execute_show(ctx: &CliContext) -> Result<()> {
    let formatter = get_formatter(ctx.format, ctx.quiet);
    let config = ctx.load_config()?;

    info!(config_path = %ctx.config_path.display(), "Showing configuration");

    if matches!(ctx.format, OutputFormat::Json) {
        let json =
            serde_json::to_value(&config).context("Failed to serialize configuration to JSON")?;
        formatter.print_json(&json);
    } else {
        formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
        formatter.info("");

        let yaml =
            serde_yaml::to_string(&config).context("Failed to serialize configuration to YAML")?;
        for line in yaml.lines() {
            formatter.info(line);
        }
    }

    Ok(())
}

fn execute_set(ctx: &CliContext, key: &str, value: &str) -> Result<()> {
    let formatter = get_formatter(ctx.format, ctx.quiet);
    let mut config = ctx.load_config()?;

    info!(key = %key, value = %value, "Setting configuration value");

    if let Err(e) = apply_config_value(&mut config, key, value) {
        if matches!(ctx.format, OutputFormat::Json) {
            formatter.print_json(&serde_json::json!({
                "success": false,
                "key": key,
                "value": value,
                "error": e.to_string(),
            }));
        } else {
            formatter.error(&format!("Failed to set '{}': {}", key, e));
            formatter.info("");
            formatter.info("Supported keys:");
            for (name, help) in SUPPORTED_KEYS {
                formatter.info(&format!("  {:<32} - {}", name, help));
            }
        }
        return Ok(());
    }

    // The game directory may not exist before the first sync
    let errors: Vec<String> = config
        .validate()
        .into_iter()
        .filter(|e| e.field != "sync.root")
        .map(|e| e.to_string())
        .collect();
    if !errors.is_empty() {
        if matches!(ctx.format, OutputFormat::Json) {
            formatter.print_json(&serde_json::json!({
                "success": false,
                "key": key,
                "value": value,
                "errors": errors,
            }));
        } else {
            formatter.error(&format!(
                "Invalid value for '{}': {}",
                key,
                errors.join("; ")
            ));
        }
        return Ok(());
    }

    config
        .save(&ctx.config_path)
        .context("Failed to write configuration file")?;

    if matches!(ctx.format, OutputFormat::Json) {
        formatter.print_json(&serde_json::json!({
            "success": true,
            "key": key,
            "value": value,
            "config_path": ctx.config_path.display().to_string(),
        }));
    } else {
        formatter.success(&format!("Set {} = {}", key, value));
        formatter.info(&format!("Saved to {}", ctx.config_path.display()));
    }

    Ok(())
}

fn execute_validate(ctx: &CliContext) -> Result<()> {
    let formatter = get_formatter(ctx.format, ctx.quiet);
    let config_path = &ctx.config_path;

    let config = match Config::load(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            let message = if config_path.exists() {
                format!("Failed to parse configuration: {}", e)
            } else {
                "Configuration file not found. Using defaults.".to_string()
            };
            if matches!(ctx.format, OutputFormat::Json) {
                formatter.print_json(&serde_json::json!({
                    "valid": false,
                    "config_path": config_path.display().to_string(),
                    "errors": [message],
                }));
            } else if config_path.exists() {
                formatter.error(&message);
                formatter.info(&format!("File: {}", config_path.display()));
            } else {
                formatter.info(&format!(
                    "Configuration file not found at {}",
                    config_path.display()
                ));
                formatter.info(
                    "Using default configuration. Run 'shardsync config set <key> <value>' to create one.",
                );
            }
            return Ok(());
        }
    };

    info!(config_path = %config_path.display(), "Validating configuration");

    let errors = config.validate();

    if matches!(ctx.format, OutputFormat::Json) {
        let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": config_path.display().to_string(),
            "errors": error_strings,
        }));
    } else if errors.is_empty() {
        formatter.success("Configuration is valid");
        formatter.info(&format!("File: {}", config_path.display()));
    } else {
        formatter.error(&format!(
            "Configuration has {} error{}:",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" }
        ));
        formatter.info(&format!("File: {}", config_path.display()));
        formatter.info("");
        for error in &errors {
            formatter.info(&format!("  {} - {}", error.field, error.message));
        }
    }

    Ok(())
}

/// Split a comma-separated list, dropping empty items
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Apply a dot-notation key/value pair to a Config struct
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        // --- sync ---
        "sync.root" => {
            config.sync.root = PathBuf::from(value);
        }
        "sync.excluded_prefix" => {
            config.sync.excluded_prefix = value.to_string();
        }
        "sync.skip_excluded" => {
            config.sync.skip_excluded = value
                .parse::<bool>()
                .context("Expected true or false for sync.skip_excluded")?;
        }

        // --- server ---
        "server.base_url" => {
            config.server.base_url = value.trim_end_matches('/').to_string();
        }
        "server.request_timeout_secs" => {
            config.server.request_timeout_secs = value
                .parse::<u64>()
                .context("Expected a positive integer")?;
        }
        "server.download_timeout_secs" => {
            config.server.download_timeout_secs = value
                .parse::<u64>()
                .context("Expected a positive integer")?;
        }
        "server.connect_timeout_secs" => {
            config.server.connect_timeout_secs = value
                .parse::<u64>()
                .context("Expected a positive integer")?;
        }

        // --- install ---
        "install.protected_paths" => {
            config.install.protected_paths = parse_list(value);
        }
        "install.merge_target" => {
            config.install.merge_target = value.to_string();
        }
        "install.merge_keys" => {
            config.install.merge_keys = parse_list(value);
        }

        // --- logging ---
        "logging.level" => {
            config.logging.level = value.to_string();
        }
        "logging.json" => {
            config.logging.json = value
                .parse::<bool>()
                .context("Expected true or false for logging.json")?;
        }

        _ => {
            anyhow::bail!("Unknown configuration key: '{}'", key);
        }
    }

    Ok(())
}
