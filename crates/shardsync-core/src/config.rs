//! Configuration module for shardsync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{InstallRules, MergeTarget, RelativePath};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for shardsync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub server: ServerConfig,
    pub install: InstallConfig,
    pub logging: LoggingConfig,
}

/// Local installation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Game installation directory kept in sync with the server.
    pub root: PathBuf,
    /// Subtree omitted from scanning and installation when `skip_excluded` is set.
    pub excluded_prefix: String,
    /// Whether to omit `excluded_prefix`.
    pub skip_excluded: bool,
}

/// Update server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the update server, without a trailing slash.
    pub base_url: String,
    /// Timeout in seconds for the reconciliation and delete-list calls.
    pub request_timeout_secs: u64,
    /// Timeout in seconds for one artifact download.
    pub download_timeout_secs: u64,
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
}

/// Installation exceptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Subtrees whose existing files are never overwritten.
    pub protected_paths: Vec<String>,
    /// File merged key by key instead of replaced. Empty disables merging.
    pub merge_target: String,
    /// Keys of the merge target the server may overwrite.
    pub merge_keys: Vec<String>,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Emit structured JSON log lines instead of human-readable ones.
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Write the configuration as YAML, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/shardsync/config.yaml` on Linux and
    /// `%APPDATA%\shardsync\config.yaml` on Windows.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("shardsync")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Keys of the client settings file the server is allowed to change.
pub const DEFAULT_MERGE_KEYS: &[&str] = &[
    "ip",
    "port",
    "clientversion",
    "last_server_name",
    "lastservernum",
];

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            excluded_prefix: "ClassicUO/".to_string(),
            skip_excluded: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://server.endore.pl:3300".to_string(),
            request_timeout_secs: 30,
            download_timeout_secs: 600,
            connect_timeout_secs: 10,
        }
    }
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            protected_paths: vec!["ClassicUO/Data/Plugins/Razor/Profiles/default".to_string()],
            merge_target: "ClassicUO/settings.json".to_string(),
            merge_keys: DEFAULT_MERGE_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Derived values
// ---------------------------------------------------------------------------

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl SyncConfig {
    /// The excluded subtree, if exclusion is enabled and the prefix is valid.
    pub fn exclusion(&self) -> Option<RelativePath> {
        if !self.skip_excluded {
            return None;
        }
        RelativePath::parse(&self.excluded_prefix).ok()
    }
}

impl InstallConfig {
    /// Convert to domain [`InstallRules`].
    ///
    /// Invalid entries are reported by [`Config::validate`]; here they are
    /// dropped.
    pub fn rules(&self) -> InstallRules {
        let protected_paths = self
            .protected_paths
            .iter()
            .filter_map(|p| RelativePath::parse(p).ok())
            .collect();

        let merge_target = if self.merge_target.is_empty() {
            None
        } else {
            RelativePath::parse(&self.merge_target)
                .ok()
                .map(|path| MergeTarget::new(path, self.merge_keys.iter().cloned()))
        };

        InstallRules {
            protected_paths,
            merge_target,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"server.base_url"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- sync ---
        if self.sync.root.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "sync.root".into(),
                message: "game directory is not set".into(),
            });
        } else {
            // Tilde is expanded at runtime.
            let root_str = self.sync.root.to_string_lossy();
            if !root_str.starts_with('~') && !self.sync.root.is_dir() {
                errors.push(ValidationError {
                    field: "sync.root".into(),
                    message: format!("directory does not exist: {}", self.sync.root.display()),
                });
            }
        }
        if let Err(e) = RelativePath::parse(&self.sync.excluded_prefix) {
            errors.push(ValidationError {
                field: "sync.excluded_prefix".into(),
                message: e.to_string(),
            });
        }

        // --- server ---
        if !(self.server.base_url.starts_with("http://")
            || self.server.base_url.starts_with("https://"))
        {
            errors.push(ValidationError {
                field: "server.base_url".into(),
                message: format!(
                    "must start with http:// or https://, got '{}'",
                    self.server.base_url
                ),
            });
        }
        if self.server.request_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "server.request_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.server.download_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "server.download_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.server.connect_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "server.connect_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- install ---
        for (i, path) in self.install.protected_paths.iter().enumerate() {
            if let Err(e) = RelativePath::parse(path) {
                errors.push(ValidationError {
                    field: format!("install.protected_paths[{i}]"),
                    message: e.to_string(),
                });
            }
        }
        if !self.install.merge_target.is_empty() {
            if let Err(e) = RelativePath::parse(&self.install.merge_target) {
                errors.push(ValidationError {
                    field: "install.merge_target".into(),
                    message: e.to_string(),
                });
            }
            if self.install.merge_keys.is_empty() {
                errors.push(ValidationError {
                    field: "install.merge_keys".into(),
                    message: "must list at least one key when merge_target is set".into(),
                });
            }
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use shardsync_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .sync_root(PathBuf::from("/home/user/Games/UO"))
///     .skip_excluded(true)
///     .server_base_url("http://localhost:3300")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- sync ---

    pub fn sync_root(mut self, root: PathBuf) -> Self {
        self.config.sync.root = root;
        self
    }

    pub fn excluded_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.sync.excluded_prefix = prefix.into();
        self
    }

    pub fn skip_excluded(mut self, skip: bool) -> Self {
        self.config.sync.skip_excluded = skip;
        self
    }

    // --- server ---

    pub fn server_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.server.base_url = url.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.server.request_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.server.download_timeout_secs = secs;
        self
    }

    // --- install ---

    pub fn protected_paths(mut self, paths: Vec<String>) -> Self {
        self.config.install.protected_paths = paths;
        self
    }

    pub fn merge_target(mut self, path: impl Into<String>) -> Self {
        self.config.install.merge_target = path.into();
        self
    }

    pub fn merge_keys(mut self, keys: Vec<String>) -> Self {
        self.config.install.merge_keys = keys;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_json(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    /// Consume the builder and return the configuration without validation.
    pub fn build(self) -> Config {
        self.config
    }

    /// Consume the builder, returning the configuration only if it validates.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let errors = self.config.validate();
        if errors.is_empty() {
            Ok(self.config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
