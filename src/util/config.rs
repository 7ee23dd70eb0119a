//! Configuration file support for Tether.
//!
//! Tether supports two configuration file locations:
//! - Global: `~/.tether/config.toml` - User-wide defaults
//! - Project: `.tether/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Command-line flags
//! take precedence over both.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Control command used when nothing is configured.
pub const DEFAULT_REGISTRY_COMMAND: &str = "wrangler";

/// Binding file searched for when nothing is configured.
pub const DEFAULT_CONFIG_FILE: &str = "wrangler.toml";

/// Default registry command timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Tether configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Registry command settings
    pub registry: RegistryConfig,

    /// Project layout settings
    pub project: ProjectConfig,

    /// Deploy command settings
    pub deploy: DeployConfig,
}

/// How to reach the resource registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Control command (name in PATH or a path)
    pub command: Option<String>,

    /// Arguments that make the command list resources
    pub list_args: Option<Vec<String>>,

    /// Arguments that make the command create a resource; the name is appended
    pub create_args: Option<Vec<String>>,

    /// Per-call timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl RegistryConfig {
    pub fn command(&self) -> &str {
        self.command.as_deref().unwrap_or(DEFAULT_REGISTRY_COMMAND)
    }

    pub fn list_args(&self) -> Vec<String> {
        self.list_args
            .clone()
            .unwrap_or_else(|| vec!["d1".to_string(), "list".to_string()])
    }

    pub fn create_args(&self) -> Vec<String> {
        self.create_args
            .clone()
            .unwrap_or_else(|| vec!["d1".to_string(), "create".to_string()])
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

/// Project layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// File name of the binding configuration
    pub config_file: Option<String>,
}

impl ProjectConfig {
    pub fn config_file(&self) -> &str {
        self.config_file.as_deref().unwrap_or(DEFAULT_CONFIG_FILE)
    }
}

/// Deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Arguments passed to the registry command to deploy
    pub args: Option<Vec<String>>,
}

impl DeployConfig {
    pub fn args(&self) -> Vec<String> {
        self.args
            .clone()
            .unwrap_or_else(|| vec!["deploy".to_string()])
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Registry settings
        if other.registry.command.is_some() {
            self.registry.command = other.registry.command;
        }
        if other.registry.list_args.is_some() {
            self.registry.list_args = other.registry.list_args;
        }
        if other.registry.create_args.is_some() {
            self.registry.create_args = other.registry.create_args;
        }
        if other.registry.timeout_secs.is_some() {
            self.registry.timeout_secs = other.registry.timeout_secs;
        }

        // Project settings
        if other.project.config_file.is_some() {
            self.project.config_file = other.project.config_file;
        }

        // Deploy settings
        if other.deploy.args.is_some() {
            self.deploy.args = other.deploy.args;
        }
    }
}

/// Get the global tether config directory (~/.tether).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".tether"))
}

/// Get the global config path (~/.tether/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.tether/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".tether").join("config.toml")
}
