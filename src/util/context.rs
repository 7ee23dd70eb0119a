//! Global context for Tether operations.
//!
//! Resolves the working directory, the project root, the binding file and
//! the merged tool configuration once per invocation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::util::config::{global_config_path, project_config_path, Config};

/// Failure to locate the binding file.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("could not find `{file_name}` in `{}` or any parent directory", .dir.display())]
    ConfigFileNotFound { file_name: String, dir: PathBuf },
}

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    cwd: PathBuf,
    config: Config,
    /// Directory holding the binding file (and `.tether/`)
    project_root: Option<PathBuf>,
    /// Explicit `--config` path, absolute
    explicit_file: Option<PathBuf>,
}

impl GlobalContext {
    /// Discover from the process working directory and `~/.tether/config.toml`.
    pub fn new(explicit_file: Option<PathBuf>) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::discover(
            cwd,
            explicit_file,
            global_config_path().as_deref(),
        ))
    }

    /// Discover from `cwd`, reading global config from `global_path`.
    ///
    /// The project root is the directory of `explicit_file` when given,
    /// otherwise the nearest ancestor of `cwd` holding `.tether/config.toml`
    /// or the binding file named by the global config.
    pub fn discover(cwd: PathBuf, explicit_file: Option<PathBuf>, global_path: Option<&Path>) -> Self {
        let mut config = match global_path {
            Some(path) => Config::load_or_default(path),
            None => Config::default(),
        };

        let explicit_file = explicit_file.map(|p| if p.is_absolute() { p } else { cwd.join(p) });
        let project_root = match &explicit_file {
            Some(file) => file.parent().map(Path::to_path_buf),
            None => find_project_root(&cwd, config.project.config_file()),
        };

        if let Some(root) = &project_root {
            let project = project_config_path(root);
            if project.exists() {
                tracing::debug!("using project config {}", project.display());
                config.merge(Config::load_or_default(&project));
            }
        }

        GlobalContext {
            cwd,
            config,
            project_root,
            explicit_file,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable access for command-line overrides.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Path of the binding file.
    pub fn binding_file(&self) -> Result<PathBuf, ContextError> {
        if let Some(file) = &self.explicit_file {
            return Ok(file.clone());
        }

        let file_name = self.config.project.config_file();
        self.project_root
            .as_ref()
            .map(|root| root.join(file_name))
            .filter(|path| path.is_file())
            .ok_or_else(|| ContextError::ConfigFileNotFound {
                file_name: file_name.to_string(),
                dir: self.cwd.clone(),
            })
    }

    /// Working directory for registry and deploy commands.
    pub fn command_dir(&self) -> &Path {
        self.project_root.as_deref().unwrap_or(&self.cwd)
    }
}

/// Walk up from `start` to the first directory holding `file_name` or a
/// project config.
pub fn find_project_root(start: &Path, file_name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(file_name).is_file() || project_config_path(dir).is_file())
        .map(Path::to_path_buf)
}
