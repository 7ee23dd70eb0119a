//! Registry client backed by an external control command.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use crate::core::ResourceRecord;
use crate::util::config::RegistryConfig;
use crate::util::process::{find_executable, ProcessBuilder};

use super::error::RegistryError;
use super::output::{parse_created_id, parse_list_output};
use super::ResourceRegistry;

/// Default time a single registry command may run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Talks to the registry by running `<command> <list_args>` and
/// `<command> <create_args> <name>`.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    command: String,
    list_args: Vec<String>,
    create_args: Vec<String>,
    timeout: Duration,
    cwd: Option<PathBuf>,
}

impl CommandRegistry {
    /// Create a client for `command` with the given subcommand prefixes.
    pub fn new(
        command: impl Into<String>,
        list_args: Vec<String>,
        create_args: Vec<String>,
    ) -> Self {
        CommandRegistry {
            command: command.into(),
            list_args,
            create_args,
            timeout: DEFAULT_TIMEOUT,
            cwd: None,
        }
    }

    /// Build a client from the `[registry]` config section.
    pub fn from_config(config: &RegistryConfig) -> Self {
        CommandRegistry::new(
            config.command(),
            config.list_args(),
            config.create_args(),
        )
        .with_timeout(config.timeout())
    }

    /// Override the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run commands from `cwd`.
    pub fn with_cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve the command to an executable. Paths are used as given.
    pub fn program(&self) -> Result<PathBuf, RegistryError> {
        let path = Path::new(&self.command);
        if path.components().count() > 1 {
            return Ok(path.to_path_buf());
        }
        find_executable(&self.command).ok_or_else(|| RegistryError::CommandNotFound {
            command: self.command.clone(),
        })
    }

    fn run(&self, args: &[String]) -> Result<(String, Output), RegistryError> {
        let mut pb = ProcessBuilder::new(self.program()?)
            .args(args)
            .timeout(self.timeout);
        if let Some(ref cwd) = self.cwd {
            pb = pb.cwd(cwd);
        }

        let cmdline = format!("{} {}", self.command, args.join(" "));
        let output = pb.exec()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let stderr = if stderr.is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr
            };
            return Err(RegistryError::CommandFailed {
                command: cmdline,
                code: output.status.code(),
                stderr,
            });
        }

        Ok((cmdline, output))
    }
}

impl ResourceRegistry for CommandRegistry {
    fn list(&self) -> Result<Vec<ResourceRecord>, RegistryError> {
        let (cmdline, output) = self.run(&self.list_args)?;
        let records = parse_list_output(&String::from_utf8_lossy(&output.stdout));
        tracing::debug!("`{}` returned {} resources", cmdline, records.len());
        Ok(records)
    }

    fn create(&self, name: &str) -> Result<ResourceRecord, RegistryError> {
        let mut args = self.create_args.clone();
        args.push(name.to_string());

        let (cmdline, output) = self.run(&args)?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        match parse_created_id(&stdout) {
            Some(id) => {
                tracing::info!("created resource `{}` ({})", name, id);
                Ok(ResourceRecord::new(id, name))
            }
            None => Err(RegistryError::MalformedOutput {
                command: cmdline,
                output: stdout,
            }),
        }
    }
}
