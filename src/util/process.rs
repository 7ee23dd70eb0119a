//! Subprocess execution utilities.

use std::ffi::OsStr;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use wait_timeout::ChildExt;

/// Failure to run a subprocess to completion.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` timed out after {}s", .timeout.as_secs_f64())]
    TimedOut { command: String, timeout: Duration },

    #[error("failed to wait for `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: io::Error,
    },
}

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
            timeout: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Kill the child if it has not exited after `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute the command and wait for completion, honouring the timeout.
    ///
    /// The timeout covers the whole run, including reading output that a
    /// backgrounded grandchild may keep open after the child exits. A
    /// non-zero exit status is not an error here; callers inspect
    /// `Output::status`.
    pub fn exec(&self) -> Result<Output, ExecError> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("running `{}`", self.display_command());

        let deadline = self.timeout.map(|t| (Instant::now() + t, t));
        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            command: self.display_command(),
            source,
        })?;

        // Both pipes are drained on threads while waiting.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = self.wait(&mut child)?;

        Ok(Output {
            status,
            stdout: self.collect(stdout, deadline)?,
            stderr: self.collect(stderr, deadline)?,
        })
    }

    /// Wait for a drained pipe, giving up at the deadline.
    fn collect(
        &self,
        pipe: Option<Receiver<Vec<u8>>>,
        deadline: Option<(Instant, Duration)>,
    ) -> Result<Vec<u8>, ExecError> {
        let Some(pipe) = pipe else {
            return Ok(Vec::new());
        };
        let Some((deadline, timeout)) = deadline else {
            return Ok(pipe.recv().unwrap_or_default());
        };

        match pipe.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(buf) => Ok(buf),
            Err(RecvTimeoutError::Disconnected) => Ok(Vec::new()),
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    "`{}` exited but its output is still open after {:?}",
                    self.display_command(),
                    timeout
                );
                Err(ExecError::TimedOut {
                    command: self.display_command(),
                    timeout,
                })
            }
        }
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, ExecError> {
        let wait_err = |source| ExecError::Wait {
            command: self.display_command(),
            source,
        };

        let Some(timeout) = self.timeout else {
            return child.wait().map_err(wait_err);
        };

        match child.wait_timeout(timeout).map_err(wait_err)? {
            Some(status) => Ok(status),
            None => {
                tracing::warn!(
                    "`{}` still running after {:?}, killing it",
                    self.display_command(),
                    timeout
                );
                let _ = child.kill();
                let _ = child.wait();
                Err(ExecError::TimedOut {
                    command: self.display_command(),
                    timeout,
                })
            }
        }
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<Vec<u8>>> {
    pipe.map(|mut pipe| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            let _ = tx.send(buf);
        });
        rx
    })
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}
