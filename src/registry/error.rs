//! Registry failure types.

use std::time::Duration;

use thiserror::Error;

use crate::util::process::ExecError;

/// Infrastructure-level failure talking to the registry.
///
/// Domain outcomes such as "resource not found" are never errors; they are
/// reported through [`super::Lookup`].
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry command `{command}` not found in PATH")]
    CommandNotFound { command: String },

    #[error("failed to run `{command}`: {message}")]
    Spawn { command: String, message: String },

    #[error("`{command}` exited with code {}: {stderr}", .code.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("`{command}` timed out after {}s", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    #[error("`{command}` succeeded but printed no resource id")]
    MalformedOutput { command: String, output: String },
}

impl From<ExecError> for RegistryError {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::TimedOut { command, timeout } => RegistryError::Timeout { command, timeout },
            ExecError::Spawn { command, source } | ExecError::Wait { command, source } => {
                RegistryError::Spawn {
                    command,
                    message: source.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_message() {
        let err = RegistryError::CommandFailed {
            command: "wrangler d1 list".to_string(),
            code: Some(1),
            stderr: "not logged in".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "`wrangler d1 list` exited with code 1: not logged in"
        );
    }

    #[test]
    fn test_timeout_from_exec_error() {
        let err: RegistryError = ExecError::TimedOut {
            command: "wrangler d1 list".to_string(),
            timeout: Duration::from_secs(60),
        }
        .into();
        assert!(matches!(err, RegistryError::Timeout { .. }));
        assert!(err.to_string().contains("60s"));
    }
}
