//! Deploy with one round of recovery.
//!
//! The deploy command runs once. If it fails, its combined output is handed
//! to the [`RecoveryOrchestrator`]; when recovery rewrote the binding file
//! the deploy is retried exactly once.

use std::path::Path;

use anyhow::{Context, Result};

use crate::ops::recover::{DecisionPort, RecoveryOrchestrator, RecoveryResult};
use crate::registry::ResourceRegistry;
use crate::util::process::ProcessBuilder;

/// One run of the deploy command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployAttempt {
    pub success: bool,
    pub code: Option<i32>,
    /// stdout followed by stderr.
    pub output: String,
}

/// Everything that happened during [`deploy`].
#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub attempts: Vec<DeployAttempt>,
    pub recovery: Option<RecoveryResult>,
}

impl DeployOutcome {
    /// True when the last attempt succeeded.
    pub fn succeeded(&self) -> bool {
        self.attempts.last().is_some_and(|a| a.success)
    }
}

/// Options for [`deploy`].
#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub command: ProcessBuilder,
    /// Retry once after a recovery that changed the binding file.
    pub retry: bool,
}

/// Run the deploy command, recovering from binding failures.
///
/// `on_attempt` sees each attempt as soon as it finishes, before any
/// recovery prompt.
pub fn deploy<R, D, F>(
    options: &DeployOptions,
    registry: &R,
    decisions: &mut D,
    config_path: &Path,
    mut on_attempt: F,
) -> Result<DeployOutcome>
where
    R: ResourceRegistry + ?Sized,
    D: DecisionPort + ?Sized,
    F: FnMut(&DeployAttempt),
{
    let first = run(&options.command)?;
    on_attempt(&first);
    if first.success {
        return Ok(DeployOutcome {
            attempts: vec![first],
            recovery: None,
        });
    }

    tracing::info!("deploy failed, attempting recovery");
    let recovery =
        RecoveryOrchestrator::new(registry, decisions, config_path).handle_error(&first.output)?;

    let mut attempts = vec![first];
    if recovery.handled && options.retry {
        tracing::info!("binding file updated, retrying deploy");
        let retry = run(&options.command)?;
        on_attempt(&retry);
        attempts.push(retry);
    }

    Ok(DeployOutcome {
        attempts,
        recovery: Some(recovery),
    })
}

fn run(command: &ProcessBuilder) -> Result<DeployAttempt> {
    let output = command
        .exec()
        .with_context(|| format!("failed to run `{}`", command.display_command()))?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    Ok(DeployAttempt {
        success: output.status.success(),
        code: output.status.code(),
        output: text,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::ops::recover::RecoveryAction;
    use crate::test_support::{write_config, Answer, FakeRegistry, ScriptedDecisions};
    use tempfile::TempDir;

    const CONFIG: &str = "[[resource_bindings]]\nbinding = \"DB\"\ndatabase_name = \"newdb\"\n";

    const DEPLOY_SCRIPT: &str = "grep -q id-newdb wrangler.toml && echo deployed || \
        { echo \"Couldn't find a D1 DB with the name or binding 'newdb'\" >&2; exit 1; }";

    fn options(dir: &Path, script: &str, retry: bool) -> DeployOptions {
        DeployOptions {
            command: ProcessBuilder::new("sh").arg("-c").arg(script).cwd(dir),
            retry,
        }
    }

    #[test]
    fn test_successful_deploy_skips_recovery() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), CONFIG);
        let registry = FakeRegistry::new();
        let mut decisions = ScriptedDecisions::new([]);

        let outcome = deploy(
            &options(tmp.path(), "echo deployed", true),
            &registry,
            &mut decisions,
            &path,
            |_| {},
        )
        .unwrap();

        assert!(outcome.succeeded());
        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(outcome.attempts[0].output.trim(), "deployed");
        assert!(outcome.recovery.is_none());
    }

    #[test]
    fn test_recover_then_retry() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), CONFIG);
        let registry = FakeRegistry::new();
        let mut decisions = ScriptedDecisions::new([Answer::Choice(0)]);

        let outcome = deploy(
            &options(tmp.path(), DEPLOY_SCRIPT, true),
            &registry,
            &mut decisions,
            &path,
            |_| {},
        )
        .unwrap();

        assert_eq!(outcome.attempts.len(), 2);
        assert!(!outcome.attempts[0].success);
        assert_eq!(outcome.attempts[0].code, Some(1));
        assert!(outcome.succeeded());
        assert_eq!(
            outcome.recovery.unwrap().action,
            RecoveryAction::CreatedAndConfigured
        );
        assert_eq!(registry.created(), vec!["newdb"]);
    }

    #[test]
    fn test_no_retry_still_recovers() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), CONFIG);
        let registry = FakeRegistry::new();
        let mut decisions = ScriptedDecisions::new([Answer::Choice(0)]);

        let outcome = deploy(
            &options(tmp.path(), DEPLOY_SCRIPT, false),
            &registry,
            &mut decisions,
            &path,
            |_| {},
        )
        .unwrap();

        assert_eq!(outcome.attempts.len(), 1);
        assert!(!outcome.succeeded());
        assert!(outcome.recovery.unwrap().handled);
        assert!(std::fs::read_to_string(&path).unwrap().contains("id-newdb"));
    }

    #[test]
    fn test_unrecoverable_failure_is_not_retried() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), CONFIG);
        let registry = FakeRegistry::new();
        let mut decisions = ScriptedDecisions::new([]);

        let outcome = deploy(
            &options(tmp.path(), "echo 'Unauthorized' >&2; exit 7", true),
            &registry,
            &mut decisions,
            &path,
            |_| {},
        )
        .unwrap();

        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(outcome.attempts[0].code, Some(7));
        assert_eq!(
            outcome.recovery.unwrap().action,
            RecoveryAction::NotRecoverable
        );
    }
}
