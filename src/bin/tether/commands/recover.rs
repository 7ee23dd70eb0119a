//! `tether recover` command

use std::io;

use anyhow::Result;

use crate::cli::{GlobalArgs, RecoverArgs};
use crate::prompt::TerminalPrompt;
use tether::ops::{RecoveryAction, RecoveryOrchestrator, RecoveryResult};
use tether::util::diagnostic::{emit, Diagnostic};
use tether::util::shell::{Shell, Status};

pub fn execute(args: RecoverArgs, global: &GlobalArgs) -> Result<()> {
    let message = super::read_message(&args.input)?;
    let ctx = super::context(global)?;
    let shell = super::shell(global, false);
    let path = ctx.binding_file()?;
    let registry = super::registry(&ctx);

    shell.status(Status::Recovering, path.display());

    let stdin = io::stdin();
    let mut prompt = TerminalPrompt::new(stdin.lock(), io::stderr());
    let result = RecoveryOrchestrator::new(&registry, &mut prompt, &path).handle_error(&message)?;

    report(&shell, &result);

    if !(result.handled || result.action == RecoveryAction::AlreadyConfigured) {
        std::process::exit(1);
    }
    Ok(())
}

/// Print what a recovery attempt did.
pub fn report(shell: &Shell, result: &RecoveryResult) {
    let target = format!(
        "`{}` ({})",
        result.resource_name.as_deref().unwrap_or("?"),
        result.resource_id.as_deref().unwrap_or("?")
    );
    let binding = result.binding_name.as_deref().unwrap_or("?");

    match result.action {
        RecoveryAction::CreatedAndConfigured => {
            shell.status(
                Status::Created,
                format!("database {} bound as `{}`", target, binding),
            );
        }
        RecoveryAction::SelectedExisting | RecoveryAction::UpdatedBinding => {
            shell.status(
                Status::Updated,
                format!("binding `{}` now points at {}", binding, target),
            );
        }
        RecoveryAction::AlreadyConfigured => {
            shell.note(format!(
                "binding `{}` already points at {}; the failure has another cause",
                binding, target
            ));
        }
        RecoveryAction::Cancelled => {
            shell.status(Status::Cancelled, "no changes made");
        }
        RecoveryAction::NotRecoverable => {
            emit(&Diagnostic::from_analysis(&result.analysis), shell.use_color());
        }
        RecoveryAction::Failed => {
            let diag = Diagnostic::error(format!(
                "recovery failed: {}",
                result.error.as_deref().unwrap_or("unknown error")
            ))
            .with_suggestions(result.analysis.suggestions.iter().cloned());
            emit(&diag, shell.use_color());
        }
    }

    if let Some(backup) = &result.backup {
        shell.note(format!("previous configuration saved to {}", backup.display()));
    }
}
