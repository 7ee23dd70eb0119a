//! `tether deploy` command

use std::io;

use anyhow::Result;

use crate::cli::{DeployArgs, GlobalArgs};
use crate::prompt::TerminalPrompt;
use tether::ops::{deploy, DeployOptions};
use tether::util::diagnostic::suggestions;
use tether::util::process::ProcessBuilder;
use tether::util::shell::Status;

pub fn execute(args: DeployArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = super::context(global)?;
    let shell = super::shell(global, false);
    let path = ctx.binding_file()?;
    let registry = super::registry(&ctx);

    let command = ProcessBuilder::new(registry.program()?)
        .args(ctx.config().deploy.args())
        .cwd(ctx.command_dir());
    let options = DeployOptions {
        command,
        retry: !args.no_retry,
    };

    let stdin = io::stdin();
    let mut prompt = TerminalPrompt::new(stdin.lock(), io::stderr());
    shell.status(Status::Deploying, options.command.display_command());
    let outcome = deploy(&options, &registry, &mut prompt, &path, |attempt| {
        print!("{}", attempt.output);
        if !attempt.success {
            shell.warn(format!(
                "deploy exited with code {}",
                attempt.code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
            ));
        }
    })?;

    if let Some(recovery) = &outcome.recovery {
        super::recover::report(&shell, recovery);
    }

    if outcome.succeeded() {
        shell.status(Status::Finished, "deploy succeeded");
        return Ok(());
    }

    if outcome.recovery.as_ref().is_some_and(|r| r.handled) && args.no_retry {
        shell.note("binding file updated; run the deploy again");
    } else {
        shell.note(suggestions::RUN_VALIDATE);
    }
    std::process::exit(1);
}
