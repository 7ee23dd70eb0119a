//! Tether CLI - binding validation and recovery for deploy configuration

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod prompt;

use cli::{Cli, Commands};
use tether::util::context::ContextError;
use tether::util::diagnostic::{emit, suggestions, Diagnostic};
use tether::RegistryError;

fn main() {
    let cli = Cli::parse();

    let filter = if cli.global.verbose {
        EnvFilter::new("tether=debug")
    } else {
        EnvFilter::new("tether=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    if let Err(e) = run(cli) {
        emit(&diagnose(&e), false);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let global = cli.global;
    match cli.command {
        Commands::Bindings(args) => commands::bindings::execute(args, &global),
        Commands::Resources(args) => commands::resources::execute(args, &global),
        Commands::Validate(args) => commands::validate::execute(args, &global),
        Commands::Classify(args) => commands::classify::execute(args, &global),
        Commands::Recover(args) => commands::recover::execute(args, &global),
        Commands::Deploy(args) => commands::deploy::execute(args, &global),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Attach a fix to errors the user can act on.
fn diagnose(err: &anyhow::Error) -> Diagnostic {
    let diag = Diagnostic::error(format!("{:#}", err));

    if err.downcast_ref::<ContextError>().is_some() {
        return diag.with_suggestion(suggestions::NO_CONFIG_FILE);
    }

    match err.downcast_ref::<RegistryError>() {
        Some(RegistryError::CommandNotFound { .. }) => {
            diag.with_suggestion(suggestions::INSTALL_REGISTRY_COMMAND)
        }
        Some(RegistryError::CommandFailed { .. }) => diag.with_suggestion(suggestions::CHECK_LOGIN),
        _ => diag,
    }
}
