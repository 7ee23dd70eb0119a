//! Command implementations

pub mod bindings;
pub mod classify;
pub mod completions;
pub mod deploy;
pub mod recover;
pub mod resources;
pub mod validate;

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::{GlobalArgs, MessageArgs};
use tether::core::{parse_bindings, BindingDeclaration};
use tether::util::fs::read_to_string;
use tether::util::shell::{ColorChoice, Shell};
use tether::util::GlobalContext;
use tether::CommandRegistry;

/// Context with command-line overrides applied.
pub fn context(global: &GlobalArgs) -> Result<GlobalContext> {
    let mut ctx = GlobalContext::new(global.config.clone())?;

    let registry = &mut ctx.config_mut().registry;
    if let Some(command) = &global.registry_command {
        registry.command = Some(command.clone());
    }
    if let Some(secs) = global.timeout {
        registry.timeout_secs = Some(secs);
    }

    Ok(ctx)
}

pub fn shell(global: &GlobalArgs, json: bool) -> Shell {
    let color = if global.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    Shell::from_flags(global.quiet, global.verbose, color, json)
}

/// Registry client running in the project directory.
pub fn registry(ctx: &GlobalContext) -> CommandRegistry {
    CommandRegistry::from_config(&ctx.config().registry).with_cwd(ctx.command_dir())
}

/// Locate and parse the binding file.
pub fn load_bindings(ctx: &GlobalContext) -> Result<(PathBuf, Vec<BindingDeclaration>)> {
    let path = ctx.binding_file()?;
    let text = read_to_string(&path)?;
    Ok((path, parse_bindings(&text)))
}

/// The error text from arguments or stdin.
pub fn read_message(input: &MessageArgs) -> Result<String> {
    if input.stdin {
        let mut message = String::new();
        std::io::stdin()
            .read_to_string(&mut message)
            .context("failed to read error message from stdin")?;
        Ok(message)
    } else {
        Ok(input.message.join(" "))
    }
}

/// `-` for an absent field.
pub fn or_dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}
