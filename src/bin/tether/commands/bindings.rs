//! `tether bindings` command

use anyhow::Result;

use super::or_dash;
use crate::cli::{BindingsArgs, GlobalArgs};

pub fn execute(args: BindingsArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = super::context(global)?;
    let shell = super::shell(global, args.json);
    let (path, bindings) = super::load_bindings(&ctx)?;

    if shell.is_json() {
        return shell.json(&bindings);
    }

    if bindings.is_empty() {
        shell.note(format!("no [[resource_bindings]] blocks in {}", path.display()));
        return Ok(());
    }

    println!("{:<16} {:<24} ID", "BINDING", "RESOURCE");
    for binding in &bindings {
        println!(
            "{:<16} {:<24} {}",
            or_dash(&binding.binding_name),
            or_dash(&binding.resource_name),
            or_dash(&binding.resource_id)
        );
    }

    Ok(())
}
