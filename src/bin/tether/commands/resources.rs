//! `tether resources` command

use anyhow::Result;

use crate::cli::{GlobalArgs, ResourcesArgs};
use tether::ResourceRegistry;

pub fn execute(args: ResourcesArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = super::context(global)?;
    let shell = super::shell(global, args.json);
    let registry = super::registry(&ctx);

    let records = {
        let _spinner = shell.spinner(format!("Listing resources with `{}`", registry.command()));
        registry.list()?
    };

    if shell.is_json() {
        return shell.json(&records);
    }

    if records.is_empty() {
        shell.note("the registry has no resources");
        return Ok(());
    }

    for record in &records {
        println!("{:<40} {}", record.id, record.name);
    }

    Ok(())
}
