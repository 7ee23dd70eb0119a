//! `tether validate` command

use anyhow::Result;

use crate::cli::{GlobalArgs, ValidateArgs};
use tether::ops::BindingValidator;
use tether::util::diagnostic::{emit, Diagnostic};
use tether::util::shell::Status;

pub fn execute(args: ValidateArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = super::context(global)?;
    let shell = super::shell(global, args.json);
    let (path, bindings) = super::load_bindings(&ctx)?;
    let registry = super::registry(&ctx);

    shell.status(
        Status::Checking,
        format!(
            "{} binding{} in {}",
            bindings.len(),
            if bindings.len() == 1 { "" } else { "s" },
            path.display()
        ),
    );

    let report = {
        let _spinner = shell.spinner(format!("Querying `{}`", registry.command()));
        BindingValidator::new(&registry).validate(&bindings)
    };

    if shell.is_json() {
        shell.json(&report)?;
    } else if report.valid {
        shell.status(Status::Finished, "all bindings match the registry");
        for suggestion in &report.suggestions {
            shell.note(suggestion);
        }
    } else {
        emit(
            &Diagnostic::from_report(&report).with_location(&path),
            shell.use_color(),
        );
    }

    if !report.valid {
        std::process::exit(1);
    }

    Ok(())
}
