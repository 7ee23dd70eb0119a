//! `tether classify` command

use anyhow::Result;

use crate::cli::{ClassifyArgs, GlobalArgs};
use tether::ops::classify;
use tether::util::Diagnostic;

pub fn execute(args: ClassifyArgs, global: &GlobalArgs) -> Result<()> {
    let shell = super::shell(global, args.json);
    let message = super::read_message(&args.input)?;
    let analysis = classify(&message);

    if shell.is_json() {
        return shell.json(&analysis);
    }

    print!(
        "{}",
        Diagnostic::from_analysis(&analysis).format(shell.use_color())
    );
    Ok(())
}
