//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Tether - validate and repair resource bindings in deploy configuration
#[derive(Parser)]
#[command(name = "tether")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Binding file to use instead of searching upward for it
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Registry control command
    #[arg(long, global = true, env = "TETHER_REGISTRY_COMMAND", value_name = "CMD")]
    pub registry_command: Option<String>,

    /// Registry command timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the bindings declared in the configuration file
    Bindings(BindingsArgs),

    /// List resources known to the registry
    Resources(ResourcesArgs),

    /// Cross-check bindings against the registry
    Validate(ValidateArgs),

    /// Classify deploy error text
    Classify(ClassifyArgs),

    /// Interactively fix the binding behind a deploy error
    Recover(RecoverArgs),

    /// Deploy, recovering from binding errors and retrying once
    Deploy(DeployArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct BindingsArgs {
    /// Print JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ResourcesArgs {
    /// Print JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Error text given as arguments or on stdin.
#[derive(Args)]
pub struct MessageArgs {
    /// Error message (words are joined with spaces)
    #[arg(required_unless_present = "stdin", conflicts_with = "stdin")]
    pub message: Vec<String>,

    /// Read the error message from stdin
    #[arg(long)]
    pub stdin: bool,
}

#[derive(Args)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub input: MessageArgs,

    /// Print the analysis as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct RecoverArgs {
    #[command(flatten)]
    pub input: MessageArgs,
}

#[derive(Args)]
pub struct DeployArgs {
    /// Do not retry after a successful recovery
    #[arg(long)]
    pub no_retry: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
