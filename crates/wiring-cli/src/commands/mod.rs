//! CLI command definitions and dispatch.

pub mod check;
pub mod get;
pub mod plan;

use clap::{Parser, Subcommand};

/// Wiring — declarative object-graph assembly.
#[derive(Parser, Debug)]
#[command(name = "wire", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Treat unknown `{$name}` tokens as errors, overriding the document.
    #[arg(long, global = true)]
    pub strict: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a document and report its entries.
    Check(check::CheckArgs),
    /// Display the construction order of a document's entries.
    Plan(plan::PlanArgs),
    /// Resolve one entry and print it as JSON.
    Get(get::GetArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Check(args) => check::execute(&args, cli.strict),
        Command::Plan(args) => plan::execute(&args, cli.strict),
        Command::Get(args) => get::execute(args, cli.strict),
    }
}
