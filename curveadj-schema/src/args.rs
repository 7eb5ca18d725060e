pub mod cli;

pub use clap;

use clap::{Parser, Subcommand};
use cli::CliArgs;

#[derive(Parser)]
#[command(author, version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the daemon
    Daemon,
    /// Run the CLI
    Cli(CliArgs),
}
