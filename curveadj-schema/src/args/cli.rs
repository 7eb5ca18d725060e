use crate::config::ConfigurationFields;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about)]
pub struct CliArgs {
    /// Remote TCP address to connect to instead of the local socket
    #[arg(long)]
    pub tcp_address: Option<String>,
    #[command(subcommand)]
    pub subcommand: CliCommand,
}

#[derive(Subcommand)]
pub enum CliCommand {
    /// Show the active configuration
    #[clap(alias = "state")]
    Status,
    /// Show daemon info
    Info,
    /// Change offsets, applying only what differs from the active configuration
    Set(OffsetArgs),
    /// Apply a configuration in full, ignoring the active one
    Resync(OffsetArgs),
    /// Apply the active configuration again
    Reapply,
}

#[derive(Parser, Clone, Copy)]
pub struct OffsetArgs {
    /// Enable or disable the CPU all-core offset
    #[arg(long)]
    pub apply_cpu_offset: Option<bool>,
    /// CPU offset, positive values are treated as 0
    #[arg(long, allow_negative_numbers = true)]
    pub cpu_offset: Option<i32>,
    /// Enable or disable the GPU offset
    #[arg(long)]
    pub apply_gpu_offset: Option<bool>,
    /// GPU offset, positive values are treated as 0
    #[arg(long, allow_negative_numbers = true)]
    pub gpu_offset: Option<i32>,
    #[arg(long)]
    pub show_debug: Option<bool>,
}

impl From<OffsetArgs> for ConfigurationFields {
    fn from(args: OffsetArgs) -> Self {
        Self {
            apply_cpu_offset: args.apply_cpu_offset,
            cpu_offset: args.cpu_offset,
            apply_gpu_offset: args.apply_gpu_offset,
            gpu_offset: args.gpu_offset,
            show_debug: args.show_debug,
        }
    }
}
