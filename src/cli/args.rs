//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};

use crate::cli::commands::convert::ConvertArgs;

#[derive(Parser)]
#[command(name = "nxconv")]
#[command(author, version, about = "NeXus data converter")]
#[command(long_about = "Fill NeXus application definitions (NXDL) from instrument files and metadata, \
validate the result and write it out.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Only report errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert input files into a NeXus file for an application definition
    Convert(ConvertArgs),

    /// List the available readers and the definitions they support
    Readers,
}
