use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "cef-inspect")]
#[command(about = "Parse, validate and reconstruct Common Event Format (CEF) logs")]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML). Defaults to config/cef-inspect.toml if present.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format, overrides `output.format`
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse every line and print the events. Stops at the first bad line.
    Parse {
        /// Log files to read. Reads stdin when none are given.
        files: Vec<PathBuf>,

        /// Reconstruct with escaping instead of the verbatim serializer
        #[arg(long)]
        escape: bool,

        /// Do not print the reconstructed line
        #[arg(long)]
        no_reconstruct: bool,
    },

    /// Check each line independently and report whether it is valid CEF.
    Validate {
        /// Log files to read. Reads stdin when none are given.
        files: Vec<PathBuf>,
    },

    /// Parse a single line given on the command line.
    Line {
        /// The CEF line, e.g. 'CEF:0|Vendor|Product|1.0|100|Name|2|src=1.1.1.1'
        line: String,
    },
}
