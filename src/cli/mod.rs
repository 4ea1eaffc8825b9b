//! Command-line surface for the `codemend` binary.

pub mod errors;

use std::path::PathBuf;

use clap::Parser;

/// Review and fix the code in a directory with an LLM agent.
#[derive(Parser, Debug)]
#[command(name = "codemend", version, about = "Autonomous code review and repair")]
pub struct Cli {
    /// Directory to review
    #[arg(default_value = ".")]
    pub directory: PathBuf,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
