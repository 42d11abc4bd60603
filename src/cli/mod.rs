//! Command-line interface

pub mod output;

use clap::Parser;
use std::path::PathBuf;

/// Millepede calibration chain runner
#[derive(Debug, Parser, Clone)]
#[command(name = "mpchain")]
#[command(version = "0.1.0")]
#[command(about = "Run the Millepede detector-alignment calibration chain", long_about = None)]
pub struct Cli {
    /// Directory holding the reconstructed track files for this run
    #[arg(short = 'i', long = "input_dir", value_name = "DIR")]
    pub input_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Kill any chain step that runs longer than this many seconds
    #[arg(long, value_name = "SECS")]
    pub step_timeout_secs: Option<u64>,

    /// Print the final run report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}

use std::ffi::OsString;
