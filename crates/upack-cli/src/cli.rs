//! CLI argument parsing using clap.

use clap::Parser;
use std::path::PathBuf;

const AFTER_HELP: &str = "\
Example:
  upack lib-0.0.7.7z

The archive is decrypted into the staging directory, its validation log is
checked against the bundled key, and the libraries are moved into the
repository only if every check passes. Staging is always removed.

Configuration is read from --config, else $UPACK_CONFIG, else config.toml
next to the upack executable.";

#[derive(Parser, Debug)]
#[command(name = "upack")]
#[command(version, about = "A ppk library archive validation and unpacking utility.")]
#[command(long_about = None, after_help = AFTER_HELP)]
pub struct Cli {
    /// Path to the .7z archive to verify and unpack
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Configuration file
    #[arg(short, long, value_name = "FILE", env = "UPACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// List each file as it is moved and removed
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output the final report in JSON format
    #[arg(short, long)]
    pub json: bool,
}
