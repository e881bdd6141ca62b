//! Command-line argument definitions using clap.

use crate::output::OutputFormat;
use clap::{Args, Parser, Subcommand};
use spyder::Mode;
use std::path::PathBuf;

/// Subdomain enumeration over certificate transparency and DNS brute force
///
/// Results go to stdout, logs to stderr.
#[derive(Parser, Debug)]
#[command(name = "spyder")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Output format
    #[arg(long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect the configuration file
    Config(ConfigArgs),
}

// ============================================================================
// Enumeration
// ============================================================================

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Target domain (e.g., example.com)
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Discovery mode: active, passive or both
    #[arg(short, long, default_value_t = Mode::Active)]
    pub mode: Mode,

    /// Wordlist for brute forcing, one label per line
    #[arg(short, long, default_value = "wordlists/subdomains.txt")]
    pub wordlist: PathBuf,

    /// Concurrent brute-force lookups
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Give up after this many minutes
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Comma-separated resolvers (ip or ip:port)
    #[arg(long, value_delimiter = ',')]
    pub resolvers: Vec<String>,

    /// Minimum milliseconds between queries to one resolver (0 disables)
    #[arg(long)]
    pub rate_limit: Option<u64>,

    /// Expansion generations (0 disables permutation)
    #[arg(long)]
    pub depth: Option<usize>,

    /// Seconds to listen to the certificate feed (0 listens until --timeout)
    #[arg(long, value_name = "SECS")]
    pub passive_window: Option<u64>,

    /// Also write found names to this file, one per line
    #[arg(short = 'o', long = "out")]
    pub out: Option<PathBuf>,
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Write the effective configuration to the configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
