//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// phonelab -- parse, sort and walk PhoneLab device logs.
///
/// Use `phonelab <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "phonelab", version, about, long_about = None)]
pub struct Cli {
    /// Path to a phonelab.toml walker configuration (defaults + env overrides if omitted).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Diagnostic log format written to stderr.
    #[arg(long, global = true, default_value = "pretty")]
    pub log_format: LogFormat,

    /// Output format for reports written to stdout.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Supported diagnostic log formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// JSON lines.
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Walk a log tree and parse every dated directory.
    Walk(WalkArgs),

    /// Parse a single log file.
    Parse(ParseArgs),

    /// Inspect the walker configuration.
    Config(ConfigArgs),
}

// ---- walk ----

/// Walk a log tree, one task per `time/YYYY/MM/DD` directory.
#[derive(Args, Debug)]
pub struct WalkArgs {
    /// Root of the log tree.
    pub root: PathBuf,

    /// Override the maximum number of concurrent directory tasks.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Skip chronological sorting of parsed records.
    #[arg(long)]
    pub no_sort: bool,

    /// Only list the directories that would be dispatched.
    #[arg(long)]
    pub dry_run: bool,
}

// ---- parse ----

/// Parse one plain or gzip log file.
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Log file (`.out`, `.log`, `.txt` or `.gz`).
    pub file: PathBuf,

    /// Sort records chronologically before printing.
    #[arg(short, long)]
    pub sort: bool,

    /// Print every record instead of a summary.
    #[arg(short, long)]
    pub records: bool,
}

// ---- config ----

/// Inspect the walker configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show,
}
