use std::path::PathBuf;

use caption_convtr::Format;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "capx")]
#[command(about = "Convert closed captions between SCC, DFXP, SRT, WebVTT, JSON and TXT.")]
pub struct Args {
    /// Path to config TOML (defaults to ./config.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert between formats
    Convert(ConvertCmd),
    /// Print the effective default config as TOML and exit
    PrintDefaultConfig,
}

#[derive(Debug, Parser)]
pub struct ConvertCmd {
    /// Input file path, or '-' for stdin
    pub input: String,

    /// Output file path (optional)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Target format
    #[arg(long, value_enum)]
    pub to: Format,

    /// Force input format (otherwise inferred from extension or content)
    #[arg(long, value_enum)]
    pub from: Option<Format>,

    /// Language tag for input without one, and the language to write
    #[arg(long)]
    pub lang: Option<String>,

    /// Emit SCC roll-up captions as all rows on screen, not one row each
    #[arg(long)]
    pub simulate_roll_up: bool,

    /// Subtract this many milliseconds from every input timestamp
    #[arg(long, allow_negative_numbers = true)]
    pub offset_ms: Option<i64>,

    /// Write to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,

    /// Allow overwriting output file
    #[arg(long)]
    pub overwrite: bool,
}
