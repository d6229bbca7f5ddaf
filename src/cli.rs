//! Command-line interface definitions for dupefinder.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options (verbosity, error format, config file) apply to every subcommand.
//!
//! # Example
//!
//! ```bash
//! # Scan the configured directories for duplicate images
//! dupefinder scan
//!
//! # Scan specific directories for duplicate PDFs and text files
//! dupefinder scan ~/Documents ~/Downloads -e pdf -e txt
//!
//! # Use four workers, 1 MiB read chunks, JSON report
//! dupefinder scan ~/Pictures -j 4 --chunk-size 1MiB --format json
//!
//! # Move duplicates to the trash without prompting
//! dupefinder scan ~/Pictures --delete --yes
//!
//! # Write the default configuration file
//! dupefinder init-config
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::ReportFormat;

/// Concurrent duplicate file finder.
///
/// dupefinder walks a set of directories, hashes every file with an allowed
/// extension using BLAKE3, and reports groups of files with identical content.
#[derive(Debug, Parser)]
#[command(name = "dupefinder")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Path to a TOML configuration file
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan directories for duplicate files
    Scan(ScanArgs),
    /// Write the default configuration file
    InitConfig(InitConfigArgs),
}

/// Arguments for the scan subcommand.
///
/// Every option here overrides the configuration file and environment.
#[derive(Debug, Default, Args)]
pub struct ScanArgs {
    /// Directories to scan (default: `search_directories` from the config)
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Allowed file extension, repeatable (e.g. -e jpg -e .png)
    #[arg(short = 'e', long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Read chunk size (e.g. 16KiB, 4MB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub chunk_size: Option<u64>,

    /// Number of hashing workers (clamped to 1..=available parallelism)
    #[arg(short = 'j', long, value_name = "N", allow_negative_numbers = true)]
    pub workers: Option<i64>,

    /// Hard upper bound on the number of hashing workers
    #[arg(long, value_name = "N")]
    pub max_workers: Option<usize>,

    /// Follow symbolic links during traversal
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Report format
    #[arg(long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Directory to write the report into
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Do not write a report file
    #[arg(long)]
    pub no_report: bool,

    /// Delete every duplicate except the first file of each group
    #[arg(long, requires = "yes")]
    pub delete: bool,

    /// Delete permanently instead of moving to the trash
    #[arg(long, requires = "delete")]
    pub permanent: bool,

    /// Confirm destructive actions without prompting
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Arguments for the init-config subcommand.
#[derive(Debug, Args)]
pub struct InitConfigArgs {
    /// Destination (default: --config, else the platform config directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Parse a human-readable size string into bytes.
///
/// Supports formats like:
/// - Plain numbers: "1024" (bytes)
/// - With suffix: "1KB", "1MB", "1GB", "1TB"
/// - Binary suffixes: "1KiB", "1MiB", "1GiB", "1TiB"
/// - Decimal values: "1.5MB", "0.5GB"
///
/// # Errors
///
/// Returns an error string if the format is invalid.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
