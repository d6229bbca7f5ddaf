//! dupefinder - Concurrent duplicate file finder
//!
//! Walks a set of directories, keeps files whose extension is on an
//! allow-list, hashes them with chunked BLAKE3 on a bounded worker pool and
//! groups files with identical content. Results can be written as a CSV or
//! JSON report and duplicates can be moved to the trash.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::actions::delete::{delete_duplicates, DeleteConfig, NoopDeleteCallback};
use crate::cli::{Cli, Commands, InitConfigArgs, ScanArgs};
use crate::config::{Config, ConfigError};
use crate::duplicates::DuplicateFinder;
use crate::error::ExitCode;
use crate::output::{write_report, write_summary};
use crate::progress::Progress;

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns an error for fatal conditions: invalid configuration, no readable
/// search directory, or failure to write the report.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Scan(ref args) => run_scan(&cli, args),
        Commands::InitConfig(ref args) => run_init_config(&cli, args),
    }
}

fn run_scan(cli: &Cli, args: &ScanArgs) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_scan_args(args);
    let scan_config = config
        .to_scan_config()
        .context("Invalid scan configuration")?;

    let shutdown = signal::install_handler().context("Failed to install Ctrl+C handler")?;
    let progress = Arc::new(Progress::new(cli.quiet));

    let report = DuplicateFinder::new(&scan_config)
        .with_shutdown_flag(shutdown.get_flag())
        .with_progress_callback(progress)
        .find_duplicates()?;
    let stats = report.stats();

    if !cli.quiet {
        write_summary(io::stdout().lock(), &report, &stats)?;
    }

    if !args.no_report {
        if let Some(path) = write_report(
            &report,
            config.report_format,
            &config.output_dir,
            chrono::Local::now(),
        )? {
            if !cli.quiet {
                println!("Report written to {}", path.display());
            }
        }
    }

    if args.delete && report.has_duplicates() && !report.summary.interrupted {
        let delete_config = if args.permanent {
            DeleteConfig::permanent()
        } else {
            DeleteConfig::trash()
        };
        let result =
            delete_duplicates(&report.groups, &delete_config, None::<&NoopDeleteCallback>);
        if !cli.quiet {
            println!("{}", result.summary());
        }
    }

    let code = if report.summary.interrupted {
        ExitCode::Interrupted
    } else if report.summary.is_partial() {
        ExitCode::PartialSuccess
    } else if report.has_duplicates() {
        ExitCode::Success
    } else {
        ExitCode::NoDuplicates
    };
    log::debug!("Exiting with {:?}", code);
    Ok(code)
}

fn run_init_config(cli: &Cli, args: &InitConfigArgs) -> Result<ExitCode> {
    let path: PathBuf = args
        .path
        .clone()
        .or_else(|| cli.config.clone())
        .or_else(Config::default_path)
        .ok_or(ConfigError::NoConfigDir)?;

    Config::default().save_to(&path, args.force)?;
    if !cli.quiet {
        println!("Configuration written to {}", path.display());
    }
    Ok(ExitCode::Success)
}
