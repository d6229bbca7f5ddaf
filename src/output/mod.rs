//! Report rendering for duplicate scan results.
//!
//! This module provides the persisted report formats and the console summary:
//! - CSV for spreadsheet import ([`csv`])
//! - JSON for automation and scripting ([`json`])
//! - Plain-text end-of-scan summary ([`summary`])
//!
//! Reports are written to `<output_dir>/duplicates_report_<YYYY_MM_DD__HH_MM_SS>.<ext>`.
//! No file is written when a scan found no duplicates.
//!
//! # Example
//!
//! ```no_run
//! use dupefinder::config::ScanConfig;
//! use dupefinder::duplicates::DuplicateFinder;
//! use dupefinder::output::{write_report, ReportFormat};
//! use std::path::{Path, PathBuf};
//!
//! let config = ScanConfig::new(vec![PathBuf::from(".")], [".png"])?;
//! let report = DuplicateFinder::new(&config).find_duplicates()?;
//! if let Some(path) = write_report(&report, ReportFormat::Csv, Path::new("out"), chrono::Local::now())? {
//!     println!("Report written to {}", path.display());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod csv;
pub mod json;
pub mod summary;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::duplicates::ScanReport;

// Re-export main types
pub use self::csv::CsvOutput;
pub use self::json::JsonOutput;
pub use self::summary::write_summary;

/// Persisted report format.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// One row per duplicate file
    #[default]
    Csv,
    /// Summary, statistics and groups in one document
    Json,
}

impl ReportFormat {
    /// File extension for this format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Errors that can occur while writing a report.
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    /// The report file or directory could not be written.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Report path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    /// Error during JSON serialization.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Report file name for a scan finished at `now`.
#[must_use]
pub fn report_file_name(now: DateTime<Local>, format: ReportFormat) -> String {
    format!(
        "duplicates_report_{}.{}",
        now.format("%Y_%m_%d__%H_%M_%S"),
        format.extension()
    )
}

/// Write the report for `report` into `output_dir`.
///
/// Returns `Ok(None)` without touching the filesystem when there are no
/// duplicate groups.
///
/// # Errors
///
/// Returns [`ReportError`] if the directory or file cannot be written.
pub fn write_report(
    report: &ScanReport,
    format: ReportFormat,
    output_dir: &Path,
    now: DateTime<Local>,
) -> Result<Option<PathBuf>, ReportError> {
    if !report.has_duplicates() {
        log::info!("No duplicates found; no report written");
        return Ok(None);
    }

    fs::create_dir_all(output_dir).map_err(ReportError::io(output_dir))?;
    let path = output_dir.join(report_file_name(now, format));
    let file = File::create(&path).map_err(ReportError::io(&path))?;
    let mut writer = BufWriter::new(file);

    match format {
        ReportFormat::Csv => CsvOutput::new(&report.groups).write_to(&mut writer)?,
        ReportFormat::Json => JsonOutput::new(report, now).write_to(&mut writer)?,
    }
    writer.flush().map_err(ReportError::io(&path))?;

    log::info!("Report written to {}", path.display());
    Ok(Some(path))
}
