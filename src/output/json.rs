//! JSON output formatter for duplicate scan results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "generated_at": "2024-03-07T09:05:01+01:00",
//!   "summary": {
//!     "files_enumerated": 120,
//!     "files_accepted": 80,
//!     "files_hashed": 79,
//!     "hash_failures": [{"path": "/p/locked.png", "reason": "permission_denied"}],
//!     "scan_warnings": ["Permission denied: /p/private"],
//!     "workers": 8,
//!     "chunk_size": 16384,
//!     "dispatched": 80,
//!     "interrupted": false,
//!     "scan_duration_ms": 412
//!   },
//!   "stats": {
//!     "group_count": 1,
//!     "duplicate_files": 2,
//!     "removable_files": 1,
//!     "reclaimable_bytes": 5,
//!     "unreadable_sizes": 0
//!   },
//!   "groups": [
//!     {
//!       "digest": "ea8f16...",
//!       "files": [
//!         {"path": "/p/a.png", "size_bytes": 5},
//!         {"path": "/p/b.png", "size_bytes": 5}
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::io::Write;

use chrono::{DateTime, Local};
use serde::Serialize;

use super::ReportError;
use crate::duplicates::{DuplicateGroup, DuplicateStats, ScanReport, ScanSummary};

/// One group member in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFile {
    /// Absolute path
    pub path: String,
    /// Size in bytes when the report was written, `null` if unreadable
    pub size_bytes: Option<u64>,
}

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// BLAKE3 hash as hexadecimal string (64 characters)
    pub digest: String,
    /// Members, keeper first
    pub files: Vec<JsonFile>,
}

impl JsonDuplicateGroup {
    /// Create a JSON duplicate group, reading member sizes now.
    #[must_use]
    pub fn from_duplicate_group(group: &DuplicateGroup) -> Self {
        Self {
            digest: group.hash_hex(),
            files: group
                .files
                .iter()
                .zip(group.member_sizes())
                .map(|(path, size_bytes)| JsonFile {
                    path: path.to_string_lossy().into_owned(),
                    size_bytes,
                })
                .collect(),
        }
    }
}

/// A file that could not be hashed.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFailure {
    /// Path of the file
    pub path: String,
    /// Stable reason code (`not_found`, `permission_denied`, ...)
    pub reason: &'static str,
}

/// Scan summary in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Regular files found while walking
    pub files_enumerated: usize,
    /// Files accepted by the extension filter
    pub files_accepted: usize,
    /// Files hashed successfully
    pub files_hashed: usize,
    /// Files that could not be hashed
    pub hash_failures: Vec<JsonFailure>,
    /// Traversal warnings
    pub scan_warnings: Vec<String>,
    /// Effective number of hashing workers
    pub workers: usize,
    /// Effective read chunk size in bytes
    pub chunk_size: usize,
    /// Paths handed to the hashing workers
    pub dispatched: usize,
    /// Whether the scan was interrupted
    pub interrupted: bool,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
}

impl JsonSummary {
    /// Create a JSON summary from a [`ScanSummary`].
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary) -> Self {
        Self {
            files_enumerated: summary.files_enumerated,
            files_accepted: summary.files_accepted,
            files_hashed: summary.files_hashed,
            hash_failures: summary
                .hash_failures
                .iter()
                .map(|e| JsonFailure {
                    path: e.path().to_string_lossy().into_owned(),
                    reason: e.reason_code(),
                })
                .collect(),
            scan_warnings: summary.scan_errors.iter().map(ToString::to_string).collect(),
            workers: summary.workers,
            chunk_size: summary.chunk_size,
            dispatched: summary.dispatched,
            interrupted: summary.interrupted,
            scan_duration_ms: u64::try_from(summary.scan_duration.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Complete JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// When the report was generated (RFC 3339)
    pub generated_at: String,
    /// Scan summary
    pub summary: JsonSummary,
    /// Aggregate duplicate statistics
    pub stats: DuplicateStats,
    /// Duplicate groups
    pub groups: Vec<JsonDuplicateGroup>,
}

impl JsonOutput {
    /// Build the JSON report for a scan.
    #[must_use]
    pub fn new(report: &ScanReport, generated_at: DateTime<Local>) -> Self {
        Self {
            generated_at: generated_at.to_rfc3339(),
            summary: JsonSummary::from_scan_summary(&report.summary),
            stats: report.stats(),
            groups: report
                .groups
                .iter()
                .map(JsonDuplicateGroup::from_duplicate_group)
                .collect(),
        }
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty-printed JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Json`] if serialization or writing fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), ReportError> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer).map_err(serde_json::Error::io)?;
        Ok(())
    }
}
