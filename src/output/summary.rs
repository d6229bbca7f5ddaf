//! Plain-text end-of-scan summary.

use std::io::{self, Write};

use crate::duplicates::{DuplicateStats, ScanReport};

/// Write the console summary of a finished scan.
///
/// Always produces output, including for empty and interrupted scans.
///
/// # Errors
///
/// Propagates write errors.
pub fn write_summary<W: Write>(
    mut out: W,
    report: &ScanReport,
    stats: &DuplicateStats,
) -> io::Result<()> {
    let summary = &report.summary;

    if summary.interrupted {
        writeln!(out, "Scan interrupted; results are partial.")?;
    }
    writeln!(
        out,
        "Scanned {} files ({} matched the allowed extensions), hashed {} in {:.2?}",
        summary.files_enumerated,
        summary.files_accepted,
        summary.files_hashed,
        summary.scan_duration
    )?;

    if !summary.hash_failures.is_empty() {
        writeln!(out, "{} files could not be read", summary.hash_failures.len())?;
    }
    if !summary.scan_errors.is_empty() {
        writeln!(
            out,
            "{} directories or entries were skipped",
            summary.scan_errors.len()
        )?;
    }

    if stats.group_count == 0 {
        writeln!(out, "No duplicates found.")?;
        return Ok(());
    }

    writeln!(
        out,
        "Found {} duplicate groups ({} files)",
        stats.group_count, stats.duplicate_files
    )?;
    writeln!(
        out,
        "Files to delete: {}, space to be freed: {}",
        stats.removable_files,
        stats.reclaimable_display()
    )?;
    if stats.unreadable_sizes > 0 {
        writeln!(
            out,
            "({} files changed or vanished since the scan and were not counted)",
            stats.unreadable_sizes
        )?;
    }
    Ok(())
}
