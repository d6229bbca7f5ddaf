//! CSV output formatter for duplicate scan results.
//!
//! One row is generated for each member of each duplicate group, groups in
//! grouping order.
//!
//! # Columns
//!
//! - `digest`: BLAKE3 content hash (hexadecimal)
//! - `path`: Absolute path to the file
//! - `size_bytes`: File size in bytes, read when the report is written
//!
//! A member whose size cannot be read is left out with a warning.

use std::io;

use serde::Serialize;

use super::ReportError;
use crate::duplicates::groups::file_size;
use crate::duplicates::DuplicateGroup;

/// A single row in the CSV output.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    digest: &'a str,
    path: String,
    size_bytes: u64,
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    groups: &'a [DuplicateGroup],
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup]) -> Self {
        Self { groups }
    }

    /// Write the CSV output to the given writer.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Csv`] if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), ReportError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        csv_writer.write_record(["digest", "path", "size_bytes"])?;

        for group in self.groups {
            let digest = group.hash_hex();
            for path in &group.files {
                let Some(size_bytes) = file_size(path) else {
                    log::warn!("Leaving {} out of the report", path.display());
                    continue;
                };
                csv_writer.serialize(CsvRow {
                    digest: &digest,
                    path: path.to_string_lossy().into_owned(),
                    size_bytes,
                })?;
            }
        }

        csv_writer.flush().map_err(::csv::Error::from)?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Csv`] if serialization fails.
    pub fn to_string(&self) -> Result<String, ReportError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
