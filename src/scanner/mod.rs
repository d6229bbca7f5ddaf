//! Scanner module for directory traversal, extension filtering and hashing.
//!
//! This module provides functionality for:
//! - Walking several root directories with jwalk
//! - Narrowing candidates to an extension allow-list
//! - Chunked BLAKE3 content hashing
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Root resolution and directory traversal
//! - [`filter`]: Extension allow-list filtering
//! - [`hasher`]: Streaming BLAKE3 file hashing
//!
//! # Example
//!
//! ```no_run
//! use dupefinder::scanner::{ExtensionFilter, Walker};
//! use std::path::PathBuf;
//!
//! let walker = Walker::new(vec![PathBuf::from("~/Pictures")]);
//! let filter = ExtensionFilter::new([".jpg", ".png"]).unwrap();
//!
//! let candidates: Vec<PathBuf> = filter
//!     .filter(walker.walk().filter_map(Result::ok))
//!     .collect();
//! println!("{} candidates", candidates.len());
//! ```

pub mod filter;
pub mod hasher;
pub mod walker;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Re-export main types
pub use filter::ExtensionFilter;
pub use hasher::{
    hash_to_hex, FileHasher, Hash, Hasher, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE,
    MIN_CHUNK_SIZE,
};
pub use walker::{resolve_root, Walker};

/// Outcome of hashing a single file.
///
/// Produced exactly once per dispatched path by the hashing coordinator
/// and consumed exactly once by the grouper.
#[derive(Debug, Clone)]
pub struct HashResult {
    /// Path that was hashed
    pub path: PathBuf,
    /// Content digest, or the classified reason hashing failed
    pub outcome: Result<Hash, HashError>,
}

impl HashResult {
    /// A successful result.
    #[must_use]
    pub fn success(path: PathBuf, hash: Hash) -> Self {
        Self {
            path,
            outcome: Ok(hash),
        }
    }

    /// A failed result.
    #[must_use]
    pub fn failure(path: PathBuf, error: HashError) -> Self {
        Self {
            path,
            outcome: Err(error),
        }
    }

    /// Whether hashing succeeded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The digest, if hashing succeeded.
    #[must_use]
    pub fn hash(&self) -> Option<&Hash> {
        self.outcome.as_ref().ok()
    }
}

/// Errors that can occur during directory scanning.
///
/// None of these abort a scan; they are logged as warnings and collected
/// in the scan summary.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified root is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A symlink cycle was detected while following links.
    #[error("Symlink loop detected: {0}")]
    SymlinkLoop(PathBuf),

    /// An I/O error occurred while accessing a path.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error for the given path.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p)
            | Self::NotFound(p)
            | Self::NotADirectory(p)
            | Self::SymlinkLoop(p)
            | Self::Io { path: p, .. } => p,
        }
    }
}

/// Errors that can occur during file hashing.
///
/// Cloneable so that per-file failures can be carried in both the hash
/// results and the scan summary.
#[derive(thiserror::Error, Debug, Clone)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<io::Error>,
    },

    /// The worker hashing this file panicked.
    #[error("Worker panicked while hashing {path}: {message}")]
    WorkerPanicked {
        /// Path being hashed when the panic occurred
        path: PathBuf,
        /// Panic payload, if it was a string
        message: String,
    },
}

impl HashError {
    /// Classify an I/O error for the given path.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: Arc::new(error),
            },
        }
    }

    /// Path of the file that failed to hash.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::Io { path: p, .. }
            | Self::WorkerPanicked { path: p, .. } => p,
        }
    }

    /// Stable machine-readable reason code.
    #[must_use]
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::PermissionDenied(_) => "permission_denied",
            Self::Io { .. } => "io_error",
            Self::WorkerPanicked { .. } => "worker_panicked",
        }
    }
}
