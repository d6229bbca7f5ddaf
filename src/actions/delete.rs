//! Removal of duplicate copies.
//!
//! # Overview
//!
//! [`delete_duplicates`] removes every member of each duplicate group except
//! the first (the keeper):
//! - Move to system trash (default, recoverable)
//! - Permanent deletion (with [`DeleteConfig::permanent`])
//!
//! # Safety
//!
//! Before touching a group the keeper must still exist. If it has vanished
//! the whole group is skipped and recorded as a failure, so the last copy of
//! some content is never removed. A copy that resolves to the keeper's own
//! path is never removed either. A failure on one file never stops the batch.
//!
//! # Example
//!
//! ```no_run
//! use dupefinder::actions::delete::{delete_duplicates, DeleteConfig, NoopDeleteCallback};
//! use dupefinder::duplicates::DuplicateGroup;
//!
//! let groups: Vec<DuplicateGroup> = Vec::new();
//! let result = delete_duplicates(&groups, &DeleteConfig::trash(), None::<&NoopDeleteCallback>);
//! println!("{}", result.summary());
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use thiserror::Error;

use crate::duplicates::DuplicateGroup;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The group's keeper no longer exists, so its copies were left alone.
    #[error("keeper {keeper} is missing; not deleting {path}")]
    KeeperMissing {
        /// The vanished keeper
        keeper: PathBuf,
        /// The copy that was spared
        path: PathBuf,
    },

    /// The copy resolves to the keeper itself (reached through a symlink).
    #[error("{path} is the same file as keeper {keeper}; not deleting")]
    SameFileAsKeeper {
        /// The keeper of the group
        keeper: PathBuf,
        /// The alias that was spared
        path: PathBuf,
    },

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed {
        /// File being trashed
        path: PathBuf,
        /// Error reported by the platform trash
        message: String,
    },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {source}")]
    PermanentDeleteFailed {
        /// File being removed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path of the file that was not deleted.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::KeeperMissing { path: p, .. }
            | Self::SameFileAsKeeper { path: p, .. }
            | Self::TrashFailed { path: p, .. }
            | Self::PermanentDeleteFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }
}

/// Result of a successful deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    /// Path that was deleted.
    pub path: PathBuf,
    /// Size of the deleted file in bytes.
    pub size: u64,
    /// Whether deletion was permanent (true) or to trash (false).
    pub permanent: bool,
}

/// Results of a batch deletion.
#[derive(Debug, Default)]
pub struct BatchDeleteResult {
    /// Successfully deleted files.
    pub successes: Vec<DeleteResult>,
    /// Files that were not deleted, with the reason.
    pub failures: Vec<DeleteError>,
    /// Total bytes freed.
    pub bytes_freed: u64,
}

impl BatchDeleteResult {
    /// Number of successful deletions.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if all deletions succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let freed = ByteSize::b(self.bytes_freed);
        if self.all_succeeded() {
            format!("Deleted {} file(s), freed {}", self.success_count(), freed)
        } else {
            format!(
                "Deleted {} file(s), {} failed, freed {}",
                self.success_count(),
                self.failure_count(),
                freed
            )
        }
    }
}

/// Configuration for deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteConfig {
    /// Use permanent deletion instead of trash.
    pub permanent: bool,
}

impl DeleteConfig {
    /// Move files to the system trash.
    #[must_use]
    pub fn trash() -> Self {
        Self { permanent: false }
    }

    /// Remove files permanently.
    #[must_use]
    pub fn permanent() -> Self {
        Self { permanent: true }
    }
}

/// Callback trait for deletion progress reporting.
pub trait DeleteProgressCallback: Send + Sync {
    /// Called before each file deletion.
    fn on_before_delete(&self, path: &Path, index: usize, total: usize);

    /// Called after a successful deletion.
    fn on_delete_success(&self, path: &Path, size: u64);

    /// Called after a failed or skipped deletion.
    fn on_delete_failure(&self, path: &Path, error: &DeleteError);
}

/// Callback that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDeleteCallback;

impl DeleteProgressCallback for NoopDeleteCallback {
    fn on_before_delete(&self, _path: &Path, _index: usize, _total: usize) {}
    fn on_delete_success(&self, _path: &Path, _size: u64) {}
    fn on_delete_failure(&self, _path: &Path, _error: &DeleteError) {}
}

/// Move a single file to the system trash.
///
/// # Errors
///
/// `NotFound`/`PermissionDenied` if the file cannot be stat'ed, `TrashFailed`
/// if the platform trash rejects it.
pub fn delete_to_trash(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();

    trash::delete(path).map_err(|e| DeleteError::TrashFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    log::info!("Moved to trash: {} ({})", path.display(), ByteSize::b(size));
    Ok(DeleteResult {
        path: path.to_path_buf(),
        size,
        permanent: false,
    })
}

/// Permanently delete a single file.
///
/// # Errors
///
/// `NotFound`/`PermissionDenied` if the file cannot be stat'ed,
/// `PermanentDeleteFailed` if removal fails.
pub fn permanent_delete(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();

    fs::remove_file(path).map_err(|source| DeleteError::PermanentDeleteFailed {
        path: path.to_path_buf(),
        source,
    })?;

    log::info!("Permanently deleted: {} ({})", path.display(), ByteSize::b(size));
    Ok(DeleteResult {
        path: path.to_path_buf(),
        size,
        permanent: true,
    })
}

/// Delete every non-keeper member of every group.
///
/// Never aborts: each failure is recorded in the returned batch result.
pub fn delete_duplicates<C: DeleteProgressCallback>(
    groups: &[DuplicateGroup],
    config: &DeleteConfig,
    callback: Option<&C>,
) -> BatchDeleteResult {
    let mut result = BatchDeleteResult::default();
    let total: usize = groups.iter().map(DuplicateGroup::duplicate_count).sum();
    let mut index = 0;

    for group in groups {
        let Some(keeper) = group.keeper() else {
            continue;
        };
        let keeper_present = fs::symlink_metadata(keeper).is_ok();
        let keeper_resolved = fs::canonicalize(keeper).ok();

        for path in group.duplicates() {
            if let Some(cb) = callback {
                cb.on_before_delete(path, index, total);
            }
            index += 1;

            let outcome = if !keeper_present {
                Err(DeleteError::KeeperMissing {
                    keeper: keeper.to_path_buf(),
                    path: path.clone(),
                })
            } else if keeper_resolved.is_some() && fs::canonicalize(path).ok() == keeper_resolved {
                Err(DeleteError::SameFileAsKeeper {
                    keeper: keeper.to_path_buf(),
                    path: path.clone(),
                })
            } else if config.permanent {
                permanent_delete(path)
            } else {
                delete_to_trash(path)
            };

            match outcome {
                Ok(deleted) => {
                    result.bytes_freed += deleted.size;
                    if let Some(cb) = callback {
                        cb.on_delete_success(path, deleted.size);
                    }
                    result.successes.push(deleted);
                }
                Err(e) => {
                    log::warn!("Not deleted: {}", e);
                    if let Some(cb) = callback {
                        cb.on_delete_failure(path, &e);
                    }
                    result.failures.push(e);
                }
            }
        }
    }

    log::info!("{}", result.summary());
    result
}
