//! End-to-end duplicate detection for one scan.
//!
//! # Overview
//!
//! [`DuplicateFinder`] runs the pipeline for a validated [`ScanConfig`]:
//!
//! 1. **Phase 1 - Walking**: resolve the roots, walk them and keep the files
//!    accepted by the extension filter
//! 2. **Phase 2 - Hashing**: hash every candidate on the worker pool and
//!    group results by digest as they arrive
//!
//! Traversal warnings and per-file hash failures are collected in the
//! [`ScanSummary`]; they never abort a scan. Only configuration problems,
//! a scan with no readable root, and a failure to build the worker pool are
//! returned as [`FinderError`].
//!
//! # Example
//!
//! ```no_run
//! use dupefinder::config::ScanConfig;
//! use dupefinder::duplicates::DuplicateFinder;
//! use std::path::PathBuf;
//!
//! let config = ScanConfig::new(vec![PathBuf::from("~/Pictures")], [".jpg", ".png"])?;
//! let report = DuplicateFinder::new(&config).find_duplicates()?;
//! for group in &report.groups {
//!     println!("{}: {} copies", group.hash_hex(), group.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::coordinator::{effective_workers, HashingCoordinator};
use super::groups::{DuplicateGroup, DuplicateGrouper, DuplicateStats};
use crate::config::{ConfigError, ScanConfig};
use crate::progress::{ProgressCallback, PHASE_HASHING, PHASE_WALKING};
use crate::scanner::{resolve_root, FileHasher, HashError, Hasher, ScanError, Walker};

/// Summary statistics from a duplicate scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Regular files yielded by the walker
    pub files_enumerated: usize,
    /// Files accepted by the extension filter
    pub files_accepted: usize,
    /// Files hashed successfully
    pub files_hashed: usize,
    /// Per-file hash failures
    pub hash_failures: Vec<HashError>,
    /// Traversal warnings (bad roots, unreadable directories, loops)
    pub scan_errors: Vec<ScanError>,
    /// Effective number of hashing workers
    pub workers: usize,
    /// Effective read chunk size in bytes
    pub chunk_size: usize,
    /// Paths handed to the hashing workers
    pub dispatched: usize,
    /// Whether the scan was interrupted
    pub interrupted: bool,
    /// Duration of the entire scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Whether some files or directories could not be read.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.hash_failures.is_empty() || !self.scan_errors.is_empty()
    }
}

/// Result of one scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Duplicate groups in first-arrival order, each with 2+ members
    pub groups: Vec<DuplicateGroup>,
    /// Counters, failures and warnings
    pub summary: ScanSummary,
}

impl ScanReport {
    /// Whether any duplicates were found.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Aggregate statistics, with sizes read now.
    #[must_use]
    pub fn stats(&self) -> DuplicateStats {
        DuplicateStats::compute(&self.groups)
    }
}

/// Errors that abort a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// None of the roots is a readable directory.
    #[error("None of the search directories could be read")]
    NoReadableRoots,

    /// The hashing worker pool could not be created.
    #[error("Failed to create hashing worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Runs walking, filtering, hashing and grouping for one [`ScanConfig`].
pub struct DuplicateFinder<'a> {
    config: &'a ScanConfig,
    hasher: Arc<dyn FileHasher>,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for DuplicateFinder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateFinder")
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish_non_exhaustive()
    }
}

impl<'a> DuplicateFinder<'a> {
    /// Create a finder using the BLAKE3 [`Hasher`] at the configured chunk size.
    #[must_use]
    pub fn new(config: &'a ScanConfig) -> Self {
        Self {
            config,
            hasher: Arc::new(Hasher::new().with_chunk_size(config.chunk_size())),
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Replace the file hasher.
    #[must_use]
    pub fn with_hasher(mut self, hasher: Arc<dyn FileHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the configured roots and find duplicates among accepted files.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::NoReadableRoots`] if no root can be read, or
    /// [`FinderError::ThreadPool`] if the worker pool cannot be built.
    pub fn find_duplicates(&self) -> Result<ScanReport, FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary {
            chunk_size: self.config.chunk_size(),
            ..ScanSummary::default()
        };

        let roots = self.readable_roots(&mut summary.scan_errors);
        if roots.is_empty() {
            log::error!("No readable search directories");
            return Err(FinderError::NoReadableRoots);
        }

        log::info!("Phase 1: Walking {} directories...", roots.len());
        let candidates = self.collect_candidates(roots, &mut summary);
        log::info!(
            "Phase 1 complete: {} files found, {} match the allowed extensions, {} warnings",
            summary.files_enumerated,
            summary.files_accepted,
            summary.scan_errors.len()
        );

        let groups = if self.is_shutdown_requested() {
            log::info!("Phase 1: Interrupted by shutdown signal");
            summary.interrupted = true;
            Vec::new()
        } else {
            self.hash_candidates(candidates, &mut summary)?
        };

        summary.scan_duration = start_time.elapsed();
        Ok(ScanReport { groups, summary })
    }

    /// Hash an explicit list of files, skipping walking and filtering.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::ThreadPool`] if the worker pool cannot be built.
    pub fn find_duplicates_in(&self, paths: Vec<PathBuf>) -> Result<ScanReport, FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary {
            files_enumerated: paths.len(),
            files_accepted: paths.len(),
            chunk_size: self.config.chunk_size(),
            ..ScanSummary::default()
        };

        let groups = self.hash_candidates(paths, &mut summary)?;
        summary.scan_duration = start_time.elapsed();
        Ok(ScanReport { groups, summary })
    }

    /// Resolve every root, keeping those that are readable directories.
    fn readable_roots(&self, warnings: &mut Vec<ScanError>) -> Vec<PathBuf> {
        let mut roots = Vec::new();
        for raw in self.config.roots() {
            let checked = resolve_root(raw).and_then(|root| {
                fs::read_dir(&root)
                    .map(|_| root.clone())
                    .map_err(|e| ScanError::from_io(&root, e))
            });
            match checked {
                Ok(root) => roots.push(root),
                Err(e) => {
                    log::warn!("Skipping search directory {}: {}", raw.display(), e);
                    warnings.push(e);
                }
            }
        }
        roots
    }

    /// Phase 1: walk and filter.
    fn collect_candidates(&self, roots: Vec<PathBuf>, summary: &mut ScanSummary) -> Vec<PathBuf> {
        let mut walker = Walker::new(roots).with_follow_symlinks(self.config.follow_symlinks());
        if let Some(ref flag) = self.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }
        if let Some(ref callback) = self.progress_callback {
            walker = walker.with_progress_callback(Arc::clone(callback));
            callback.on_phase_start(PHASE_WALKING, 0);
        }

        let filter = self.config.filter();
        let mut candidates = Vec::new();
        for entry in walker.walk() {
            match entry {
                Ok(path) => {
                    summary.files_enumerated += 1;
                    if filter.accepts(&path) {
                        candidates.push(path);
                    }
                }
                Err(e) => summary.scan_errors.push(e),
            }
        }
        summary.files_accepted = candidates.len();

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end(PHASE_WALKING);
        }
        candidates
    }

    /// Phase 2: hash on the worker pool and group by digest.
    fn hash_candidates(
        &self,
        candidates: Vec<PathBuf>,
        summary: &mut ScanSummary,
    ) -> Result<Vec<DuplicateGroup>, FinderError> {
        let workers = effective_workers(self.config.workers(), self.config.max_workers());
        summary.workers = workers;

        log::info!(
            "Phase 2: Hashing {} files with {} workers ({} byte chunks)",
            candidates.len(),
            workers,
            self.config.chunk_size()
        );

        let mut coordinator = HashingCoordinator::new(Arc::clone(&self.hasher), workers);
        if let Some(ref flag) = self.shutdown_flag {
            coordinator = coordinator.with_shutdown_flag(Arc::clone(flag));
        }
        if let Some(ref callback) = self.progress_callback {
            coordinator = coordinator.with_progress_callback(Arc::clone(callback));
            callback.on_phase_start(PHASE_HASHING, candidates.len());
        }

        let mut grouper = DuplicateGrouper::new();
        let run = coordinator.run(candidates, |result| grouper.push(result));

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end(PHASE_HASHING);
        }
        let report = run?;

        let grouping = grouper.finish();
        summary.dispatched = report.dispatched;
        summary.files_hashed = grouping.hashed;
        summary.hash_failures = grouping.failures;
        summary.interrupted |= report.interrupted;

        if report.interrupted {
            log::info!(
                "Phase 2: Interrupted by shutdown signal after {} of {} files",
                report.completed,
                summary.files_accepted
            );
        }
        log::info!(
            "Phase 2 complete: {} hashed, {} failed, {} duplicate groups",
            summary.files_hashed,
            summary.hash_failures.len(),
            grouping.groups.len()
        );

        Ok(grouping.groups)
    }
}
