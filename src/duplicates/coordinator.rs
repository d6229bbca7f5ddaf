//! Bounded-parallel hashing of candidate files.
//!
//! # Overview
//!
//! [`HashingCoordinator`] fans hashing work out to a fixed-size rayon pool
//! and fans the results back in on the calling thread:
//!
//! ```text
//!   feeder thread ──job queue (bounded)──▶ N pool workers ──result queue (bounded)──▶ caller
//! ```
//!
//! - The feeder pushes one path per unit of work and stops at the next step
//!   once shutdown is requested.
//! - Each worker pulls a path, hashes it, and pushes the result. A panic in
//!   the hasher is caught and turned into a [`HashError::WorkerPanicked`]
//!   result for that path only.
//! - The caller receives results in completion order and hands each to a
//!   sink. [`HashingCoordinator::run`] returns only after every worker has
//!   left its loop.

use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};

use super::FinderError;
use crate::progress::ProgressCallback;
use crate::scanner::{FileHasher, HashError, HashResult};

/// Hardware parallelism, falling back to 1 when it cannot be determined.
#[must_use]
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Clamp a requested worker count to `[1, available parallelism]`, and to
/// `max` when given.
///
/// `None` requests the available parallelism. Every correction of an
/// explicit request is logged as a warning.
#[must_use]
pub fn effective_workers(requested: Option<i64>, max: Option<usize>) -> usize {
    clamp_workers(requested, max, available_parallelism())
}

fn clamp_workers(requested: Option<i64>, max: Option<usize>, hardware: usize) -> usize {
    let hardware = hardware.max(1);
    let mut workers = match requested {
        None => hardware,
        Some(n) if n < 1 => {
            log::warn!("Requested {} workers; using 1", n);
            1
        }
        Some(n) => {
            let n = usize::try_from(n).unwrap_or(usize::MAX);
            if n > hardware {
                log::warn!(
                    "Requested {} workers but only {} CPUs are available; using {}",
                    n,
                    hardware,
                    hardware
                );
                hardware
            } else {
                n
            }
        }
    };

    if let Some(max) = max {
        let max = max.max(1);
        if workers > max {
            if requested.is_some() {
                log::warn!("Worker count {} exceeds max_workers; using {}", workers, max);
            } else {
                log::debug!("Capping default worker count {} at max_workers {}", workers, max);
            }
            workers = max;
        }
    }

    workers
}

/// Outcome of one coordinator run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorReport {
    /// Number of pool workers used
    pub workers: usize,
    /// Paths handed to the job queue
    pub dispatched: usize,
    /// Results delivered to the sink
    pub completed: usize,
    /// Whether shutdown was requested during the run
    pub interrupted: bool,
}

/// Dispatches hashing work across a bounded worker pool.
pub struct HashingCoordinator {
    hasher: Arc<dyn FileHasher>,
    workers: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for HashingCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashingCoordinator")
            .field("workers", &self.workers)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish_non_exhaustive()
    }
}

impl HashingCoordinator {
    /// Create a coordinator running exactly `workers` workers (at least 1).
    ///
    /// Use [`effective_workers`] to turn a user request into a worker count.
    #[must_use]
    pub fn new(hasher: Arc<dyn FileHasher>, workers: usize) -> Self {
        Self {
            hasher,
            workers: workers.max(1),
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback, notified once per delivered result.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Number of workers this coordinator runs.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    fn is_shutdown_requested(&self) -> bool {
        is_set(self.shutdown_flag.as_ref())
    }

    /// Hash every path, delivering each result to `sink` as it completes.
    ///
    /// Dispatch stops early when shutdown is requested; the report then has
    /// `interrupted` set and `completed` counts only the results delivered.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::ThreadPool`] if the worker pool cannot be built.
    /// Per-file failures never produce an error here.
    pub fn run<I, F>(&self, paths: I, mut sink: F) -> Result<CoordinatorReport, FinderError>
    where
        I: IntoIterator<Item = PathBuf>,
        I::IntoIter: Send,
        F: FnMut(HashResult),
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("dupefinder-hash-{i}"))
            .build()?;

        let (job_tx, job_rx) = bounded::<PathBuf>(self.workers);
        let (result_tx, result_rx) = bounded::<HashResult>(self.workers);

        for _ in 0..self.workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let hasher = Arc::clone(&self.hasher);
            let shutdown = self.shutdown_flag.clone();
            pool.spawn(move || worker_loop(hasher.as_ref(), &job_rx, &result_tx, shutdown.as_ref()));
        }
        drop(job_rx);
        drop(result_tx);

        let dispatched = AtomicUsize::new(0);
        let mut completed = 0usize;

        std::thread::scope(|scope| {
            let shutdown = self.shutdown_flag.clone();
            let dispatched = &dispatched;
            let paths = paths.into_iter();
            let feeder = scope.spawn(move || feed(paths, job_tx, shutdown.as_ref(), dispatched));

            for result in result_rx.iter() {
                completed += 1;
                if let Some(ref callback) = self.progress_callback {
                    callback.on_progress(completed, result.path.to_string_lossy().as_ref());
                }
                sink(result);
            }

            if feeder.join().is_err() {
                log::error!("Dispatch thread panicked; results so far are kept");
            }
        });

        let report = CoordinatorReport {
            workers: self.workers,
            dispatched: dispatched.load(Ordering::SeqCst),
            completed,
            interrupted: self.is_shutdown_requested(),
        };
        log::debug!("Hashing coordinator finished: {:?}", report);
        Ok(report)
    }
}

fn is_set(flag: Option<&Arc<AtomicBool>>) -> bool {
    flag.is_some_and(|f| f.load(Ordering::SeqCst))
}

/// Push paths into the job queue until exhausted or shut down.
fn feed<I: Iterator<Item = PathBuf>>(
    paths: I,
    job_tx: Sender<PathBuf>,
    shutdown: Option<&Arc<AtomicBool>>,
    dispatched: &AtomicUsize,
) {
    for path in paths {
        if is_set(shutdown) {
            log::debug!("Shutdown requested, stopping dispatch");
            break;
        }
        if job_tx.send(path).is_err() {
            break;
        }
        dispatched.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hash queued paths until the job queue closes.
fn worker_loop(
    hasher: &dyn FileHasher,
    job_rx: &Receiver<PathBuf>,
    result_tx: &Sender<HashResult>,
    shutdown: Option<&Arc<AtomicBool>>,
) {
    for path in job_rx.iter() {
        if is_set(shutdown) {
            log::trace!("Skipping {} after shutdown", path.display());
            continue;
        }

        let result = match panic::catch_unwind(AssertUnwindSafe(|| hasher.hash_file(&path))) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("Worker panicked while hashing {}: {}", path.display(), message);
                HashResult::failure(path.clone(), HashError::WorkerPanicked { path, message })
            }
        };

        if let Err(ref error) = result.outcome {
            log::warn!("Hash failed ({}): {}", error.reason_code(), error);
        }

        if result_tx.send(result).is_err() {
            break;
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
