//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! [`Walker`] resolves a set of root directories and lazily yields the
//! path of every regular file reachable below them. Problems with a single
//! root or entry are yielded as [`ScanError`] values instead of stopping
//! iteration, so one unreadable directory never aborts a scan.
//!
//! # Features
//!
//! - `~` expansion and canonicalization of every root
//! - Parallel directory reading via jwalk, children sorted by name
//! - Each resolved file path is yielded at most once per walk, even when
//!   roots overlap or followed symlinks lead back into visited trees
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use dupefinder::scanner::Walker;
//! use std::path::PathBuf;
//!
//! let walker = Walker::new(vec![PathBuf::from("/home/user/Downloads")]);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(path) => println!("{}", path.display()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use directories::BaseDirs;
use jwalk::WalkDir;

use super::ScanError;
use crate::progress::ProgressCallback;

type EntryIter = Box<dyn Iterator<Item = Result<jwalk::DirEntry<((), ())>, jwalk::Error>> + Send>;

/// Directory walker over one or more root directories.
pub struct Walker {
    /// Root paths as given by the caller (unresolved)
    roots: Vec<PathBuf>,
    /// Follow symbolic links during traversal
    follow_symlinks: bool,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("roots", &self.roots)
            .field("follow_symlinks", &self.follow_symlinks)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Walker {
    /// Create a new walker for the given roots.
    ///
    /// Roots are resolved lazily when [`Walker::walk`] is called.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            follow_symlinks: false,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Follow symbolic links. Followed files are yielded under their
    /// resolved path.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback, notified for every yielded file.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk every root, yielding regular file paths.
    ///
    /// Returns an iterator over file paths. Errors are yielded as
    /// [`ScanError`] values rather than stopping iteration.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            walker: self,
            pending_roots: self.roots.clone().into_iter(),
            current: None,
            walked_roots: Vec::new(),
            seen_files: HashSet::new(),
            yielded: 0,
        }
    }

    fn open_root(&self, root: &Path) -> EntryIter {
        let walk_dir = WalkDir::new(root)
            .follow_links(self.follow_symlinks)
            .skip_hidden(false)
            .sort(true);
        Box::new(walk_dir.into_iter())
    }
}

/// Lazy iterator returned by [`Walker::walk`].
pub struct Walk<'a> {
    walker: &'a Walker,
    pending_roots: std::vec::IntoIter<PathBuf>,
    current: Option<EntryIter>,
    walked_roots: Vec<PathBuf>,
    seen_files: HashSet<PathBuf>,
    yielded: usize,
}

impl Walk<'_> {
    /// Resolve the next root and start walking it.
    ///
    /// Returns `Some(Err)` for a root that cannot be walked, `Some(Ok)` when
    /// a new walk was started, `None` when there are no roots left.
    fn advance_root(&mut self) -> Option<Result<(), ScanError>> {
        for raw in self.pending_roots.by_ref() {
            let root = match resolve_root(&raw) {
                Ok(root) => root,
                Err(e) => {
                    log::warn!("Skipping root {}: {}", raw.display(), e);
                    return Some(Err(e));
                }
            };

            if self.walked_roots.iter().any(|r| r == &root) {
                log::debug!("Root {} already walked, skipping", root.display());
                continue;
            }

            log::info!("Walking {}", root.display());
            self.current = Some(self.walker.open_root(&root));
            self.walked_roots.push(root);
            return Some(Ok(()));
        }
        None
    }

    /// Turn one jwalk entry into a file path, a warning, or nothing.
    fn process_entry(
        &mut self,
        entry: Result<jwalk::DirEntry<((), ())>, jwalk::Error>,
    ) -> Option<Result<PathBuf, ScanError>> {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => return Some(Err(convert_jwalk_error(e))),
        };

        if entry.depth == 0 {
            return None;
        }

        let file_type = entry.file_type();
        if file_type.is_dir() {
            return None;
        }

        let path = entry.path();
        let is_symlink = entry.path_is_symlink() || file_type.is_symlink();

        if is_symlink && !self.walker.follow_symlinks {
            log::trace!("Skipping symlink: {}", path.display());
            return None;
        }

        // With links followed, a file below a linked directory is reached
        // under the link's path; resolve it so every inode path is unique.
        let path = if self.walker.follow_symlinks {
            match fs::canonicalize(&path) {
                Ok(resolved) => resolved,
                Err(e) => {
                    log::debug!("Skipping unresolvable path {}: {}", path.display(), e);
                    return None;
                }
            }
        } else {
            path
        };

        if !is_symlink && !file_type.is_file() {
            log::trace!("Skipping special file: {}", path.display());
            return None;
        }

        if !self.seen_files.insert(path.clone()) {
            log::trace!("Already visited: {}", path.display());
            return None;
        }

        Some(Ok(path))
    }
}

impl Iterator for Walk<'_> {
    type Item = Result<PathBuf, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.walker.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                return None;
            }

            let Some(current) = self.current.as_mut() else {
                match self.advance_root()? {
                    Ok(()) => continue,
                    Err(e) => return Some(Err(e)),
                }
            };

            let Some(entry) = current.next() else {
                self.current = None;
                continue;
            };

            match self.process_entry(entry) {
                Some(Ok(path)) => {
                    self.yielded += 1;
                    if let Some(ref callback) = self.walker.progress_callback {
                        callback.on_progress(self.yielded, path.to_string_lossy().as_ref());
                    }
                    return Some(Ok(path));
                }
                Some(Err(e)) => return Some(Err(e)),
                None => continue,
            }
        }
    }
}

/// Resolve a root directory: expand `~`, make absolute, canonicalize.
///
/// # Errors
///
/// Returns [`ScanError::NotFound`] / [`ScanError::PermissionDenied`] if the
/// root cannot be resolved and [`ScanError::NotADirectory`] if it is not a
/// directory.
pub fn resolve_root(path: &Path) -> Result<PathBuf, ScanError> {
    let expanded = expand_home(path);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()
            .map_err(|e| ScanError::from_io(path, e))?
            .join(expanded)
    };

    let canonical = fs::canonicalize(&absolute).map_err(|e| ScanError::from_io(&absolute, e))?;
    if !canonical.is_dir() {
        return Err(ScanError::NotADirectory(canonical));
    }
    Ok(canonical)
}

/// Replace a leading `~` component with the user's home directory.
fn expand_home(path: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == OsStr::new("~") => match BaseDirs::new() {
            Some(dirs) => dirs.home_dir().join(components.as_path()),
            None => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}

/// Convert a jwalk error into a classified scan warning.
fn convert_jwalk_error(error: jwalk::Error) -> ScanError {
    let path = error.path().map(Path::to_path_buf).unwrap_or_default();

    if error.loop_ancestor().is_some() {
        log::warn!("Symlink loop at {}", path.display());
        return ScanError::SymlinkLoop(path);
    }

    let message = error.to_string();
    let scan_error = match error.into_io_error() {
        Some(io_error) => ScanError::from_io(&path, io_error),
        None => ScanError::Io {
            path,
            source: std::io::Error::other(message),
        },
    };
    log::warn!("Walker error: {}", scan_error);
    scan_error
}
