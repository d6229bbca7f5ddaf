use dupefinder::config::ScanConfig;
use dupefinder::duplicates::{DuplicateFinder, FinderError};
use dupefinder::progress::{ProgressCallback, PHASE_HASHING};
use dupefinder::scanner::{FileHasher, HashError, HashResult, Hasher, ScanError};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    File::create(path).unwrap().write_all(content).unwrap();
}

/// Fails every file whose name contains "locked", hashes the rest for real.
struct LockedFileHasher {
    inner: Hasher,
}

impl FileHasher for LockedFileHasher {
    fn hash_file(&self, path: &Path) -> HashResult {
        if path.to_string_lossy().contains("locked") {
            HashResult::failure(
                path.to_path_buf(),
                HashError::PermissionDenied(path.to_path_buf()),
            )
        } else {
            self.inner.hash_file(path)
        }
    }
}

/// Requests shutdown once `after` files have been hashed.
struct StopAfter {
    flag: Arc<AtomicBool>,
    after: usize,
    hashing: AtomicBool,
}

impl ProgressCallback for StopAfter {
    fn on_phase_start(&self, phase: &str, _total: usize) {
        self.hashing.store(phase == PHASE_HASHING, Ordering::SeqCst);
    }

    fn on_progress(&self, current: usize, _path: &str) {
        if self.hashing.load(Ordering::SeqCst) && current >= self.after {
            self.flag.store(true, Ordering::SeqCst);
        }
    }

    fn on_phase_end(&self, _phase: &str) {}
}

#[test]
fn test_unreadable_file_is_reported_and_scan_continues() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.png"), b"same");
    write(&dir.path().join("b.png"), b"same");
    write(&dir.path().join("locked.png"), b"same");

    let config = ScanConfig::new(vec![dir.path().to_path_buf()], [".png"])
        .unwrap()
        .with_workers(Some(2));
    let report = DuplicateFinder::new(&config)
        .with_hasher(Arc::new(LockedFileHasher {
            inner: Hasher::new(),
        }))
        .find_duplicates()
        .unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 2);
    assert!(report.groups[0]
        .files
        .iter()
        .all(|p| !p.to_string_lossy().contains("locked")));

    assert_eq!(report.summary.files_accepted, 3);
    assert_eq!(report.summary.files_hashed, 2);
    assert_eq!(report.summary.hash_failures.len(), 1);
    assert!(matches!(
        report.summary.hash_failures[0],
        HashError::PermissionDenied(_)
    ));
    assert_eq!(
        report.summary.hash_failures[0].reason_code(),
        "permission_denied"
    );
    assert!(report.summary.is_partial());
}

#[test]
fn test_hashed_plus_failed_equals_accepted() {
    let dir = tempdir().unwrap();
    for i in 0..10 {
        write(&dir.path().join(format!("ok{i}.png")), b"data");
    }
    for i in 0..4 {
        write(&dir.path().join(format!("locked{i}.png")), b"data");
    }

    let config = ScanConfig::new(vec![dir.path().to_path_buf()], [".png"])
        .unwrap()
        .with_workers(Some(3));
    let report = DuplicateFinder::new(&config)
        .with_hasher(Arc::new(LockedFileHasher {
            inner: Hasher::new(),
        }))
        .find_duplicates()
        .unwrap();

    let summary = &report.summary;
    assert_eq!(
        summary.files_hashed + summary.hash_failures.len(),
        summary.files_accepted
    );
    assert_eq!(summary.hash_failures.len(), 4);
    assert_eq!(report.groups[0].len(), 10);
}

#[test]
fn test_vanished_file_is_not_found() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.png");
    let b = dir.path().join("b.png");
    write(&a, b"dup");
    write(&b, b"dup");

    let config = ScanConfig::new(vec![dir.path().to_path_buf()], [".png"]).unwrap();
    let report = DuplicateFinder::new(&config)
        .find_duplicates_in(vec![a.clone(), b, dir.path().join("gone.png")])
        .unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.summary.hash_failures.len(), 1);
    assert!(matches!(
        report.summary.hash_failures[0],
        HashError::NotFound(_)
    ));
}

#[cfg(unix)]
#[test]
fn test_permission_denied_file_on_disk() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let locked = dir.path().join("secret.png");
    write(&dir.path().join("a.png"), b"same");
    write(&dir.path().join("b.png"), b"same");
    write(&locked, b"same");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can still read the file; nothing to check then.
    if File::open(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
        return;
    }

    let config = ScanConfig::new(vec![dir.path().to_path_buf()], [".png"]).unwrap();
    let report = DuplicateFinder::new(&config).find_duplicates().unwrap();

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 2);
    assert_eq!(report.summary.hash_failures.len(), 1);
    assert_eq!(
        report.summary.hash_failures[0].reason_code(),
        "permission_denied"
    );
}

#[test]
fn test_missing_only_root_is_fatal() {
    let dir = tempdir().unwrap();
    let config =
        ScanConfig::new(vec![dir.path().join("does-not-exist")], [".png"]).unwrap();

    let result = DuplicateFinder::new(&config).find_duplicates();

    assert!(matches!(result, Err(FinderError::NoReadableRoots)));
}

#[test]
fn test_missing_root_alongside_valid_root_is_a_warning() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.png"), b"dup");
    write(&dir.path().join("b.png"), b"dup");
    let missing = dir.path().join("missing");

    let config = ScanConfig::new(vec![missing, dir.path().to_path_buf()], [".png"]).unwrap();
    let report = DuplicateFinder::new(&config).find_duplicates().unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.summary.scan_errors.len(), 1);
    assert!(matches!(
        report.summary.scan_errors[0],
        ScanError::NotFound(_)
    ));
    assert!(report.summary.is_partial());
}

#[test]
fn test_interrupt_stops_dispatch_and_keeps_partial_results() {
    let dir = tempdir().unwrap();
    let total = 50;
    for i in 0..total {
        write(&dir.path().join(format!("f{i:02}.png")), b"identical");
    }

    let flag = Arc::new(AtomicBool::new(false));
    let callback = Arc::new(StopAfter {
        flag: Arc::clone(&flag),
        after: 5,
        hashing: AtomicBool::new(false),
    });

    let config = ScanConfig::new(vec![dir.path().to_path_buf()], [".png"])
        .unwrap()
        .with_workers(Some(1));
    let report = DuplicateFinder::new(&config)
        .with_shutdown_flag(Arc::clone(&flag))
        .with_progress_callback(callback)
        .find_duplicates()
        .unwrap();

    let summary = &report.summary;
    assert!(summary.interrupted);
    assert_eq!(summary.files_accepted, total);
    assert!(summary.files_hashed >= 5);
    assert!(summary.files_hashed < total);
    assert!(summary.dispatched < total);

    // Everything that finished before the stop is still grouped.
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), summary.files_hashed);
}

#[test]
fn test_shutdown_before_scan_yields_empty_interrupted_report() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.png"), b"dup");
    write(&dir.path().join("b.png"), b"dup");

    let flag = Arc::new(AtomicBool::new(true));
    let config = ScanConfig::new(vec![dir.path().to_path_buf()], [".png"]).unwrap();
    let report = DuplicateFinder::new(&config)
        .with_shutdown_flag(flag)
        .find_duplicates()
        .unwrap();

    assert!(report.summary.interrupted);
    assert!(report.groups.is_empty());
    assert_eq!(report.summary.dispatched, 0);
}

#[test]
fn test_failure_paths_are_kept() {
    let dir = tempdir().unwrap();
    let locked: PathBuf = dir.path().join("locked.png");
    write(&locked, b"x");

    let config = ScanConfig::new(vec![dir.path().to_path_buf()], [".png"]).unwrap();
    let report = DuplicateFinder::new(&config)
        .with_hasher(Arc::new(LockedFileHasher {
            inner: Hasher::new(),
        }))
        .find_duplicates()
        .unwrap();

    assert_eq!(
        report.summary.hash_failures[0].path(),
        locked.canonicalize().unwrap()
    );
}
