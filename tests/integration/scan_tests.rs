use dupefinder::config::ScanConfig;
use dupefinder::duplicates::{DuplicateFinder, ScanReport};
use dupefinder::scanner::{hash_to_hex, Hasher};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    File::create(path).unwrap().write_all(content).unwrap();
}

fn scan(roots: Vec<PathBuf>, extensions: &[&str]) -> ScanReport {
    let config = ScanConfig::new(roots, extensions.iter().copied())
        .unwrap()
        .with_workers(Some(1));
    DuplicateFinder::new(&config).find_duplicates().unwrap()
}

fn sorted_groups(report: &ScanReport) -> Vec<Vec<PathBuf>> {
    let mut groups: Vec<Vec<PathBuf>> = report
        .groups
        .iter()
        .map(|g| {
            let mut files = g.files.clone();
            files.sort();
            files
        })
        .collect();
    groups.sort();
    groups
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();

    let report = scan(vec![dir.path().to_path_buf()], &[".png"]);

    assert!(report.groups.is_empty());
    assert!(!report.has_duplicates());
    assert_eq!(report.summary.files_enumerated, 0);
    assert_eq!(report.summary.files_hashed, 0);
    assert!(!report.summary.is_partial());
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.png"), b"content a");
    write(&dir.path().join("b.png"), b"content b");
    write(&dir.path().join("c.png"), b"content c");

    let report = scan(vec![dir.path().to_path_buf()], &[".png"]);

    assert!(report.groups.is_empty());
    assert_eq!(report.summary.files_hashed, 3);
}

#[test]
fn test_scan_finds_one_group_with_digest() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.png");
    let b = dir.path().join("b.png");
    write(&a, b"hello");
    write(&b, b"hello");
    write(&dir.path().join("c.png"), b"world");

    let report = scan(vec![dir.path().to_path_buf()], &[".png"]);

    assert_eq!(report.groups.len(), 1);
    let group = &report.groups[0];
    assert_eq!(group.len(), 2);
    assert_eq!(
        group.hash_hex(),
        hash_to_hex(&Hasher::new().hash_reader(&b"hello"[..]).unwrap())
    );

    let mut files = group.files.clone();
    files.sort();
    assert_eq!(
        files,
        vec![a.canonicalize().unwrap(), b.canonicalize().unwrap()]
    );

    let stats = report.stats();
    assert_eq!(stats.group_count, 1);
    assert_eq!(stats.duplicate_files, 2);
    assert_eq!(stats.removable_files, 1);
    assert_eq!(stats.reclaimable_bytes, 5);
}

#[test]
fn test_scan_ignores_disallowed_extensions() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.png"), b"same");
    write(&dir.path().join("b.txt"), b"same");
    write(&dir.path().join("c"), b"same");

    let report = scan(vec![dir.path().to_path_buf()], &[".png"]);

    assert!(report.groups.is_empty());
    assert_eq!(report.summary.files_enumerated, 3);
    assert_eq!(report.summary.files_accepted, 1);
    assert_eq!(report.summary.files_hashed, 1);
}

#[test]
fn test_scan_extension_match_is_case_insensitive() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.PNG"), b"same");
    write(&dir.path().join("b.png"), b"same");
    write(&dir.path().join("c.Jpg"), b"same");

    let report = scan(vec![dir.path().to_path_buf()], &["png", ".JPG"]);

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 3);
}

#[test]
fn test_scan_nested_and_hidden_files() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("subdir").join("deeper");
    let hidden_dir = dir.path().join(".cache");
    fs::create_dir_all(&sub).unwrap();
    fs::create_dir_all(&hidden_dir).unwrap();

    write(&dir.path().join("top.png"), b"nested content");
    write(&sub.join("deep.png"), b"nested content");
    write(&hidden_dir.join(".hidden.png"), b"nested content");

    let report = scan(vec![dir.path().to_path_buf()], &[".png"]);

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 3);
}

#[test]
fn test_scan_empty_files_form_a_group() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("empty1.png")).unwrap();
    File::create(dir.path().join("empty2.png")).unwrap();

    let report = scan(vec![dir.path().to_path_buf()], &[".png"]);

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.stats().reclaimable_bytes, 0);
}

#[test]
fn test_scan_multiple_groups() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a1.png"), b"group a");
    write(&dir.path().join("a2.png"), b"group a");
    write(&dir.path().join("b1.png"), b"group b");
    write(&dir.path().join("b2.png"), b"group b");
    write(&dir.path().join("b3.png"), b"group b");
    write(&dir.path().join("lonely.png"), b"single");

    let report = scan(vec![dir.path().to_path_buf()], &[".png"]);

    let mut sizes: Vec<usize> = report.groups.iter().map(|g| g.len()).collect();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![2, 3]);
    assert!(report.groups.iter().all(|g| g.len() >= 2));
    assert_eq!(report.stats().removable_files, 3);
}

#[test]
fn test_scan_is_idempotent() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.png"), b"x");
    write(&dir.path().join("b.png"), b"x");
    write(&dir.path().join("c.png"), b"y");
    write(&dir.path().join("d.png"), b"y");

    let first = scan(vec![dir.path().to_path_buf()], &[".png"]);
    let second = scan(vec![dir.path().to_path_buf()], &[".png"]);

    assert_eq!(sorted_groups(&first), sorted_groups(&second));
}

#[test]
fn test_scan_result_independent_of_workers_and_chunk_size() {
    let dir = tempdir().unwrap();
    let big = vec![7u8; 100_000];
    for i in 0..6 {
        write(&dir.path().join(format!("big{i}.png")), &big);
        write(&dir.path().join(format!("unique{i}.png")), format!("u{i}").as_bytes());
    }

    let baseline = scan(vec![dir.path().to_path_buf()], &[".png"]);

    let config = ScanConfig::new(vec![dir.path().to_path_buf()], [".png"])
        .unwrap()
        .with_workers(Some(4))
        .with_chunk_size(4096);
    let parallel = DuplicateFinder::new(&config).find_duplicates().unwrap();

    assert_eq!(sorted_groups(&baseline), sorted_groups(&parallel));
    assert_eq!(parallel.groups.len(), 1);
    assert_eq!(parallel.groups[0].len(), 6);
}

#[test]
fn test_single_worker_keeps_walk_order() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.png"), b"dup");
    write(&dir.path().join("b.png"), b"dup");
    write(&dir.path().join("c.png"), b"dup");

    let report = scan(vec![dir.path().to_path_buf()], &[".png"]);

    let group = &report.groups[0];
    assert_eq!(
        group.keeper().unwrap(),
        dir.path().join("a.png").canonicalize().unwrap()
    );
    assert_eq!(group.duplicate_count(), 2);
}

#[test]
fn test_summary_reports_effective_settings() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.png"), b"x");

    let config = ScanConfig::new(vec![dir.path().to_path_buf()], [".png"])
        .unwrap()
        .with_workers(Some(-3))
        .with_chunk_size(1);
    let report = DuplicateFinder::new(&config).find_duplicates().unwrap();

    assert_eq!(report.summary.workers, 1);
    assert_eq!(report.summary.chunk_size, 4096);
    assert_eq!(report.summary.dispatched, 1);
    assert!(!report.summary.interrupted);
}
