use dupefinder::config::ScanConfig;
use dupefinder::duplicates::DuplicateFinder;
use dupefinder::scanner::ScanError;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    File::create(path).unwrap().write_all(content).unwrap();
}

#[test]
fn test_scan_two_non_overlapping_directories() {
    let dir1 = tempdir().unwrap();
    let dir2 = tempdir().unwrap();
    write(&dir1.path().join("a.png"), b"dup");
    write(&dir2.path().join("b.png"), b"dup");

    let config = ScanConfig::new(
        vec![dir1.path().to_path_buf(), dir2.path().to_path_buf()],
        [".png"],
    )
    .unwrap();
    let report = DuplicateFinder::new(&config).find_duplicates().unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 2);
    assert_eq!(report.summary.files_enumerated, 2);
}

#[test]
fn test_scan_overlapping_directories_counts_each_file_once() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    write(&dir.path().join("a.png"), b"content");
    write(&sub.join("b.png"), b"content");

    let config = ScanConfig::new(vec![dir.path().to_path_buf(), sub.clone()], [".png"]).unwrap();
    let report = DuplicateFinder::new(&config).find_duplicates().unwrap();

    assert_eq!(report.summary.files_enumerated, 2);
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 2);
}

#[test]
fn test_same_root_listed_twice() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.png"), b"one");
    write(&dir.path().join("b.png"), b"two");

    let config = ScanConfig::new(
        vec![dir.path().to_path_buf(), dir.path().join(".")],
        [".png"],
    )
    .unwrap();
    let report = DuplicateFinder::new(&config).find_duplicates().unwrap();

    assert!(report.groups.is_empty());
    assert_eq!(report.summary.files_hashed, 2);
}

#[test]
fn test_file_given_as_root_is_skipped_with_warning() {
    let dir = tempdir().unwrap();
    let file_root = dir.path().join("not-a-dir.png");
    write(&file_root, b"x");
    let real = dir.path().join("real");
    fs::create_dir(&real).unwrap();
    write(&real.join("a.png"), b"dup");
    write(&real.join("b.png"), b"dup");

    let config = ScanConfig::new(vec![file_root, real], [".png"]).unwrap();
    let report = DuplicateFinder::new(&config).find_duplicates().unwrap();

    assert_eq!(report.groups.len(), 1);
    assert!(matches!(
        report.summary.scan_errors[0],
        ScanError::NotADirectory(_)
    ));
}

#[test]
fn test_duplicates_across_many_roots() {
    let roots: Vec<_> = (0..4).map(|_| tempdir().unwrap()).collect();
    for (i, root) in roots.iter().enumerate() {
        write(&root.path().join(format!("copy{i}.png")), b"shared");
        write(&root.path().join(format!("own{i}.png")), format!("own {i}").as_bytes());
    }

    let config = ScanConfig::new(
        roots.iter().map(|r| r.path().to_path_buf()).collect(),
        [".png"],
    )
    .unwrap()
    .with_workers(Some(2));
    let report = DuplicateFinder::new(&config).find_duplicates().unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 4);
    assert_eq!(report.summary.files_hashed, 8);
}
