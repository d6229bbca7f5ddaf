use chrono::{Local, TimeZone};
use clap::Parser;
use dupefinder::cli::Cli;
use dupefinder::config::ScanConfig;
use dupefinder::duplicates::{DuplicateFinder, ScanReport};
use dupefinder::error::ExitCode;
use dupefinder::output::{write_report, ReportFormat};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn scan_with_duplicates(dir: &Path) -> ScanReport {
    fs::write(dir.join("a.png"), b"hello").unwrap();
    fs::write(dir.join("b.png"), b"hello").unwrap();
    fs::write(dir.join("c.png"), b"world").unwrap();

    let config = ScanConfig::new(vec![dir.to_path_buf()], [".png"])
        .unwrap()
        .with_workers(Some(1));
    DuplicateFinder::new(&config).find_duplicates().unwrap()
}

#[test]
fn test_csv_report_contents() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    let report = scan_with_duplicates(data.path());
    let now = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

    let path = write_report(&report, ReportFormat::Csv, out.path(), now)
        .unwrap()
        .unwrap();

    assert_eq!(
        path.file_name().unwrap(),
        "duplicates_report_2024_01_02__03_04_05.csv"
    );

    let mut reader = csv::Reader::from_path(&path).unwrap();
    assert_eq!(
        reader.headers().unwrap().iter().collect::<Vec<_>>(),
        vec!["digest", "path", "size_bytes"]
    );
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 2);
    let digest = report.groups[0].hash_hex();
    for row in &rows {
        assert_eq!(&row[0], digest.as_str());
        assert_eq!(&row[2], "5");
    }
    assert!(rows[0][1].ends_with("a.png"));
    assert!(rows[1][1].ends_with("b.png"));
}

#[test]
fn test_json_report_contents() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    let report = scan_with_duplicates(data.path());

    let path = write_report(&report, ReportFormat::Json, out.path(), Local::now())
        .unwrap()
        .unwrap();
    assert_eq!(path.extension().unwrap(), "json");

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["summary"]["files_hashed"], 3);
    assert_eq!(value["summary"]["interrupted"], false);
    assert_eq!(value["stats"]["group_count"], 1);
    assert_eq!(value["stats"]["reclaimable_bytes"], 5);
    assert_eq!(value["groups"][0]["files"].as_array().unwrap().len(), 2);
}

#[test]
fn test_no_report_without_duplicates() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    let reports = out.path().join("reports");
    fs::write(data.path().join("only.png"), b"single").unwrap();

    let config = ScanConfig::new(vec![data.path().to_path_buf()], [".png"]).unwrap();
    let report = DuplicateFinder::new(&config).find_duplicates().unwrap();

    let written = write_report(&report, ReportFormat::Csv, &reports, Local::now()).unwrap();
    assert!(written.is_none());
    assert!(!reports.exists());
}

#[test]
fn test_report_creates_output_directory() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    let nested = out.path().join("a").join("b");
    let report = scan_with_duplicates(data.path());

    let path = write_report(&report, ReportFormat::Csv, &nested, Local::now())
        .unwrap()
        .unwrap();

    assert!(path.starts_with(&nested));
    assert!(path.exists());
}

#[test]
fn test_scan_command_writes_report_and_exit_code() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    fs::write(data.path().join("a.txt"), b"same").unwrap();
    fs::write(data.path().join("b.txt"), b"same").unwrap();
    let config_file = out.path().join("absent.toml");

    let cli = Cli::try_parse_from([
        "dupefinder",
        "--quiet",
        "--config",
        config_file.to_str().unwrap(),
        "scan",
        data.path().to_str().unwrap(),
        "-e",
        "txt",
        "--format",
        "json",
        "--output-dir",
        out.path().to_str().unwrap(),
    ])
    .unwrap();
    let code = dupefinder::run_app(cli).unwrap();

    assert_eq!(code, ExitCode::Success);
    let reports: Vec<_> = fs::read_dir(out.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|e| e == "json"))
        .collect();
    assert_eq!(reports.len(), 1);
}

#[test]
fn test_scan_command_no_duplicates_exit_code() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    fs::write(data.path().join("a.txt"), b"one").unwrap();
    fs::write(data.path().join("b.txt"), b"two").unwrap();
    let config_file = out.path().join("absent.toml");

    let cli = Cli::try_parse_from([
        "dupefinder",
        "--quiet",
        "--config",
        config_file.to_str().unwrap(),
        "scan",
        data.path().to_str().unwrap(),
        "-e",
        "txt",
        "--output-dir",
        out.path().to_str().unwrap(),
    ])
    .unwrap();

    assert_eq!(dupefinder::run_app(cli).unwrap(), ExitCode::NoDuplicates);
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn test_scan_command_permanent_delete_keeps_first() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    let keep = data.path().join("a.txt");
    let remove = data.path().join("b.txt");
    fs::write(&keep, b"same").unwrap();
    fs::write(&remove, b"same").unwrap();
    let config_file = out.path().join("absent.toml");

    let cli = Cli::try_parse_from([
        "dupefinder",
        "--quiet",
        "--config",
        config_file.to_str().unwrap(),
        "scan",
        data.path().to_str().unwrap(),
        "-e",
        "txt",
        "-j",
        "1",
        "--no-report",
        "--delete",
        "--permanent",
        "--yes",
    ])
    .unwrap();

    assert_eq!(dupefinder::run_app(cli).unwrap(), ExitCode::Success);
    assert!(keep.exists());
    assert!(!remove.exists());
}

#[test]
fn test_scan_command_bad_extension_is_config_error() {
    let data = tempdir().unwrap();
    let config_file = data.path().join("absent.toml");

    let cli = Cli::try_parse_from([
        "dupefinder",
        "--quiet",
        "--config",
        config_file.to_str().unwrap(),
        "scan",
        data.path().to_str().unwrap(),
        "-e",
        "a/b",
        "--no-report",
    ])
    .unwrap();

    let err = dupefinder::run_app(cli).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::ConfigError);
}
