use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use cannibal::cli::{AnalyzeArgs, Cli, Commands, OutputFormat};
use cannibal::core::winner::TieBreak;
use clap::Parser;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn analyze_flag_parsing() {
    // Given
    let argv = vec![
        "cannibal",
        "--quiet",
        "analyze",
        "report.csv",
        "--threshold",
        "150",
        "--min-orders",
        "3",
        "--tie-break",
        "first-seen",
        "--format",
        "csv",
    ];

    // When
    let cmd = Cli::parse_from(argv);

    // Then
    assert!(cmd.quiet);
    match cmd.command {
        Commands::Analyze(AnalyzeArgs { report, threshold, min_orders, tie_break, format, output, .. }) => {
            assert!(report.to_string_lossy().ends_with("report.csv"));
            assert_eq!(threshold, Some(150));
            assert_eq!(min_orders, Some(3));
            assert_eq!(tie_break, Some(TieBreak::FirstSeen));
            assert_eq!(format, Some(OutputFormat::Csv));
            assert!(output.is_none());
        }
        _ => panic!("expected Analyze command"),
    }
}

#[test]
fn analyze_rejects_out_of_range_knobs() {
    assert!(Cli::try_parse_from(["cannibal", "analyze", "r.csv", "--threshold", "20"]).is_err());
    assert!(Cli::try_parse_from(["cannibal", "analyze", "r.csv", "--min-orders", "0"]).is_err());
    assert!(Cli::try_parse_from(["cannibal", "analyze", "r.csv", "--min-orders", "11"]).is_err());
    assert!(Cli::try_parse_from(["cannibal", "analyze", "r.csv", "--threshold", "30", "--min-orders", "10"]).is_ok());
}

#[test]
fn init_writes_default_config() {
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    Command::cargo_bin("cannibal")
        .expect("bin")
        .args(["init", tmp.path().to_str().expect("utf8 path")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file"));

    let written = std::fs::read_to_string(tmp.child("cannibal.toml").path()).expect("read config");
    assert!(written.contains("improvement_threshold_percent = 100"));
    assert!(written.contains("[columns]"));

    // Second run refuses to clobber without --force
    Command::cargo_bin("cannibal")
        .expect("bin")
        .args(["init", tmp.path().to_str().expect("utf8 path")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn completions_to_stdout() {
    Command::cargo_bin("cannibal")
        .expect("bin")
        .args(["completions", "bash", "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cannibal"));
}
