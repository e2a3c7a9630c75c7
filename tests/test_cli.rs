//! Tests for CLI argument parsing and config resolution

use clap::Parser;
use std::path::PathBuf;
use tempfile::TempDir;
use vipselect::cli::{Cli, Commands};
use vipselect::pipeline::RunConfig;

#[test]
fn test_cli_default_values() {
    let cli = Cli::parse_from(["vipselect", "-i", "features.csv"]);

    assert!(cli.vip_cap.is_none());
    assert!(cli.eligibility_threshold.is_none());
    assert!(!cli.no_confirm, "Default no_confirm should be false");
    assert!(!cli.dry_run, "Default dry_run should be false");
    assert_eq!(
        cli.infer_schema_length, 10000,
        "Default schema inference should be 10000"
    );

    let config = cli.resolve_config().unwrap();
    assert_eq!(config, RunConfig::default());
    assert_eq!(config.params.vip_cap, 6000);
}

#[test]
fn test_cli_overrides() {
    let cli = Cli::parse_from([
        "vipselect",
        "-i",
        "features.csv",
        "--vip-cap",
        "250",
        "--eligibility-threshold",
        "0.1",
    ]);

    let config = cli.resolve_config().unwrap();
    assert_eq!(config.params.vip_cap, 250);
    assert_eq!(config.params.eligibility_threshold, 0.1);
}

#[test]
fn test_cli_rejects_non_numeric_threshold() {
    let result = Cli::try_parse_from([
        "vipselect",
        "-i",
        "features.csv",
        "--eligibility-threshold",
        "abc",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_cli_output_path_derivation() {
    let cli = Cli::parse_from(["vipselect", "-i", "/path/to/features.csv"]);

    assert_eq!(cli.output_path().unwrap(), PathBuf::from("/path/to/features_vip.csv"));
    assert_eq!(
        cli.report_path().unwrap(),
        PathBuf::from("/path/to/features_vip_report.json")
    );
}

#[test]
fn test_cli_output_path_derivation_parquet() {
    let cli = Cli::parse_from(["vipselect", "-i", "/path/to/features.parquet"]);
    assert_eq!(
        cli.output_path().unwrap(),
        PathBuf::from("/path/to/features_vip.parquet")
    );
}

#[test]
fn test_cli_explicit_paths() {
    let cli = Cli::parse_from([
        "vipselect",
        "-i",
        "features.csv",
        "-o",
        "decisions.parquet",
        "--report",
        "run.json",
    ]);

    assert_eq!(cli.output_path().unwrap(), PathBuf::from("decisions.parquet"));
    assert_eq!(cli.report_path().unwrap(), PathBuf::from("run.json"));
}

#[test]
fn test_cli_no_input_has_no_output_path() {
    let cli = Cli::parse_from(["vipselect"]);
    assert!(cli.input().is_none());
    assert!(cli.output_path().is_none());
}

#[test]
fn test_config_file_with_cli_override() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("params.json");
    std::fs::write(
        &config_path,
        r#"{ "params": { "vip_cap": 10, "eligibility_threshold": 0.2 } }"#,
    )
    .unwrap();

    let cli = Cli::parse_from([
        "vipselect",
        "-i",
        "features.csv",
        "-c",
        config_path.to_str().unwrap(),
        "--vip-cap",
        "3",
    ]);

    let config = cli.resolve_config().unwrap();
    assert_eq!(config.params.vip_cap, 3, "CLI flag wins over config file");
    assert_eq!(config.params.eligibility_threshold, 0.2);
    assert_eq!(config.columns.household, "hshld_no");
}

#[test]
fn test_malformed_config_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("params.json");
    std::fs::write(&config_path, "{ not json").unwrap();

    let cli = Cli::parse_from([
        "vipselect",
        "-i",
        "features.csv",
        "--config",
        config_path.to_str().unwrap(),
    ]);
    let err = cli.resolve_config().unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_init_config_subcommand() {
    let cli = Cli::parse_from(["vipselect", "init-config", "defaults.json"]);
    match cli.command {
        Some(Commands::InitConfig { output }) => assert_eq!(output, PathBuf::from("defaults.json")),
        other => panic!("unexpected command: {:?}", other),
    }
}
