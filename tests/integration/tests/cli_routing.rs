//! CLI routing integration tests.
//!
//! These drive `lockbox_cli::run` in-process with parsed arguments and a
//! config rooted in a temporary directory, so no terminal is ever needed.

use clap::Parser;
use lockbox_cli::{run, Cli};
use lockbox_core::Config;
use lockbox_integration_tests::test_config;
use tempfile::TempDir;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).expect("arguments should parse")
}

/// A config whose passphrase variable is unique to the calling test.
fn config_with_env(dir: &TempDir, var: &str, passphrase: &str) -> Config {
    std::env::set_var(var, passphrase);
    let mut config = test_config(&dir.path().join("keyring"));
    config.backend.passphrase_env = var.to_string();
    config
}

#[tokio::test]
async fn test_cli_version() {
    run(parse(&["lockbox", "version"]), Config::default())
        .await
        .unwrap();
}

#[test]
fn test_cli_help_lists_commands() {
    let err = match Cli::try_parse_from(["lockbox", "--help"]) {
        Ok(_) => panic!("--help should short-circuit parsing"),
        Err(e) => e,
    };
    let help = err.to_string();
    assert!(help.contains("secrets"), "help was: {help}");
    assert!(help.contains("config"), "help was: {help}");
}

#[test]
fn test_cli_unknown_command() {
    assert!(Cli::try_parse_from(["lockbox", "nonexistent-command-xyz"]).is_err());
}

#[tokio::test]
async fn test_cli_set_get_delete() {
    let dir = TempDir::new().unwrap();
    let config = config_with_env(&dir, "LOCKBOX_IT_CLI_PASS_A", "cli-pass");

    run(
        parse(&["lockbox", "secrets", "set", "svc/user", "--value", "hunter2"]),
        config.clone(),
    )
    .await
    .unwrap();
    assert!(dir.path().join("keyring").join("svc").join("user").is_file());

    run(parse(&["lockbox", "secrets", "get", "svc/user"]), config.clone())
        .await
        .unwrap();
    run(parse(&["lockbox", "secrets", "inspect", "svc/user"]), config.clone())
        .await
        .unwrap();
    run(parse(&["lockbox", "secrets", "delete", "svc/user"]), config.clone())
        .await
        .unwrap();

    let err = run(parse(&["lockbox", "secrets", "get", "svc/user"]), config)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "No secret stored for 'svc/user'");
}

#[tokio::test]
async fn test_cli_wrong_passphrase_is_crypto_error() {
    let dir = TempDir::new().unwrap();
    let config = config_with_env(&dir, "LOCKBOX_IT_CLI_PASS_B", "right");
    run(
        parse(&["lockbox", "secrets", "set", "user", "--value", "v"]),
        config.clone(),
    )
    .await
    .unwrap();

    std::env::set_var("LOCKBOX_IT_CLI_PASS_B", "wrong");
    let err = run(parse(&["lockbox", "secrets", "get", "user"]), config)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Crypto error"), "got: {err}");
}

#[tokio::test]
async fn test_cli_exists_and_inspect_report_missing_keys() {
    let dir = TempDir::new().unwrap();
    let config = config_with_env(&dir, "LOCKBOX_IT_CLI_PASS_C", "pass");

    let err = run(parse(&["lockbox", "secrets", "exists", "ghost"]), config.clone())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "No secret stored for 'ghost'");

    run(
        parse(&["lockbox", "secrets", "set", "team/db", "--value", "v"]),
        config.clone(),
    )
    .await
    .unwrap();
    run(parse(&["lockbox", "secrets", "exists", "team/db"]), config.clone())
        .await
        .unwrap();

    // "team" is a directory now, not a stored key.
    let err = run(parse(&["lockbox", "secrets", "inspect", "team"]), config.clone())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "No secret stored for 'team'");
    let err = run(parse(&["lockbox", "secrets", "exists", "team"]), config)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "No secret stored for 'team'");
}

#[tokio::test]
async fn test_cli_config_init_then_show() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lockbox.json5");
    let path_arg = path.to_string_lossy().into_owned();

    run(
        parse(&["lockbox", "--config", &path_arg, "config", "init"]),
        Config::default(),
    )
    .await
    .unwrap();
    assert!(path.is_file());

    let loaded = lockbox_cli::load_config(Some(&path)).unwrap();
    assert_eq!(loaded, Config::default());

    run(
        parse(&["lockbox", "--config", &path_arg, "config", "get", "backend.root"]),
        loaded,
    )
    .await
    .unwrap();
}
