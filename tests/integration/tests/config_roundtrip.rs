//! Config save/load roundtrip integration tests.

use lockbox_core::config::{Config, LogLevel};
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lockbox.json5");

    let config = Config::default();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.backend.root, config.backend.root);
    assert_eq!(loaded.backend.passphrase_env, config.backend.passphrase_env);
    assert_eq!(loaded.backend.kdf, config.backend.kdf);
}

#[test]
fn test_config_modify_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lockbox.json5");

    let mut config = Config::default();
    config.backend.passphrase_env = "TEAM_VAULT_PASSPHRASE".to_string();
    config.logging.level = LogLevel::Debug;
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.backend.passphrase_env, "TEAM_VAULT_PASSPHRASE");
    assert_eq!(loaded.logging.level, LogLevel::Debug);
}

#[test]
fn test_config_load_nonexistent() {
    let result = Config::load(Path::new("/nonexistent/lockbox.json5"));
    assert!(result.is_err());
}

#[test]
fn test_config_parse_invalid() {
    let result = Config::parse("not valid json");
    assert!(result.is_err());
}
