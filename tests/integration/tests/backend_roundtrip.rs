//! End-to-end behaviour of the encrypted-file backend through its public API.

use std::collections::HashSet;
use std::sync::Arc;

use lockbox_integration_tests::{backend, test_config};
use lockbox_secrets::{
    escape_key, EnvPassphrase, FileBackend, FixedStringPrompt, SecretBackend, SecretError,
};
use tempfile::TempDir;

#[tokio::test]
async fn test_round_trip_assorted_values() {
    let dir = TempDir::new().unwrap();
    let store = backend(dir.path(), "some-pass-phrase");

    let values = [
        "test-password".to_string(),
        String::new(),
        "this password\nhas multiple\nlines and will be\nencoded by some keyrings".to_string(),
        "at least on OSX üöäÜÖÄß will be encoded".to_string(),
        "abcdef123abcdef123".to_string(),
        format!("ba{}", "na".repeat(5000)),
    ];

    for (i, value) in values.iter().enumerate() {
        let key = format!("user-{i}");
        store.set("test-service", &key, value).await.unwrap();
        let got = store.get("test-service", &key).await.unwrap();
        assert_eq!(got.expose(), value, "value #{i} did not survive");
    }
}

#[tokio::test]
async fn test_scenario_wrong_passphrase() {
    let dir = TempDir::new().unwrap();
    backend(dir.path(), "p1")
        .set("svc", "user", "hello\nworld")
        .await
        .unwrap();

    let ok = backend(dir.path(), "p1").get("svc", "user").await.unwrap();
    assert_eq!(ok.expose(), "hello\nworld");

    let err = backend(dir.path(), "p2").get("svc", "user").await.unwrap_err();
    assert!(matches!(err, SecretError::Crypto(_)), "got {err:?}");
}

#[tokio::test]
async fn test_scenario_missing_user() {
    let dir = TempDir::new().unwrap();
    let store = backend(dir.path(), "p1");

    let err = store.get("svc", "missing-user").await.unwrap_err();
    assert!(err.is_not_found());
    let err = store.delete("svc", "missing-user").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_then_get() {
    let dir = TempDir::new().unwrap();
    let store = backend(dir.path(), "p1");

    store.set("svc", "user", "v").await.unwrap();
    store.delete("svc", "user").await.unwrap();
    assert!(store.get("svc", "user").await.unwrap_err().is_not_found());
    assert!(store.delete("svc", "user").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_distinct_keys_use_distinct_files() {
    let dir = TempDir::new().unwrap();
    let store = backend(dir.path(), "p1");
    let keys = [
        "a b",
        "a+b",
        "a%20b",
        "a/b",
        "a%2Fb",
        "a//b",
        "/a/b",
        "ä",
        "a\u{0308}",
        "..",
        ".",
    ];

    let mut paths = HashSet::new();
    for key in keys.iter().copied().chain(std::iter::once("a")) {
        let path = store.path_for(key).await.unwrap();
        assert!(path.starts_with(dir.path()));
        assert!(paths.insert(path), "{key:?} shares a file");
    }

    for key in keys {
        store.set("svc", key, &format!("value of {key}")).await.unwrap();
    }
    for key in keys {
        let got = store.get("svc", key).await.unwrap();
        assert_eq!(got.expose(), format!("value of {key}"));
    }
    assert_eq!(escape_key("a/b"), "a/b");

    // "a" is the directory holding "a/b", never a stored key of its own.
    assert!(store.get("svc", "a").await.unwrap_err().is_not_found());
    assert!(store.delete("svc", "a").await.unwrap_err().is_not_found());
    assert!(!store.exists("svc", "a").await.unwrap());
    assert!(matches!(
        store.set("svc", "a", "v").await,
        Err(SecretError::Io(_))
    ));
}

#[tokio::test]
async fn test_key_below_a_stored_key_is_not_found() {
    let dir = TempDir::new().unwrap();
    let store = backend(dir.path(), "p1");
    store.set("svc", "svc", "v").await.unwrap();

    assert!(store.get("svc", "svc/user").await.unwrap_err().is_not_found());
    assert!(store.delete("svc", "svc/user").await.unwrap_err().is_not_found());
    assert!(!store.exists("svc", "svc/user").await.unwrap());
}

#[tokio::test]
async fn test_delete_on_missing_root_is_not_found() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("never-created");
    let store = backend(&root, "p1");

    assert!(store.delete("svc", "user").await.unwrap_err().is_not_found());
    assert!(!store.exists("svc", "user").await.unwrap());
    assert!(!root.exists());
}

#[tokio::test]
async fn test_env_provider_drives_backend() {
    let dir = TempDir::new().unwrap();
    let var = "LOCKBOX_IT_PASSPHRASE";
    let config = test_config(dir.path());

    std::env::set_var(var, "from-env");
    let env_backend = FileBackend::with_provider(
        &config.backend,
        Arc::new(EnvPassphrase::new(var, Arc::new(FixedStringPrompt::new("unused")))),
    );
    env_backend.set("svc", "user", "secret").await.unwrap();
    std::env::remove_var(var);

    // With the variable gone, the prompt supplies the passphrase instead.
    let prompted = FileBackend::with_provider(
        &config.backend,
        Arc::new(EnvPassphrase::new(var, Arc::new(FixedStringPrompt::new("from-env")))),
    );
    assert_eq!(prompted.get("svc", "user").await.unwrap().expose(), "secret");
}

#[tokio::test]
async fn test_trait_object_dispatch() {
    let dir = TempDir::new().unwrap();
    let backends: Vec<Box<dyn SecretBackend>> = vec![Box::new(backend(dir.path(), "p1"))];

    for b in &backends {
        b.set("svc", "user", "via dyn").await.unwrap();
        assert!(b.exists("svc", "user").await.unwrap());
        assert_eq!(b.get("svc", "user").await.unwrap().expose(), "via dyn");
    }
}

#[tokio::test]
async fn test_stored_file_is_a_single_token() {
    let dir = TempDir::new().unwrap();
    let store = backend(dir.path(), "p1");
    store.set("svc", "user", "hello").await.unwrap();

    let content = std::fs::read_to_string(dir.path().join("user")).unwrap();
    assert_eq!(content.split('.').count(), 5);
    assert!(!content.contains("hello"));
}
