//! Shared fixtures for the integration tests.

use std::path::Path;
use std::sync::Arc;

use lockbox_core::config::{BackendConfig, Config, KdfConfig};
use lockbox_secrets::{FileBackend, FixedPassphrase};

/// KDF settings cheap enough to run hundreds of times in a test suite.
pub fn fast_kdf() -> KdfConfig {
    KdfConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
        max_memory_kib: 1024,
    }
}

/// A config rooted at `root` with fast KDF settings.
pub fn test_config(root: &Path) -> Config {
    Config {
        backend: BackendConfig {
            root: root.to_string_lossy().into_owned(),
            kdf: fast_kdf(),
            ..BackendConfig::default()
        },
        ..Config::default()
    }
}

/// A backend at `root` that always uses `passphrase`.
pub fn backend(root: &Path, passphrase: &str) -> FileBackend {
    FileBackend::with_provider(
        &test_config(root).backend,
        Arc::new(FixedPassphrase::new(passphrase)),
    )
}
