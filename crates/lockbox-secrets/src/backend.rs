//! Secret backends.
//!
//! [`SecretBackend`] is the get/set/delete contract a dispatcher selects
//! backends by. [`FileBackend`] is the encrypted-file implementation.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use lockbox_core::config::BackendConfig;
use lockbox_core::SecretString;
use tracing::debug;

use crate::envelope::EnvelopeCodec;
use crate::error::{Result, SecretError};
use crate::file_store::FileStore;
use crate::passphrase::{EnvPassphrase, PassphraseProvider};
use crate::paths::{file_in, PathResolver};
use crate::types::{DecryptedSecret, SecretIdentity};

/// Async trait for secret storage backends.
#[async_trait]
pub trait SecretBackend: Send + Sync {
    /// Retrieve and decrypt the secret stored for `(namespace, key)`.
    async fn get(&self, namespace: &str, key: &str) -> Result<DecryptedSecret>;

    /// Store `secret` for `(namespace, key)`, replacing any previous value.
    async fn set(&self, namespace: &str, key: &str, secret: &str) -> Result<()>;

    /// Remove the secret for `(namespace, key)`.
    async fn delete(&self, namespace: &str, key: &str) -> Result<()>;

    /// Check whether a secret is stored for `(namespace, key)`.
    async fn exists(&self, namespace: &str, key: &str) -> Result<bool>;
}

/// Stores each secret as one passphrase-encrypted file under a root directory.
///
/// The file name derives from `key` alone, so the same key under two
/// namespaces refers to one file.
///
/// A `/` inside a key nests it in a sub-directory, so `svc` and `svc/user`
/// cannot both be stored: whichever is set second fails with
/// [`SecretError::Io`]. Reading, deleting or probing the other key in that
/// state reports it as absent.
///
/// There is no locking. Concurrent writers to one key race and the last
/// completed write wins; readers always see a complete token.
/// Only `set` and `get` create a missing storage root.
#[derive(Clone)]
pub struct FileBackend {
    resolver: PathResolver,
    passphrase: Arc<dyn PassphraseProvider>,
    codec: EnvelopeCodec,
    store: FileStore,
}

impl FileBackend {
    pub fn new(
        resolver: PathResolver,
        passphrase: Arc<dyn PassphraseProvider>,
        codec: EnvelopeCodec,
    ) -> Self {
        Self {
            resolver,
            passphrase,
            codec,
            store: FileStore::new(),
        }
    }

    /// Build a backend from config with an explicit passphrase provider.
    pub fn with_provider(config: &BackendConfig, passphrase: Arc<dyn PassphraseProvider>) -> Self {
        Self::new(
            PathResolver::new(config.root.clone()),
            passphrase,
            EnvelopeCodec::from_config(&config.kdf),
        )
    }

    /// Build a backend that reads the passphrase from the configured
    /// environment variable, prompting on the terminal when it is unset.
    pub fn from_config(config: &BackendConfig) -> Self {
        Self::with_provider(
            config,
            Arc::new(EnvPassphrase::with_terminal(config.passphrase_env.clone())),
        )
    }

    /// The storage root, created if missing.
    pub async fn root(&self) -> Result<PathBuf> {
        self.resolver.resolve_root().await
    }

    /// The file a key is stored in. Does not create the root.
    pub async fn path_for(&self, key: &str) -> Result<PathBuf> {
        self.resolver.locate_file(key).await
    }

    /// Delete by key alone.
    pub async fn remove_key(&self, key: &str) -> Result<()> {
        let path = self.resolver.locate_file(key).await?;
        self.store.remove(&path).await
    }

    async fn acquire_passphrase(&self, root: PathBuf) -> Result<SecretString> {
        let provider = Arc::clone(&self.passphrase);
        tokio::task::spawn_blocking(move || provider.acquire(&root))
            .await
            .map_err(|e| SecretError::Passphrase(format!("passphrase task failed: {e}")))?
    }

    async fn seal(&self, secret: &str, passphrase: SecretString) -> Result<String> {
        let codec = self.codec;
        let secret = SecretString::new(secret);
        tokio::task::spawn_blocking(move || codec.seal(secret.expose_secret(), &passphrase))
            .await
            .map_err(|e| SecretError::Crypto(format!("seal task failed: {e}")))?
    }

    async fn open(&self, token: String, passphrase: SecretString) -> Result<SecretString> {
        let codec = self.codec;
        tokio::task::spawn_blocking(move || codec.open(&token, &passphrase))
            .await
            .map_err(|e| SecretError::Crypto(format!("open task failed: {e}")))?
    }
}

impl std::fmt::Debug for FileBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBackend")
            .field("root", &self.resolver.configured_root())
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SecretBackend for FileBackend {
    async fn get(&self, namespace: &str, key: &str) -> Result<DecryptedSecret> {
        let root = self.resolver.resolve_root().await?;
        let path = file_in(&root, key)?;
        let bytes = self.store.read(&path).await?;
        let token = String::from_utf8(bytes)
            .map_err(|_| SecretError::Crypto("token is not valid UTF-8".to_string()))?;

        let passphrase = self.acquire_passphrase(root).await?;
        let plaintext = self.open(token, passphrase).await?;

        let id = SecretIdentity::new(namespace, key);
        debug!(secret = %id, path = %path.display(), "read secret");
        Ok(DecryptedSecret::from(plaintext))
    }

    async fn set(&self, namespace: &str, key: &str, secret: &str) -> Result<()> {
        let root = self.resolver.resolve_root().await?;
        let path = file_in(&root, key)?;

        let passphrase = self.acquire_passphrase(root).await?;
        let token = self.seal(secret, passphrase).await?;

        self.store.write(&path, token.as_bytes()).await?;
        let id = SecretIdentity::new(namespace, key);
        debug!(secret = %id, path = %path.display(), "stored secret");
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<()> {
        let path = self.resolver.locate_file(key).await?;
        self.store.remove(&path).await?;
        debug!(secret = %SecretIdentity::new(namespace, key), "deleted secret");
        Ok(())
    }

    async fn exists(&self, _namespace: &str, key: &str) -> Result<bool> {
        let path = self.resolver.locate_file(key).await?;
        self.store.exists(&path).await
    }
}
