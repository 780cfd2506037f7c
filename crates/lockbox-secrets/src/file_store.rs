//! Raw token persistence.
//!
//! Writes go to a hidden temporary file next to the destination and are
//! renamed into place, so a reader sees either the previous token or the new
//! one, never a partial write. Escaped key names never contain `.`, so the
//! temporary names cannot collide with a stored key.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rand::RngCore;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{Result, SecretError};
use crate::paths::create_private_dir;

/// Permission bits for stored token files.
pub(crate) const FILE_MODE: u32 = 0o600;

/// Reads, writes and removes token files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStore;

impl FileStore {
    pub fn new() -> Self {
        Self
    }

    /// Read the whole file. A path that holds no token is
    /// [`SecretError::NotFound`].
    pub async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        if !token_present(path).await? {
            return Err(not_found(path));
        }
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found(path)),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the file's content with `contents`, creating parents as needed.
    pub async fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let (dir, name) = split_path(path)?;
        if tokio::fs::metadata(dir).await.is_err() {
            create_private_dir(dir).await?;
        }

        let tmp = temp_path(dir, name);
        debug!(path = %path.display(), tmp = %tmp.display(), "writing token");

        if let Err(e) = write_new_file(&tmp, contents).await {
            discard(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            discard(&tmp).await;
            return Err(e.into());
        }

        Ok(())
    }

    /// Delete the file. A path that holds no token is
    /// [`SecretError::NotFound`].
    pub async fn remove(&self, path: &Path) -> Result<()> {
        if !token_present(path).await? {
            return Err(not_found(path));
        }
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = %path.display(), "removed token");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found(path)),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether a regular file exists at `path`.
    pub async fn exists(&self, path: &Path) -> Result<bool> {
        token_present(path).await
    }
}

fn not_found(path: &Path) -> SecretError {
    SecretError::NotFound(path.display().to_string())
}

/// Whether `path` names a regular file.
///
/// Hierarchical keys let one key's file sit where another key needs a
/// directory. A path that is a directory, or that runs through a regular
/// file, holds no token and reports `false` like a missing one.
async fn token_present(path: &Path) -> Result<bool> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => {
            if below_regular_file(path).await {
                Ok(false)
            } else {
                Err(e.into())
            }
        }
    }
}

/// Whether the nearest existing ancestor of `path` is something other than
/// a directory.
async fn below_regular_file(path: &Path) -> bool {
    for ancestor in path.ancestors().skip(1) {
        if let Ok(meta) = tokio::fs::metadata(ancestor).await {
            return !meta.is_dir();
        }
    }
    false
}

fn split_path(path: &Path) -> Result<(&Path, &str)> {
    let dir = path.parent();
    let name = path.file_name().and_then(|n| n.to_str());
    match (dir, name) {
        (Some(dir), Some(name)) => Ok((dir, name)),
        _ => Err(SecretError::Io(std::io::Error::new(
            ErrorKind::InvalidInput,
            format!("not a file path: {}", path.display()),
        ))),
    }
}

fn temp_path(dir: &Path, name: &str) -> PathBuf {
    let mut suffix = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut suffix);
    dir.join(format!(".{name}.{}.tmp", hex::encode(suffix)))
}

/// Create `path` exclusively with mode 0600, write, and flush to disk.
async fn write_new_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(FILE_MODE);

    let mut file = options.open(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(FILE_MODE)).await?;
    }

    Ok(())
}

async fn discard(tmp: &Path) {
    if let Err(e) = tokio::fs::remove_file(tmp).await {
        if e.kind() != ErrorKind::NotFound {
            warn!(path = %tmp.display(), "could not remove temporary file: {e}");
        }
    }
}
