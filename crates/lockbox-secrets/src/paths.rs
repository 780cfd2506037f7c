//! Storage-root resolution and key-to-filename escaping.
//!
//! A key maps to a path under the root by percent-encoding every byte that is
//! not `[A-Za-z0-9_-]`. A `/` that sits between two non-separator bytes is
//! kept literally, so `svc/user` lands in `<root>/svc/user`. Leading,
//! trailing, and repeated separators are encoded, and `.` is always encoded,
//! so an escaped key can never climb out of the root or name the root itself.

use std::path::{Path, PathBuf};

use lockbox_core::paths;
use tracing::{debug, info};

use crate::error::{Result, SecretError};

/// Permission bits for directories created under the storage root.
pub(crate) const DIR_MODE: u32 = 0o700;

/// Resolves the storage root and the per-key file paths under it.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: String,
}

impl PathResolver {
    /// Create a resolver for a configured root. `~/` is expanded lazily.
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    /// The root as configured, before expansion.
    pub fn configured_root(&self) -> &str {
        &self.root
    }

    /// Expand the configured root and make sure it exists as a directory.
    ///
    /// A missing root (and any missing parents) is created with mode 0700.
    pub async fn resolve_root(&self) -> Result<PathBuf> {
        let (dir, present) = self.inspect_root().await?;
        if !present {
            create_private_dir(&dir).await.map_err(|e| {
                SecretError::Directory(format!("cannot create {}: {e}", dir.display()))
            })?;
            info!(root = %dir.display(), "created storage directory");
        }
        Ok(dir)
    }

    /// Expand and check the configured root without creating it.
    pub async fn locate_root(&self) -> Result<PathBuf> {
        self.inspect_root().await.map(|(dir, _)| dir)
    }

    /// Resolve the root, then the file for `key` under it.
    pub async fn resolve_file(&self, key: &str) -> Result<PathBuf> {
        let root = self.resolve_root().await?;
        file_in(&root, key)
    }

    /// Like [`PathResolver::resolve_file`], but never creates the root.
    pub async fn locate_file(&self, key: &str) -> Result<PathBuf> {
        let root = self.locate_root().await?;
        file_in(&root, key)
    }

    /// The expanded root and whether it already exists.
    async fn inspect_root(&self) -> Result<(PathBuf, bool)> {
        if self.root.is_empty() {
            return Err(SecretError::Directory(
                "storage directory not set".to_string(),
            ));
        }

        let dir = paths::expand_tilde(&self.root)
            .map_err(|e| SecretError::Directory(format!("{}: {e}", self.root)))?;

        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok((dir, true)),
            Ok(_) => Err(SecretError::Directory(format!(
                "{} is a file, not a directory",
                dir.display()
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok((dir, false)),
            Err(e) => Err(SecretError::Directory(format!(
                "cannot stat {}: {e}",
                dir.display()
            ))),
        }
    }
}

/// Join the escaped form of `key` onto an already resolved root.
pub fn file_in(root: &Path, key: &str) -> Result<PathBuf> {
    if key.is_empty() {
        return Err(SecretError::InvalidKey("key must not be empty".to_string()));
    }

    let escaped = escape_key(key);
    let mut path = root.to_path_buf();
    for segment in escaped.split('/') {
        path.push(segment);
    }
    debug!(key, path = %path.display(), "resolved secret path");
    Ok(path)
}

/// Create `dir` and its missing parents with owner-only permissions.
pub(crate) async fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_MODE);
    builder.create(dir).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(dir, std::fs::Permissions::from_mode(DIR_MODE)).await?;
    }

    Ok(())
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Escape a key into a relative, `/`-separated filesystem path.
pub fn escape_key(key: &str) -> String {
    let bytes = key.as_bytes();
    let mut out = String::with_capacity(bytes.len());

    for (i, &b) in bytes.iter().enumerate() {
        if is_unreserved(b) {
            out.push(b as char);
        } else if b == b'/' && is_inner_separator(bytes, i) {
            out.push('/');
        } else {
            out.push('%');
            out.push_str(&format!("{b:02X}"));
        }
    }

    out
}

/// A separator is literal only with a non-separator byte on both sides.
fn is_inner_separator(bytes: &[u8], i: usize) -> bool {
    i > 0
        && i + 1 < bytes.len()
        && bytes[i - 1] != b'/'
        && bytes[i + 1] != b'/'
}

/// Reverse [`escape_key`]. Returns `None` for input it could not have produced.
pub fn unescape_key(escaped: &str) -> Option<String> {
    let bytes = escaped.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = escaped.get(i + 1..i + 3)?;
                out.push(u8::from_str_radix(hex, 16).ok()?);
                i += 3;
            }
            b'/' => {
                out.push(b'/');
                i += 1;
            }
            b if is_unreserved(b) => {
                out.push(b);
                i += 1;
            }
            _ => return None,
        }
    }

    String::from_utf8(out).ok()
}
