//! Core types for the backend.

use lockbox_core::SecretString;
use std::fmt;

/// The identity a secret is stored under.
///
/// Only `key` determines the file on disk; `namespace` is carried for the
/// caller's benefit and for log context. Two identities that differ only in
/// namespace therefore share one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretIdentity {
    pub namespace: String,
    pub key: String,
}

impl SecretIdentity {
    pub fn new(namespace: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for SecretIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.key)
    }
}

/// A decrypted secret held in memory.
///
/// The plaintext is zeroed on drop. Debug and Display both emit `[REDACTED]`.
pub struct DecryptedSecret {
    inner: SecretString,
}

impl DecryptedSecret {
    pub fn new(value: impl Into<SecretString>) -> Self {
        Self {
            inner: value.into(),
        }
    }

    /// Expose the plaintext value. Use sparingly.
    pub fn expose(&self) -> &str {
        self.inner.expose_secret()
    }
}

impl fmt::Debug for DecryptedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for DecryptedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<SecretString> for DecryptedSecret {
    fn from(inner: SecretString) -> Self {
        Self { inner }
    }
}
