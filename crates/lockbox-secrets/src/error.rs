//! Error types for the encrypted-file backend.

use thiserror::Error;

/// Errors surfaced by backend operations.
///
/// Every variant is terminal for the operation that raised it; nothing is
/// retried internally.
#[derive(Debug, Error)]
pub enum SecretError {
    /// No secret is stored under the requested identity.
    #[error("Secret not found: {0}")]
    NotFound(String),

    /// The storage root could not be resolved, created, or is not a directory.
    #[error("Directory error: {0}")]
    Directory(String),

    /// The passphrase could not be obtained.
    #[error("Passphrase error: {0}")]
    Passphrase(String),

    /// Sealing or opening an envelope failed. A wrong passphrase and a
    /// corrupted token both land here.
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SecretError {
    /// Whether this is the not-found sentinel.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Convenience result alias for backend operations.
pub type Result<T> = std::result::Result<T, SecretError>;
