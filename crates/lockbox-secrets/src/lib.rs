//! Passphrase-protected encrypted-file secret backend.
//!
//! Each secret is stored as one file under a configurable root directory.
//! The file holds a compact envelope token: an Argon2id-derived key wraps a
//! fresh AES-256-GCM content key, and the content key encrypts the secret.
//! The passphrase comes from an environment variable or an interactive
//! prompt and is never written anywhere.

pub mod backend;
pub mod envelope;
pub mod error;
pub mod file_store;
pub mod passphrase;
pub mod paths;
pub mod types;

pub use backend::{FileBackend, SecretBackend};
pub use envelope::{EnvelopeCodec, EnvelopeInfo, KdfParams};
pub use error::{Result, SecretError};
pub use file_store::FileStore;
pub use passphrase::{
    EnvPassphrase, FixedPassphrase, FixedStringPrompt, PassphraseProvider, Prompt, TerminalPrompt,
};
pub use paths::{escape_key, unescape_key, PathResolver};
pub use types::{DecryptedSecret, SecretIdentity};
