//! Configuration schema definitions.

use crate::env::vars;
use crate::paths::DEFAULT_KEYRING_DIR;
use serde::{Deserialize, Serialize};

/// Main Lockbox configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Encrypted-file backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Encrypted-file backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Storage root. A leading `~/` is expanded to the home directory.
    #[serde(default = "default_root")]
    pub root: String,

    /// Name of the environment variable holding the passphrase.
    #[serde(default = "default_passphrase_env")]
    pub passphrase_env: String,

    /// Key-derivation cost parameters for newly sealed secrets.
    #[serde(default)]
    pub kdf: KdfConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            passphrase_env: default_passphrase_env(),
            kdf: KdfConfig::default(),
        }
    }
}

/// Argon2id parameters.
///
/// `memory_kib`, `iterations` and `parallelism` apply when sealing. Opening
/// always uses the parameters recorded in the token, but refuses tokens whose
/// memory cost exceeds `max_memory_kib`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfConfig {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,

    #[serde(default = "default_iterations")]
    pub iterations: u32,

    #[serde(default = "default_parallelism")]
    pub parallelism: u32,

    #[serde(default = "default_max_memory_kib")]
    pub max_memory_kib: u32,
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
            max_memory_kib: default_max_memory_kib(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level when `LOCKBOX_LOG` / `RUST_LOG` are unset.
    #[serde(default)]
    pub level: LogLevel,

    /// Emit JSON log lines instead of human-readable ones.
    #[serde(default)]
    pub json: bool,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

fn default_root() -> String {
    DEFAULT_KEYRING_DIR.to_string()
}

fn default_passphrase_env() -> String {
    vars::LOCKBOX_FILE_PASSPHRASE.to_string()
}

fn default_memory_kib() -> u32 {
    19 * 1024
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

fn default_max_memory_kib() -> u32 {
    1024 * 1024
}
