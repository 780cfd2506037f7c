//! Environment variable handling.

use std::env;

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Common environment variable names.
pub mod vars {
    /// Passphrase for the encrypted-file keyring (default name; configurable).
    pub const LOCKBOX_FILE_PASSPHRASE: &str = "LOCKBOX_FILE_PASSPHRASE";

    /// Lockbox home directory override.
    pub const LOCKBOX_HOME: &str = "LOCKBOX_HOME";

    /// Lockbox config file override.
    pub const LOCKBOX_CONFIG: &str = "LOCKBOX_CONFIG";

    /// Lockbox log filter.
    pub const LOCKBOX_LOG: &str = "LOCKBOX_LOG";
}
