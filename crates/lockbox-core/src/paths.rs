//! Path resolution utilities.

use crate::env;
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Default storage root for the encrypted-file keyring.
pub const DEFAULT_KEYRING_DIR: &str = "~/lockbox-keyring";

/// Get the user's home directory.
pub fn home_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::NoHomeDir)
}

/// Get the Lockbox base directory (~/.lockbox, or `$LOCKBOX_HOME`).
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = env::get_var(env::vars::LOCKBOX_HOME) {
        return expand_tilde(&dir);
    }
    Ok(home_dir()?.join(".lockbox"))
}

/// Get the main config file path (~/.lockbox/lockbox.json5).
pub fn config_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("lockbox.json5"))
}

/// Expand a leading `~` (alone, or followed by a separator) to the home directory.
///
/// Any other path is returned unchanged. Fails only when expansion is needed
/// and the home directory cannot be determined.
pub fn expand_tilde(path: &str) -> Result<PathBuf, ConfigError> {
    expand_tilde_with(path, dirs::home_dir().as_deref())
}

/// Like [`expand_tilde`], with an explicit home directory.
pub fn expand_tilde_with(path: &str, home: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/")
            .or_else(|| path.strip_prefix(&format!("~{}", std::path::MAIN_SEPARATOR)))
    };

    match rest {
        Some(rest) => {
            let home = home.ok_or(ConfigError::NoHomeDir)?;
            if rest.is_empty() {
                Ok(home.to_path_buf())
            } else {
                Ok(home.join(rest))
            }
        }
        None => Ok(PathBuf::from(path)),
    }
}
