//! Passphrase acquisition.
//!
//! The backend never reads the environment or the terminal itself; it asks a
//! [`PassphraseProvider`]. The stock provider, [`EnvPassphrase`], checks one
//! environment variable and falls back to an interactive [`Prompt`].

use std::path::Path;
use std::sync::Arc;

use lockbox_core::{env, SecretString};
use tracing::debug;

use crate::error::{Result, SecretError};

/// Something that can ask a human for a secret string.
pub trait Prompt: Send + Sync {
    /// Show `message` and return what was entered.
    fn prompt(&self, message: &str) -> Result<String>;
}

impl<F> Prompt for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn prompt(&self, message: &str) -> Result<String> {
        self(message)
    }
}

/// Reads a line from the controlling terminal without echo.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn prompt(&self, message: &str) -> Result<String> {
        rpassword::prompt_password(format!("{message}: "))
            .map_err(|e| SecretError::Passphrase(format!("failed to read passphrase: {e}")))
    }
}

/// Always answers with the same value.
#[derive(Debug, Clone)]
pub struct FixedStringPrompt(SecretString);

impl FixedStringPrompt {
    pub fn new(value: impl Into<SecretString>) -> Self {
        Self(value.into())
    }
}

impl Prompt for FixedStringPrompt {
    fn prompt(&self, _message: &str) -> Result<String> {
        Ok(self.0.expose_secret().to_string())
    }
}

/// Supplies the passphrase that protects a storage root.
///
/// Implementations may block (for example on terminal input); the backend
/// calls them from a blocking task.
pub trait PassphraseProvider: Send + Sync {
    fn acquire(&self, root: &Path) -> Result<SecretString>;
}

/// Environment variable first, interactive prompt second.
///
/// An unset or empty variable triggers the prompt. Whatever the prompt
/// returns, including an empty string, is used as-is.
#[derive(Clone)]
pub struct EnvPassphrase {
    var: String,
    prompt: Arc<dyn Prompt>,
}

impl EnvPassphrase {
    pub fn new(var: impl Into<String>, prompt: Arc<dyn Prompt>) -> Self {
        Self {
            var: var.into(),
            prompt,
        }
    }

    /// Read `var`, falling back to [`TerminalPrompt`].
    pub fn with_terminal(var: impl Into<String>) -> Self {
        Self::new(var, Arc::new(TerminalPrompt))
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl std::fmt::Debug for EnvPassphrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvPassphrase")
            .field("var", &self.var)
            .finish_non_exhaustive()
    }
}

impl PassphraseProvider for EnvPassphrase {
    fn acquire(&self, root: &Path) -> Result<SecretString> {
        if let Some(value) = env::get_var(&self.var) {
            debug!(var = %self.var, "using passphrase from environment");
            return Ok(SecretString::new(value));
        }

        debug!(var = %self.var, "passphrase variable unset, prompting");
        let message = format!("Enter passphrase to unlock {:?}", root.display().to_string());
        self.prompt.prompt(&message).map(SecretString::new)
    }
}

/// A provider that always returns the same passphrase.
#[derive(Debug, Clone)]
pub struct FixedPassphrase(SecretString);

impl FixedPassphrase {
    pub fn new(value: impl Into<SecretString>) -> Self {
        Self(value.into())
    }
}

impl PassphraseProvider for FixedPassphrase {
    fn acquire(&self, _root: &Path) -> Result<SecretString> {
        Ok(self.0.clone())
    }
}
