//! Configuration loading and persistence.

use super::Config;
use crate::error::ConfigError;
use crate::paths;
use std::fs;
use std::path::Path;
use tracing::debug;

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = paths::config_file()?;
        Self::load(&path)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        debug!(path = %path.display(), "loaded config file");
        Self::parse(&content)
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    ///
    /// Unlike a missing file, a file that exists but cannot be parsed is an error.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Save configuration to the default path.
    pub fn save_default(&self) -> Result<(), ConfigError> {
        let path = paths::config_file()?;
        self.save(&path)
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Serialize to a JSON5-compatible string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // json5 has no serializer; plain JSON is valid JSON5.
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        let backend = &self.backend;

        if backend.root.trim().is_empty() {
            errors.push("backend.root must not be empty".to_string());
        }

        if backend.passphrase_env.is_empty() {
            errors.push("backend.passphrase_env must not be empty".to_string());
        } else if backend.passphrase_env.contains('=') || backend.passphrase_env.contains('\0') {
            errors.push(format!(
                "backend.passphrase_env is not a valid variable name: {:?}",
                backend.passphrase_env
            ));
        }

        let kdf = &backend.kdf;
        if kdf.iterations == 0 {
            errors.push("backend.kdf.iterations must be at least 1".to_string());
        }
        if kdf.parallelism == 0 {
            errors.push("backend.kdf.parallelism must be at least 1".to_string());
        }
        // Argon2 requires at least 8 KiB per lane.
        if kdf.memory_kib < 8 * kdf.parallelism.max(1) {
            errors.push(format!(
                "backend.kdf.memory_kib must be at least {} for parallelism {}",
                8 * kdf.parallelism.max(1),
                kdf.parallelism
            ));
        }
        if kdf.memory_kib > kdf.max_memory_kib {
            errors.push(format!(
                "backend.kdf.memory_kib ({}) exceeds backend.kdf.max_memory_kib ({})",
                kdf.memory_kib, kdf.max_memory_kib
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }
}
