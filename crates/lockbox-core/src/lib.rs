//! # lockbox-core
//!
//! Shared building blocks for the Lockbox crates:
//!
//! - **Configuration**: Loading, validation, and persistence of the config file
//! - **Paths**: Home-directory shorthand expansion and default locations
//! - **Secrets**: A zeroize-on-drop string for passphrases and plaintext
//! - **Environment**: Small helpers around process environment variables

pub mod config;
pub mod env;
pub mod error;
pub mod paths;
pub mod secret;

// Re-exports for convenience
pub use config::Config;
pub use error::ConfigError;
pub use secret::SecretString;
