//! Lockbox command-line interface.

pub mod commands;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use lockbox_core::config::{Config, LogLevel, LoggingConfig};
use lockbox_core::env::vars;
use lockbox_core::paths;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Lockbox - passphrase-protected local secret storage
#[derive(Parser)]
#[command(name = "lockbox")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = "LOCKBOX_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Manage encrypted secrets
    Secrets(commands::secrets::SecretsArgs),

    /// Configuration management
    Config(commands::config::ConfigArgs),

    /// Show version information
    Version,
}

/// The config file in use: `--config`, else the default location.
pub fn config_path(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => paths::config_file().context("cannot locate config file"),
    }
}

/// Load and validate the configuration. A missing file yields defaults.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let path = config_path(explicit)?;
    let config = Config::load_or_default(&path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    Ok(config)
}

/// Pick the default log filter from `-v` flags and the configured level.
pub fn default_filter(verbose: u8, logging: &LoggingConfig) -> String {
    let level = match verbose {
        0 => logging.level,
        1 => LogLevel::Info,
        2 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };
    level.as_str().to_string()
}

/// Install the global tracing subscriber, logging to stderr.
///
/// `LOCKBOX_LOG` (then `RUST_LOG`) overrides the computed default filter.
pub fn init_tracing(verbose: u8, logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_env(vars::LOCKBOX_LOG)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose, logging)));

    let (json, text) = if logging.json {
        (
            Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
            None,
        )
    } else {
        (
            None,
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .init();
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    match cli.command {
        Commands::Secrets(args) => commands::secrets::run(args, &config).await,
        Commands::Config(args) => {
            let path = config_path(cli.config.as_deref())?;
            commands::config::run(args, &path, &config).await
        }
        Commands::Version => {
            println!("lockbox {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
