//! Secret management commands.
//!
//! Provides `lockbox secrets get|set|delete|exists|path|inspect` on top of the
//! encrypted-file backend from `lockbox-secrets`.

use anyhow::Context;
use clap::Args;
use lockbox_core::Config;
use lockbox_secrets::envelope;
use lockbox_secrets::{FileBackend, FileStore, SecretBackend, SecretError};
use tracing::debug;

/// Namespace used when `--namespace` is not given.
pub const DEFAULT_NAMESPACE: &str = "lockbox";

/// Secrets command arguments.
#[derive(Args)]
pub struct SecretsArgs {
    #[command(subcommand)]
    pub command: SecretsCommand,
}

#[derive(clap::Subcommand)]
pub enum SecretsCommand {
    /// Retrieve and print a decrypted secret
    Get {
        /// Secret key (`/` nests it in a sub-directory)
        key: String,

        /// Namespace (does not affect where the secret is stored)
        #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,
    },

    /// Store a secret (prompts for the value)
    Set {
        /// Secret key
        key: String,

        /// Namespace
        #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,

        /// Secret value (if omitted, prompts for hidden input)
        #[arg(long)]
        value: Option<String>,
    },

    /// Delete a secret
    Delete {
        /// Secret key
        key: String,

        /// Namespace
        #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,
    },

    /// Print `yes` if a secret is stored, fail otherwise
    Exists {
        /// Secret key
        key: String,
    },

    /// Print the file a key is stored in
    Path {
        /// Secret key
        key: String,
    },

    /// Show envelope metadata for a stored secret without decrypting it
    Inspect {
        /// Secret key
        key: String,
    },
}

/// Turn the not-found sentinel into a user-facing message.
fn describe(err: SecretError, key: &str) -> anyhow::Error {
    match err {
        SecretError::NotFound(_) => anyhow::anyhow!("No secret stored for '{key}'"),
        other => anyhow::Error::new(other),
    }
}

/// Run the secrets command.
pub async fn run(args: SecretsArgs, config: &Config) -> anyhow::Result<()> {
    let backend = FileBackend::from_config(&config.backend);
    debug!(root = %config.backend.root, "using encrypted-file backend");

    match args.command {
        SecretsCommand::Get { key, namespace } => {
            let secret = backend
                .get(&namespace, &key)
                .await
                .map_err(|e| describe(e, &key))?;

            println!("{}", secret.expose());
        }

        SecretsCommand::Set {
            key,
            namespace,
            value,
        } => {
            let secret_value = match value {
                Some(v) => v,
                None => {
                    let prompt = format!("Enter value for '{key}': ");
                    rpassword::prompt_password(prompt).context("Failed to read secret")?
                }
            };

            backend
                .set(&namespace, &key, &secret_value)
                .await
                .map_err(|e| describe(e, &key))?;

            println!("Secret '{}' stored.", key);
        }

        SecretsCommand::Delete { key, namespace } => {
            backend
                .delete(&namespace, &key)
                .await
                .map_err(|e| describe(e, &key))?;

            println!("Secret '{}' deleted.", key);
        }

        SecretsCommand::Exists { key } => {
            let found = backend
                .exists(DEFAULT_NAMESPACE, &key)
                .await
                .map_err(|e| describe(e, &key))?;

            if !found {
                return Err(describe(SecretError::NotFound(key.clone()), &key));
            }
            println!("yes");
        }

        SecretsCommand::Path { key } => {
            let path = backend.path_for(&key).await.map_err(|e| describe(e, &key))?;
            println!("{}", path.display());
        }

        SecretsCommand::Inspect { key } => {
            let path = backend.path_for(&key).await.map_err(|e| describe(e, &key))?;
            let bytes = FileStore::new()
                .read(&path)
                .await
                .map_err(|e| describe(e, &key))?;
            let token = String::from_utf8(bytes)
                .with_context(|| format!("{} does not hold a token", path.display()))?;
            let info = envelope::inspect(&token)?;

            println!("{:<12} {}", "FILE", path.display());
            println!("{:<12} {}", "KEY ALG", info.key_alg);
            println!("{:<12} {}", "CONTENT ALG", info.content_alg);
            println!(
                "{:<12} m={} KiB, t={}, p={}",
                "KDF", info.kdf.memory_kib, info.kdf.iterations, info.kdf.parallelism
            );
            match info.created {
                Some(created) => {
                    println!("{:<12} {}", "CREATED", created.format("%Y-%m-%d %H:%M:%S UTC"))
                }
                None => println!("{:<12} unknown", "CREATED"),
            }
        }
    }

    Ok(())
}
