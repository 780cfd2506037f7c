//! Lockbox CLI entry point.

use clap::Parser;
use lockbox_cli::{init_tracing, load_config, run, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(cli.verbose, &config.logging);

    run(cli, config).await
}
