//! Synapse - living knowledge graph analysis for source repositories.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = synapse_cli::cli::Cli::parse();
    synapse_cli::cli::run(cli)
}
