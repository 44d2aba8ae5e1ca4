//! archscore - structural health analysis CLI
//!
//! Builds a module dependency graph from a parsed module manifest and
//! scores the project's architecture and hygiene.

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    // Initialize logging; stdout is reserved for the JSON result
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = cli::Cli::parse();
    cli::run(cli)
}
