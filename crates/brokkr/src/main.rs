//! Brokkr CLI - Java runtime discovery and management
//!
//! This is the main entry point for the Brokkr command-line interface.

mod cli;
mod commands;
mod context;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    match &cli.command {
        Commands::List(args) => commands::list::run(args, &cli).await,
        Commands::Probe(args) => commands::probe::run(args, &cli),
        Commands::Select(args) => commands::select::run(args, &cli).await,
        Commands::Add(args) => commands::runtime::add(args, &cli).await,
        Commands::Remove(args) => commands::runtime::remove(args, &cli),
        Commands::Install(args) => commands::store::install(args, &cli).await,
        Commands::Uninstall(args) => commands::store::uninstall(args, &cli),
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
