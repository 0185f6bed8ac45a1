//! Ironwatch CLI entry point
//!
//! Parses arguments, initialises logging, and dispatches to command
//! handlers. Errors are printed to stderr and mapped to process exit
//! codes via [`CliError::exit_code`].

mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.log_level.as_deref());

    if let Err(e) = run(cli).await {
        eprintln!("error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Rules(args) => commands::rules::execute(args, &cli.config, &writer).await,
        Commands::Map(args) => commands::map::execute(args, &cli.config, &writer).await,
        Commands::Diagnose(args) => commands::diagnose::execute(args, &cli.config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}

/// Initialise tracing output to stderr.
///
/// Command output owns stdout, so logs must not interleave with it.
/// Precedence: `--log-level` flag, then `RUST_LOG`, then `warn`.
fn init_logging(level_override: Option<&str>) {
    let filter = level_override
        .map(ToOwned::to_owned)
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "warn".to_owned());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
