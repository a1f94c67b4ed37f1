//! fsearch - parallel recursive directory walker
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use fsearch::config::{CliArgs, WalkConfig};
use fsearch::walk::WalkCoordinator;
use std::io;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();

    setup_logging(args.verbose);

    let config = WalkConfig::from_args(args).context("Invalid configuration")?;

    let coordinator = WalkCoordinator::new(config);
    coordinator
        .run(io::stdout(), io::stderr())
        .context("Walk failed")?;

    // Per-subtree errors were already written to stderr during the walk;
    // only a fatal root failure reaches the error path above.
    Ok(())
}

fn setup_logging(verbose: bool) {
    // Results stream on stdout; diagnostics stay on stderr and are quiet
    // unless -v is given.
    let filter = if verbose {
        EnvFilter::new("fsearch=debug,warn")
    } else {
        EnvFilter::new("fsearch=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
