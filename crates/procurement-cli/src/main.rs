//! Procurement CLI
//!
//! Supplier discovery and quote benchmarking from the command line.

use anyhow::Result;
use clap::Parser;
use procurement_core::error::exit_codes;
use procurement_core::{Config, ProcurementError, Services};
use std::process::ExitCode;

mod app;
mod commands;
mod output;

use app::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let code = e
                .downcast_ref::<ProcurementError>()
                .map(ProcurementError::exit_code)
                .unwrap_or(exit_codes::GENERAL_ERROR);
            ExitCode::from(code as u8)
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    // Reject bad input before touching config or the network
    let request = match cli.command {
        Commands::Analyze(ref args) => commands::Request::Analyze(commands::analyze::query(args)?),
        Commands::Benchmark(ref args) => {
            commands::Request::Benchmark(commands::benchmark::request(args)?)
        }
    };

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let services = Services::from_config(&config)?;

    tokio::select! {
        result = commands::execute(request, &services, cli.format) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, cancelling in-flight request");
            Err(anyhow::anyhow!("interrupted"))
        }
    }
}
