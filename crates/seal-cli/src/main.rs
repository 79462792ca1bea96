//! seal - offline evidence-pack verifier.
//!
//! CLI for auditing exported governed-decision trails without trusting or
//! reaching the issuing kernel.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

/// seal - offline evidence-pack verifier
#[derive(Parser, Debug)]
#[command(name = "seal")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify an evidence pack against a key registry
    Verify(commands::verify::VerifyArgs),

    /// Print an evidence pack's manifest without verifying
    Inspect(commands::inspect::InspectArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Verify(args) => commands::verify::run(&args),
        Commands::Inspect(args) => commands::inspect::run(&args),
    }
}
