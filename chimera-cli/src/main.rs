//! Chimera CLI - Command-line interface
//!
//! Commands:
//! - simulate: Autoplay a scenario to the end
//! - path: Query a path on an empty board

mod path_cmd;
mod simulate;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chimera")]
#[command(about = "Hex-grid tactics simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Autoplay a scenario with the tactical AI on both sides
    Simulate(simulate::SimulateArgs),
    /// Find a path between two tiles on an empty board
    Path(path_cmd::PathArgs),
}

fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate(args) => simulate::run(args),
        Commands::Path(args) => path_cmd::run(args),
    }
}
