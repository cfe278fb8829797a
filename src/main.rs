//! CLI entry point for CRBM feature learning and cluster evaluation

use clap::Parser;
use crbm::io::cli::{Cli, TrainingRunner};
use tracing_subscriber::EnvFilter;

fn main() -> crbm::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut runner = TrainingRunner::new(cli);
    runner.run().map(|_| ())
}
