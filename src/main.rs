//! Channel capacity estimator - command line entry point

use channel_capacity::cli::{cmd_capacity, cmd_mi, cmd_simulate, cmd_weighted, Cli, Commands};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "channel_capacity=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Mi { args } => cmd_mi(&args)?,
        Commands::Weighted { args, weights } => cmd_weighted(&args, &weights)?,
        Commands::Capacity { args, iterations, learning_rate } => {
            cmd_capacity(&args, iterations, learning_rate)?
        }
        Commands::Simulate { output, inputs, sigma, seed } => {
            cmd_simulate(&output, &inputs, sigma, seed)?
        }
    }

    Ok(())
}
