//! SonicPrep CLI
//!
//! Command-line interface for audio standardization and augmentation.

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sonicprep::cli::commands::{self, PrepOptions};
use sonicprep::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!("SonicPrep v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Prep {
            input,
            output,
            config,
            augment,
            vars,
            ir_dir,
            seed,
            skip_errors,
        } => {
            let options = PrepOptions {
                config,
                augment,
                vars,
                ir_dir,
                seed,
                skip_errors,
            };
            commands::prep(&input, &output, &options)
                .with_context(|| format!("prep failed for {}", input.display()))
        }
        Commands::Standardize {
            input,
            output,
            config,
        } => commands::standardize(&input, &output, config.as_deref())
            .with_context(|| format!("standardize failed for {}", input.display())),
    }
}
