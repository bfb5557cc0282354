//! CLI Module
//!
//! Command-line interface for SonicPrep.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SonicPrep - audio standardization and augmentation for ML datasets
#[derive(Parser, Debug)]
#[command(name = "sonicprep")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Standardize (and optionally augment) every audio file in a directory
    #[command(name = "prep")]
    Prep {
        /// Directory holding the source audio files
        input: PathBuf,

        /// Output directory for WAV files and the manifest
        #[arg(short, long)]
        output: PathBuf,

        /// JSON run configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Run combinatorial augmentation on every variation
        #[arg(long)]
        augment: bool,

        /// Augmented variants per effect combination
        #[arg(long)]
        vars: Option<usize>,

        /// Directory of impulse responses for convolution
        #[arg(long)]
        ir_dir: Option<PathBuf>,

        /// Seed for reproducible augmentation
        #[arg(long)]
        seed: Option<u64>,

        /// Skip files that fail instead of aborting
        #[arg(long)]
        skip_errors: bool,
    },

    /// Standardize a single audio file
    #[command(name = "standardize")]
    Standardize {
        /// Source audio file
        input: PathBuf,

        /// Output directory for the variations
        #[arg(short, long)]
        output: PathBuf,

        /// JSON pipeline configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
