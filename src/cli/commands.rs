//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::augment::AugmenterConfig;
use crate::engine::{export_audio, import_audio, ExportFormat};
use crate::error::Result;
use crate::pipeline::{PipelineConfig, Standardizer};
use crate::prep::{OnError, PrepConfig, Prepper};

/// Command-line overrides for a `prep` run
#[derive(Debug, Clone, Default)]
pub struct PrepOptions {
    pub config: Option<PathBuf>,
    pub augment: bool,
    pub vars: Option<usize>,
    pub ir_dir: Option<PathBuf>,
    pub seed: Option<u64>,
    pub skip_errors: bool,
}

impl PrepOptions {
    /// Merge the overrides into a configuration loaded from `config` (or the
    /// defaults)
    pub fn resolve(&self, output: &Path) -> Result<PrepConfig> {
        let mut config = match &self.config {
            Some(path) => PrepConfig::load(path)?,
            None => PrepConfig::default(),
        };
        config.output_dir = output.to_path_buf();

        let wants_augment = self.augment || self.vars.is_some() || self.ir_dir.is_some();
        if wants_augment {
            let augment = config.augment.get_or_insert_with(AugmenterConfig::default);
            if let Some(vars) = self.vars {
                augment.variants_per_combination = vars;
            }
            if let Some(dir) = &self.ir_dir {
                augment.ir_dir = dir.clone();
            }
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.skip_errors {
            config.on_error = OnError::Skip;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Standardize (and optionally augment) every file in `input`.
pub fn prep(input: &Path, output: &Path, options: &PrepOptions) -> Result<()> {
    info!(input = %input.display(), output = %output.display(), "prep");

    let config = options.resolve(output)?;
    let prepper = Prepper::new(config)?;
    let manifest = prepper.run(input)?;

    println!("Run {}", manifest.run_id);
    println!("Seed: {}", manifest.seed);
    println!("Sources processed: {}", manifest.sources.len());
    println!("Files written: {}", manifest.output_count());
    if !manifest.failures.is_empty() {
        println!("\n--- Skipped ---");
        for failure in &manifest.failures {
            println!("{} [{}] {}", failure.source.display(), failure.code, failure.message);
        }
    }

    Ok(())
}

/// Standardize a single file into `output`.
pub fn standardize(input: &Path, output: &Path, config: Option<&Path>) -> Result<()> {
    info!(input = %input.display(), "standardize");

    let config = match config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    let standardizer = Standardizer::new(config)?;

    let buffer = import_audio(input)?;
    let name = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string());

    fs::create_dir_all(output)?;
    let variations = standardizer.standardize(&name, &buffer)?;
    for variation in &variations {
        let path = output.join(format!("{}.wav", variation.name()));
        export_audio(variation.data(), &path, ExportFormat::max_quality())?;
        println!(
            "{} ({:.2}s, {} ch, {} Hz)",
            path.display(),
            variation.data().duration_secs(),
            variation.data().channels(),
            variation.data().sample_rate
        );
    }

    Ok(())
}
