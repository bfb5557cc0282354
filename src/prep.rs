//! Batch Preparation
//!
//! Drives whole directories through the standardization pipeline and,
//! optionally, the augmenter:
//!
//! ```text
//! find files → batches → decode → standardize → export
//!                                      └→ augment → re-standardize → export
//! ```
//!
//! Every run writes a `manifest.json` next to the exported WAV files,
//! recording the run id, the seed, the effective configuration, one record
//! per source with its SHA-256 and outputs, and any skipped failures.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::augment::{Augmenter, AugmenterConfig, EffectSpec};
use crate::cancel::CancelToken;
use crate::engine::{
    export_audio, file_batches, find_audio_files, import_audio, ExportFormat,
    ACCEPTED_EXTENSIONS,
};
use crate::error::{Result, SonicPrepError};
use crate::pipeline::{PipelineConfig, Standardizer, Variation, VariationSummary};

/// File name of the run manifest inside the output directory
pub const MANIFEST_FILE: &str = "manifest.json";

// ============================================================================
// Configuration
// ============================================================================

/// What to do when a source file fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    /// Stop the run and return the error
    #[default]
    Abort,
    /// Log the error, record it in the manifest and continue
    Skip,
}

/// Batch run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    pub output_dir: PathBuf,
    pub pipeline: PipelineConfig,
    /// Augmentation settings; `None` disables augmentation
    pub augment: Option<AugmenterConfig>,
    /// Files decoded per batch
    pub batch_size: usize,
    pub on_error: OnError,
    /// Augmentation seed; drawn from entropy and recorded when absent
    pub seed: Option<u64>,
    /// Source extensions, matched case-insensitively
    pub extensions: Vec<String>,
    /// Exported WAV bit depth: 16, 24 or 32 (float). Integer depths saturate
    /// at full scale, so only 32 keeps the headroom of hot normalization targets
    pub bit_depth: u16,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            pipeline: PipelineConfig::default(),
            augment: None,
            batch_size: 10,
            on_error: OnError::Abort,
            seed: None,
            extensions: ACCEPTED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            bit_depth: 32,
        }
    }
}

impl PrepConfig {
    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| SonicPrepError::FileNotFound {
            path: path.display().to_string(),
            source: Some(e),
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;
        if self.batch_size == 0 {
            return Err(SonicPrepError::invalid_parameter("batch_size", 0, ">= 1"));
        }
        if self.extensions.is_empty() {
            return Err(SonicPrepError::invalid_parameter(
                "extensions",
                "[]",
                "at least one extension",
            ));
        }
        if !matches!(self.bit_depth, 16 | 24 | 32) {
            return Err(SonicPrepError::invalid_parameter(
                "bit_depth",
                self.bit_depth,
                "16, 24 or 32",
            ));
        }
        if let Some(augment) = &self.augment {
            if augment.variants_per_combination == 0 {
                return Err(SonicPrepError::invalid_parameter(
                    "variants_per_combination",
                    0,
                    ">= 1",
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Manifest
// ============================================================================

/// One exported WAV file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// File name relative to the output directory
    pub file: String,
    #[serde(flatten)]
    pub variation: VariationSummary,
    /// Effect chain that produced the file; empty for plain variations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<EffectSpec>,
}

/// Everything produced from one source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub source: PathBuf,
    pub sha256: String,
    pub sample_rate: u32,
    pub channels: usize,
    pub outputs: Vec<OutputRecord>,
    /// Augmented buffers dropped because they could not be re-standardized
    #[serde(default)]
    pub discarded: usize,
}

/// A source skipped under [`OnError::Skip`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub source: PathBuf,
    pub code: String,
    pub message: String,
}

/// Summary of a preparation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub seed: u64,
    pub config: PrepConfig,
    pub sources: Vec<SourceRecord>,
    #[serde(default)]
    pub failures: Vec<FailureRecord>,
}

impl Manifest {
    /// Total number of exported files
    pub fn output_count(&self) -> usize {
        self.sources.iter().map(|s| s.outputs.len()).sum()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| SonicPrepError::FileNotFound {
            path: path.display().to_string(),
            source: Some(e),
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Hex SHA-256 of a file's contents
pub fn file_sha256(path: &Path) -> Result<String> {
    let content = fs::read(path).map_err(|e| SonicPrepError::FileNotFound {
        path: path.display().to_string(),
        source: Some(e),
    })?;
    Ok(format!("{:x}", Sha256::digest(&content)))
}

// ============================================================================
// Prepper
// ============================================================================

/// Batch driver over the standardizer and augmenter
#[derive(Debug)]
pub struct Prepper {
    config: PrepConfig,
    standardizer: Standardizer,
    augmenter: Option<Augmenter>,
}

impl Prepper {
    /// Build the pipeline stages, loading impulse responses if augmentation
    /// is enabled
    pub fn new(config: PrepConfig) -> Result<Self> {
        config.validate()?;
        let standardizer = Standardizer::new(config.pipeline.clone())?;
        let augmenter = config.augment.as_ref().map(Augmenter::new).transpose()?;
        Ok(Self {
            config,
            standardizer,
            augmenter,
        })
    }

    /// Replace the augmenter, e.g. one with a restricted roster
    pub fn with_augmenter(mut self, augmenter: Option<Augmenter>) -> Self {
        self.augmenter = augmenter;
        self
    }

    pub fn config(&self) -> &PrepConfig {
        &self.config
    }

    /// Process every matching file in `input_dir`
    pub fn run(&self, input_dir: &Path) -> Result<Manifest> {
        self.run_with_cancel(input_dir, &CancelToken::new())
    }

    /// Like [`run`](Self::run), stopping with `Cancelled` once `cancel` fires
    pub fn run_with_cancel(&self, input_dir: &Path, cancel: &CancelToken) -> Result<Manifest> {
        let files = find_audio_files(input_dir, &self.config.extensions)?;
        fs::create_dir_all(&self.config.output_dir)?;

        let seed = self.config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let run_id = Uuid::new_v4();

        let span = info_span!("prep", %run_id, files = files.len());
        let _enter = span.enter();
        info!(seed, output = %self.config.output_dir.display(), "starting run");

        let mut sources = Vec::new();
        let mut failures = Vec::new();
        let batches = files.len().div_ceil(self.config.batch_size);

        for (batch_index, batch) in file_batches(&files, self.config.batch_size).enumerate() {
            info!(batch = batch_index + 1, of = batches, size = batch.len(), "processing batch");
            for path in batch {
                cancel.check()?;
                match self.process_file(path, &mut rng, cancel) {
                    Ok(record) => sources.push(record),
                    Err(e) if self.config.on_error == OnError::Skip && e.is_recoverable() => {
                        warn!(source = %path.display(), code = e.error_code(), error = %e, "skipping source");
                        failures.push(FailureRecord {
                            source: path.clone(),
                            code: e.error_code().to_string(),
                            message: e.to_string(),
                        });
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        let manifest = Manifest {
            run_id,
            generated_at: Utc::now(),
            seed,
            config: self.config.clone(),
            sources,
            failures,
        };
        manifest.save(&self.config.output_dir.join(MANIFEST_FILE))?;
        info!(
            outputs = manifest.output_count(),
            failures = manifest.failures.len(),
            "run complete"
        );
        Ok(manifest)
    }

    /// Standardize, augment and export a single source file
    pub fn process_file(
        &self,
        path: &Path,
        rng: &mut StdRng,
        cancel: &CancelToken,
    ) -> Result<SourceRecord> {
        let sha256 = file_sha256(path)?;
        let buffer = import_audio(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());

        let mut record = SourceRecord {
            source: path.to_path_buf(),
            sha256,
            sample_rate: buffer.sample_rate,
            channels: buffer.channels(),
            outputs: Vec::new(),
            discarded: 0,
        };

        let variations = self
            .standardizer
            .standardize_with_cancel(&name, &buffer, cancel)?;
        for variation in &variations {
            record.outputs.push(self.export(variation, Vec::new())?);
        }

        if let Some(augmenter) = &self.augmenter {
            for variation in &variations {
                self.augment_variation(augmenter, variation, rng, cancel, &mut record)?;
            }
        }

        info!(source = %name, outputs = record.outputs.len(), discarded = record.discarded, "source done");
        Ok(record)
    }

    fn augment_variation(
        &self,
        augmenter: &Augmenter,
        variation: &Variation,
        rng: &mut StdRng,
        cancel: &CancelToken,
        record: &mut SourceRecord,
    ) -> Result<()> {
        let mut index = 0usize;
        augmenter.for_each_combination(variation.data(), rng, Some(cancel), |augmented| {
            let name = format!("{}_aug_{}", variation.name(), index);
            index += 1;
            match self.standardizer.standardize(&name, &augmented.data) {
                Ok(restandardized) => {
                    for v in &restandardized {
                        let exported = self.export(v, augmented.specs.clone())?;
                        record.outputs.push(exported);
                    }
                    Ok(())
                }
                // Effects such as a 1-bit crush can leave nothing to normalize
                Err(SonicPrepError::InvalidSignal { reason }) => {
                    warn!(variation = %name, %reason, "discarding augmented buffer");
                    record.discarded += 1;
                    Ok(())
                }
                Err(e) => Err(e),
            }
        })
    }

    fn export(&self, variation: &Variation, effects: Vec<EffectSpec>) -> Result<OutputRecord> {
        let file = format!("{}.wav", variation.name());
        let format = ExportFormat {
            bit_depth: self.config.bit_depth,
        };
        export_audio(variation.data(), &self.config.output_dir.join(&file), format)?;
        Ok(OutputRecord {
            file,
            variation: variation.summary(),
            effects,
        })
    }
}
