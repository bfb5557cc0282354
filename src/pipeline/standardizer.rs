//! Fixed-order standardization: resample → normalize → trim → filter → chunk

use tracing::{debug, info_span};

use super::config::PipelineConfig;
use super::variation::{chunk_name, Variation};
use crate::cancel::CancelToken;
use crate::dsp::{trim, BandpassFilter, Chunker, LoudnessNormalizer, Resampler};
use crate::engine::AudioBuffer;
use crate::error::Result;

/// Runs buffers through the standardization pipeline
///
/// All stages are built once from the [`PipelineConfig`]; `standardize` can
/// then be called any number of times and keeps no state between calls.
#[derive(Debug, Clone)]
pub struct Standardizer {
    config: PipelineConfig,
    resampler: Resampler,
    normalizer: LoudnessNormalizer,
    filter: BandpassFilter,
    chunker: Chunker,
}

impl Standardizer {
    /// Validate `config` and build every stage
    ///
    /// # Errors
    /// * `OutOfRange` - If the target rate is outside the resampler band
    /// * `InvalidParameter` - If the level, filter band or chunk duration is invalid
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let resampler = Resampler::new(config.target_sample_rate)?
            .energy_preserving(config.energy_preserving_resample);
        let normalizer = LoudnessNormalizer::new(config.target_level_db, config.level_metric)?;
        let filter = BandpassFilter::new(
            config.filter_order,
            config.target_sample_rate,
            config.filter_low_hz,
            config.filter_high_hz,
        )?;
        let chunker = Chunker::new(config.chunk_duration_secs, config.target_sample_rate)?;

        Ok(Self {
            config,
            resampler,
            normalizer,
            filter,
            chunker,
        })
    }

    /// Configuration the stages were built from
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Standardize `buffer` into named variations
    ///
    /// Returns the chunks (`{name}_chunk_{i}`) in order, followed by the whole
    /// filtered signal named `name`. Stage errors are returned unchanged.
    pub fn standardize(&self, name: &str, buffer: &AudioBuffer) -> Result<Vec<Variation>> {
        self.run(name, buffer, None)
    }

    /// Like [`standardize`](Self::standardize), checking `cancel` between stages
    pub fn standardize_with_cancel(
        &self,
        name: &str,
        buffer: &AudioBuffer,
        cancel: &CancelToken,
    ) -> Result<Vec<Variation>> {
        self.run(name, buffer, Some(cancel))
    }

    fn run(
        &self,
        name: &str,
        buffer: &AudioBuffer,
        cancel: Option<&CancelToken>,
    ) -> Result<Vec<Variation>> {
        let _span = info_span!("standardize", name).entered();
        let checkpoint = || cancel.map_or(Ok(()), CancelToken::check);

        checkpoint()?;
        let resampled = self.resampler.process(buffer)?;
        debug!(
            from = buffer.sample_rate,
            to = resampled.sample_rate,
            len = resampled.len(),
            "resampled"
        );

        checkpoint()?;
        let normalized = self.normalizer.normalize(&resampled)?;

        checkpoint()?;
        let trimmed = trim(&normalized, self.config.trim_threshold)?;
        debug!(before = normalized.len(), after = trimmed.len(), "trimmed");

        checkpoint()?;
        let filtered = self.filter.filter(&trimmed)?;

        checkpoint()?;
        let chunks = self.chunker.chunk(&filtered);
        debug!(chunks = chunks.len(), "chunked");

        let mut variations: Vec<Variation> = chunks
            .into_iter()
            .enumerate()
            .map(|(i, data)| Variation::new(name, chunk_name(name, i), data))
            .collect();
        variations.push(Variation::new(name, name, filtered));
        Ok(variations)
    }
}
