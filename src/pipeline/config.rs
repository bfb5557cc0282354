//! Standardization pipeline configuration

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dsp::{LevelMetric, MAX_TARGET_RATE, MIN_TARGET_RATE};
use crate::error::{Result, SonicPrepError};

/// Parameters shared by every stage of the standardization pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Output sample rate in Hz, within [40 000, 120 000]
    pub target_sample_rate: u32,
    /// Loudness target in dB (energy) or LUFS (perceptual); must be <= 0
    pub target_level_db: f64,
    /// Metric the loudness target refers to
    pub level_metric: LevelMetric,
    /// Envelope threshold for silence trimming
    pub trim_threshold: f32,
    /// Chunk length in seconds
    pub chunk_duration_secs: f64,
    /// Butterworth prototype order
    pub filter_order: usize,
    /// Bandpass low cutoff in Hz
    pub filter_low_hz: f64,
    /// Bandpass high cutoff in Hz
    pub filter_high_hz: f64,
    /// Scale resampled output by `1/sqrt(target/source)`
    pub energy_preserving_resample: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 44100,
            target_level_db: -0.1,
            level_metric: LevelMetric::Energy,
            trim_threshold: 0.1,
            chunk_duration_secs: 30.0,
            filter_order: 4,
            filter_low_hz: 20.0,
            filter_high_hz: 20000.0,
            energy_preserving_resample: true,
        }
    }
}

impl PipelineConfig {
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

    /// Check the values that do not need a stage to be built
    ///
    /// Filter cutoffs are checked against the target rate when the
    /// [`Standardizer`](super::Standardizer) designs its filter.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_TARGET_RATE..=MAX_TARGET_RATE).contains(&self.target_sample_rate) {
            return Err(SonicPrepError::OutOfRange {
                param: "target_sample_rate".to_string(),
                value: self.target_sample_rate.to_string(),
                min: MIN_TARGET_RATE.to_string(),
                max: MAX_TARGET_RATE.to_string(),
            });
        }
        if !self.target_level_db.is_finite() || self.target_level_db > 0.0 {
            return Err(SonicPrepError::invalid_parameter(
                "target_level_db",
                self.target_level_db,
                "<= 0 dB",
            ));
        }
        if !self.trim_threshold.is_finite() || self.trim_threshold < 0.0 {
            return Err(SonicPrepError::invalid_parameter(
                "trim_threshold",
                self.trim_threshold,
                ">= 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.target_sample_rate, 44100);
        assert_eq!(config.target_level_db, -0.1);
        assert_eq!(config.level_metric, LevelMetric::Energy);
        assert_eq!(config.chunk_duration_secs, 30.0);
        assert_eq!(config.filter_order, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"target_sample_rate": 48000, "level_metric": "perceptual"}"#)
                .unwrap();
        assert_eq!(
            config,
            PipelineConfig {
                target_sample_rate: 48000,
                level_metric: LevelMetric::Perceptual,
                ..PipelineConfig::default()
            }
        );
    }

    #[test]
    fn test_unknown_metric_rejected() {
        let result: std::result::Result<PipelineConfig, _> =
            serde_json::from_str(r#"{"level_metric": "peak"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_rate = PipelineConfig {
            target_sample_rate: 22050,
            ..Default::default()
        };
        assert!(matches!(
            bad_rate.validate(),
            Err(SonicPrepError::OutOfRange { .. })
        ));

        let loud = PipelineConfig {
            target_level_db: 3.0,
            ..Default::default()
        };
        assert!(matches!(
            loud.validate(),
            Err(SonicPrepError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"chunk_duration_secs": 5.0}}"#).unwrap();
        let config = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(config.chunk_duration_secs, 5.0);

        let missing = PipelineConfig::load(Path::new("/nonexistent/pipeline.json"));
        assert!(matches!(missing, Err(SonicPrepError::FileNotFound { .. })));
    }
}
