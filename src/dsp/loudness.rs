//! Loudness measurement and normalization
//!
//! Two level metrics are supported:
//! - `energy`: `10·log10(mean(x²))` over every sample of every channel
//! - `perceptual`: ITU-R BS.1770 / EBU R128 gated integrated loudness (LUFS)
//!
//! Normalization is a single linear gain; it does not clip.

use std::fmt;
use std::str::FromStr;

use ebur128::{EbuR128, Mode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::AudioBuffer;
use crate::error::{Result, SonicPrepError};

/// Level metric used to measure and normalize loudness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelMetric {
    /// Mean-square energy in dB
    #[default]
    #[serde(alias = "rms")]
    Energy,
    /// Gated integrated loudness in LUFS
    #[serde(alias = "lufs")]
    Perceptual,
}

impl FromStr for LevelMetric {
    type Err = SonicPrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "energy" | "rms" => Ok(LevelMetric::Energy),
            "perceptual" | "lufs" => Ok(LevelMetric::Perceptual),
            _ => Err(SonicPrepError::invalid_parameter(
                "level_metric",
                s,
                "one of: energy, perceptual",
            )),
        }
    }
}

impl fmt::Display for LevelMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelMetric::Energy => write!(f, "energy"),
            LevelMetric::Perceptual => write!(f, "perceptual"),
        }
    }
}

/// Check that a buffer can be measured: non-empty, finite, not all silence
pub fn validate_signal(buffer: &AudioBuffer) -> Result<()> {
    if buffer.is_empty() {
        return Err(SonicPrepError::invalid_signal("buffer is empty"));
    }
    if !buffer.is_finite() {
        return Err(SonicPrepError::invalid_signal(
            "buffer contains NaN or infinite samples",
        ));
    }
    if buffer.mean_square() == 0.0 {
        return Err(SonicPrepError::invalid_signal("buffer is entirely silent"));
    }
    Ok(())
}

/// Measure the level of `buffer` in dB (energy) or LUFS (perceptual)
pub fn measure_level(buffer: &AudioBuffer, metric: LevelMetric) -> Result<f64> {
    validate_signal(buffer)?;
    match metric {
        LevelMetric::Energy => Ok(10.0 * buffer.mean_square().log10()),
        LevelMetric::Perceptual => integrated_loudness(buffer),
    }
}

fn integrated_loudness(buffer: &AudioBuffer) -> Result<f64> {
    let mut meter = EbuR128::new(buffer.channels() as u32, buffer.sample_rate, Mode::I)
        .map_err(|e| {
            SonicPrepError::invalid_parameter(
                "loudness_meter",
                format!("{} ch @ {} Hz", buffer.channels(), buffer.sample_rate),
                format!("a layout the loudness meter accepts ({e})"),
            )
        })?;

    meter
        .add_frames_f32(&buffer.to_interleaved())
        .map_err(|e| SonicPrepError::invalid_signal(format!("loudness analysis failed: {e}")))?;

    let lufs = meter
        .loudness_global()
        .map_err(|e| SonicPrepError::invalid_signal(format!("loudness analysis failed: {e}")))?;

    if !lufs.is_finite() {
        return Err(SonicPrepError::invalid_signal(
            "signal too short or too quiet for gated integrated loudness",
        ));
    }
    Ok(lufs)
}

/// Scales buffers so their measured level hits a target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnessNormalizer {
    target_level_db: f64,
    metric: LevelMetric,
}

impl LoudnessNormalizer {
    /// Create a normalizer
    ///
    /// # Errors
    /// * `InvalidParameter` - If `target_level_db` is positive or not finite
    pub fn new(target_level_db: f64, metric: LevelMetric) -> Result<Self> {
        if !target_level_db.is_finite() || target_level_db > 0.0 {
            return Err(SonicPrepError::invalid_parameter(
                "target_level_db",
                target_level_db,
                "<= 0 dB",
            ));
        }
        Ok(Self {
            target_level_db,
            metric,
        })
    }

    /// Target level in dB / LUFS
    pub fn target_level_db(&self) -> f64 {
        self.target_level_db
    }

    /// Metric used for measurement
    pub fn metric(&self) -> LevelMetric {
        self.metric
    }

    /// Return a copy of `buffer` scaled to the target level
    pub fn normalize(&self, buffer: &AudioBuffer) -> Result<AudioBuffer> {
        let current = measure_level(buffer, self.metric)?;
        let gain = 10.0_f64.powf((self.target_level_db - current) / 20.0);
        debug!(
            metric = %self.metric,
            current_db = current,
            target_db = self.target_level_db,
            gain,
            "normalizing"
        );

        let samples = buffer
            .samples
            .iter()
            .map(|ch| ch.iter().map(|&s| (s as f64 * gain) as f32).collect())
            .collect();
        Ok(buffer.with_samples(samples))
    }
}

/// Normalize `buffer` to `target_level_db` using `metric`
pub fn normalize(
    buffer: &AudioBuffer,
    target_level_db: f64,
    metric: LevelMetric,
) -> Result<AudioBuffer> {
    LoudnessNormalizer::new(target_level_db, metric)?.normalize(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generate_test_tone;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_energy_hits_target() {
        let buffer = generate_test_tone(440.0, 0.5, 44100);
        for target in [-0.1, -6.0, -20.0, -45.5] {
            let out = normalize(&buffer, target, LevelMetric::Energy).unwrap();
            let level = measure_level(&out, LevelMetric::Energy).unwrap();
            assert_abs_diff_eq!(level, target, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_energy_idempotent() {
        let buffer = generate_test_tone(220.0, 0.25, 44100);
        let once = normalize(&buffer, -12.0, LevelMetric::Energy).unwrap();
        let twice = normalize(&once, -12.0, LevelMetric::Energy).unwrap();
        let delta = measure_level(&twice, LevelMetric::Energy).unwrap()
            - measure_level(&once, LevelMetric::Energy).unwrap();
        assert_abs_diff_eq!(delta, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_perceptual_hits_target() {
        let buffer = generate_test_tone(1000.0, 2.0, 48000);
        let out = normalize(&buffer, -23.0, LevelMetric::Perceptual).unwrap();
        let level = measure_level(&out, LevelMetric::Perceptual).unwrap();
        assert_abs_diff_eq!(level, -23.0, epsilon = 1e-6);
    }

    #[test]
    fn test_perceptual_too_short() {
        let buffer = generate_test_tone(1000.0, 0.1, 48000);
        assert!(matches!(
            measure_level(&buffer, LevelMetric::Perceptual),
            Err(SonicPrepError::InvalidSignal { .. })
        ));
    }

    #[test]
    fn test_positive_target_rejected() {
        assert!(matches!(
            LoudnessNormalizer::new(0.5, LevelMetric::Energy),
            Err(SonicPrepError::InvalidParameter { .. })
        ));
        assert!(LoudnessNormalizer::new(0.0, LevelMetric::Energy).is_ok());
        assert!(LoudnessNormalizer::new(f64::NAN, LevelMetric::Energy).is_err());
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("energy".parse::<LevelMetric>().unwrap(), LevelMetric::Energy);
        assert_eq!("RMS".parse::<LevelMetric>().unwrap(), LevelMetric::Energy);
        assert_eq!(
            "perceptual".parse::<LevelMetric>().unwrap(),
            LevelMetric::Perceptual
        );
        assert!(matches!(
            "peak".parse::<LevelMetric>(),
            Err(SonicPrepError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_zero_crossings_are_not_silence() {
        // Ordinary zero-valued samples are fine; only whole-buffer silence is rejected
        let buffer = AudioBuffer::mono(vec![0.0, 0.5, 0.0, -0.5], 44100);
        assert!(normalize(&buffer, -3.0, LevelMetric::Energy).is_ok());
    }

    #[test]
    fn test_degenerate_signals_rejected() {
        let empty = AudioBuffer::mono(vec![], 44100);
        let silent = AudioBuffer::mono(vec![0.0; 100], 44100);
        let infinite = AudioBuffer::mono(vec![0.1, f32::INFINITY], 44100);
        let nan = AudioBuffer::mono(vec![0.1, f32::NAN], 44100);
        for buffer in [empty, silent, infinite, nan] {
            assert!(matches!(
                normalize(&buffer, -1.0, LevelMetric::Energy),
                Err(SonicPrepError::InvalidSignal { .. })
            ));
        }
    }

    #[test]
    fn test_no_clipping_guard() {
        // A loud target on a peaky signal is allowed to exceed full scale
        let mut samples = vec![0.001_f32; 1000];
        samples[500] = 0.5;
        let buffer = AudioBuffer::mono(samples, 44100);
        let out = normalize(&buffer, -0.1, LevelMetric::Energy).unwrap();
        assert!(out.peak() > 1.0);
    }
}
