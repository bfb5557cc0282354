//! Sample rate conversion
//!
//! Band-limited windowed-sinc resampling through `rubato`. The whole buffer
//! is converted in a single pass; the sinc filter's group delay is removed so
//! the output is time-aligned with the input and has exactly
//! `ceil(len * target / source)` samples.

use rubato::{
    Resampler as _, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
    WindowFunction,
};
use tracing::debug;

use crate::engine::AudioBuffer;
use crate::error::{Result, SonicPrepError};

/// Lowest accepted target sample rate in Hz
pub const MIN_TARGET_RATE: u32 = 40_000;

/// Highest accepted target sample rate in Hz
pub const MAX_TARGET_RATE: u32 = 120_000;

/// Sinc filter length in input samples
const SINC_LEN: usize = 128;

/// Resample `buffer` to `target_rate`
///
/// Convenience wrapper around [`Resampler`] without energy scaling.
///
/// # Errors
/// * `OutOfRange` - If `target_rate` is outside [40 000, 120 000] Hz
/// * `InvalidParameter` - If the buffer's own rate is zero
pub fn resample(buffer: &AudioBuffer, target_rate: u32) -> Result<AudioBuffer> {
    Resampler::new(target_rate)?.process(buffer)
}

/// Number of output samples produced for `len` input samples; zero when
/// `source_rate` is zero
pub fn output_length(len: usize, source_rate: u32, target_rate: u32) -> usize {
    if source_rate == 0 {
        return 0;
    }
    let numerator = len as u64 * target_rate as u64;
    numerator.div_ceil(source_rate as u64) as usize
}

/// Converts buffers to a fixed target sample rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resampler {
    target_rate: u32,
    energy_preserving: bool,
}

impl Resampler {
    /// Create a resampler for `target_rate`
    ///
    /// # Errors
    /// * `OutOfRange` - If `target_rate` is outside [40 000, 120 000] Hz
    pub fn new(target_rate: u32) -> Result<Self> {
        if !(MIN_TARGET_RATE..=MAX_TARGET_RATE).contains(&target_rate) {
            return Err(SonicPrepError::OutOfRange {
                param: "target_rate".to_string(),
                value: target_rate.to_string(),
                min: MIN_TARGET_RATE.to_string(),
                max: MAX_TARGET_RATE.to_string(),
            });
        }
        Ok(Self {
            target_rate,
            energy_preserving: false,
        })
    }

    /// Divide the output by `sqrt(target / source)` so total signal energy
    /// stays roughly constant across the rate change
    pub fn energy_preserving(mut self, enabled: bool) -> Self {
        self.energy_preserving = enabled;
        self
    }

    /// Target sample rate in Hz
    pub fn target_rate(&self) -> u32 {
        self.target_rate
    }

    /// Resample `buffer` from its own rate to the target rate
    pub fn process(&self, buffer: &AudioBuffer) -> Result<AudioBuffer> {
        let source_rate = buffer.sample_rate;
        if source_rate == 0 {
            return Err(SonicPrepError::invalid_parameter(
                "original_rate",
                source_rate,
                "> 0 Hz",
            ));
        }
        if source_rate == self.target_rate {
            return Ok(buffer.clone());
        }

        let ratio = self.target_rate as f64 / source_rate as f64;
        let out_len = output_length(buffer.len(), source_rate, self.target_rate);
        debug!(
            source_rate,
            target_rate = self.target_rate,
            in_len = buffer.len(),
            out_len,
            "resampling"
        );

        let mut samples = resample_channels(&buffer.samples, ratio, out_len)?;
        if self.energy_preserving {
            let scale = 1.0 / ratio.sqrt();
            for channel in &mut samples {
                for sample in channel.iter_mut() {
                    *sample = (*sample as f64 * scale) as f32;
                }
            }
        }

        Ok(AudioBuffer {
            samples,
            sample_rate: self.target_rate,
        })
    }
}

/// Resample every channel by `ratio` (output/input) to exactly `out_len`
/// samples, without any rate-band check
pub(crate) fn resample_channels(
    channels: &[Vec<f32>],
    ratio: f64,
    out_len: usize,
) -> Result<Vec<Vec<f32>>> {
    let in_len = channels.first().map(Vec::len).unwrap_or(0);
    if channels.is_empty() || in_len == 0 || out_len == 0 {
        return Ok(vec![Vec::new(); channels.len()]);
    }
    if !(ratio.is_finite() && ratio > 0.0) {
        return Err(SonicPrepError::invalid_parameter(
            "resample_ratio",
            ratio,
            "finite and > 0",
        ));
    }

    let params = SincInterpolationParameters {
        sinc_len: SINC_LEN,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Cubic,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris,
    };

    // Zero padding flushes the filter tail so the delayed output covers the
    // full signal.
    let padded_len = in_len + SINC_LEN + 8;
    let mut resampler = SincFixedIn::<f64>::new(ratio, 1.0, params, padded_len, channels.len())
        .map_err(|e| {
            SonicPrepError::invalid_parameter("resample_ratio", ratio, format!("accepted by resampler ({e})"))
        })?;

    let input: Vec<Vec<f64>> = channels
        .iter()
        .map(|ch| {
            let mut padded: Vec<f64> = ch.iter().map(|&s| s as f64).collect();
            padded.resize(padded_len, 0.0);
            padded
        })
        .collect();

    let output = resampler
        .process(&input, None)
        .map_err(|e| SonicPrepError::invalid_signal(format!("resampling failed: {e}")))?;

    let delay = resampler.output_delay();
    Ok(output
        .into_iter()
        .map(|ch| {
            let mut aligned: Vec<f32> = ch
                .iter()
                .skip(delay)
                .take(out_len)
                .map(|&s| s as f32)
                .collect();
            aligned.resize(out_len, 0.0);
            aligned
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generate_test_tone;
    use test_case::test_case;

    #[test_case(39_999 ; "just below band")]
    #[test_case(120_001 ; "just above band")]
    #[test_case(8_000 ; "far below band")]
    fn test_out_of_band_target_rejected(target: u32) {
        let buffer = generate_test_tone(440.0, 0.05, 44100);
        assert!(matches!(
            resample(&buffer, target),
            Err(SonicPrepError::OutOfRange { .. })
        ));
    }

    #[test_case(40_000 ; "lower edge")]
    #[test_case(120_000 ; "upper edge")]
    fn test_band_edges_accepted(target: u32) {
        let buffer = generate_test_tone(440.0, 0.05, 44100);
        let out = resample(&buffer, target).unwrap();
        assert_eq!(out.sample_rate, target);
        assert_eq!(out.len(), output_length(buffer.len(), 44100, target));
    }

    #[test]
    fn test_identity_when_rates_match() {
        let buffer = generate_test_tone(440.0, 0.1, 44100);
        let out = resample(&buffer, 44100).unwrap();
        assert_eq!(out, buffer);
    }

    #[test]
    fn test_output_length_is_ceiling() {
        assert_eq!(output_length(100, 44100, 48000), 109);
        assert_eq!(output_length(44100, 44100, 48000), 48000);
        assert_eq!(output_length(0, 44100, 48000), 0);
        assert_eq!(output_length(100, 0, 48000), 0);
    }

    #[test]
    fn test_zero_source_rate_rejected() {
        let buffer = AudioBuffer::mono(vec![0.1; 10], 0);
        assert!(matches!(
            resample(&buffer, 44100),
            Err(SonicPrepError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_preserves_tone_amplitude() {
        let buffer = generate_test_tone(1000.0, 0.5, 48000);
        let out = resample(&buffer, 44100).unwrap();
        // Ignore edges where the filter rings against the zero padding
        let middle = out.slice_frames(2000, out.len() - 2000);
        assert!((middle.peak() - 1.0).abs() < 0.02, "peak {}", middle.peak());
    }

    #[test]
    fn test_energy_preserving_scale() {
        let buffer = generate_test_tone(1000.0, 0.25, 40000);
        let plain = Resampler::new(80000).unwrap().process(&buffer).unwrap();
        let scaled = Resampler::new(80000)
            .unwrap()
            .energy_preserving(true)
            .process(&buffer)
            .unwrap();
        let expected = plain.samples[0][5000] / 2.0_f32.sqrt();
        assert!((scaled.samples[0][5000] - expected).abs() < 1e-5);
    }

    #[test]
    fn test_stereo_keeps_channels() {
        let buffer =
            AudioBuffer::from_channels(vec![vec![0.25; 4410], vec![-0.25; 4410]], 44100).unwrap();
        let out = resample(&buffer, 96000).unwrap();
        assert_eq!(out.channels(), 2);
        assert_eq!(out.len(), 9600);
    }
}
