//! Impulse response convolution
//!
//! The impulse response is resampled to the buffer rate, scaled to unit
//! energy, convolved with each channel via FFT and truncated to the input
//! length before the dry/wet blend.

use rand::Rng;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

use super::blend;
use crate::augment::effect::ParamRange;
use crate::augment::impulse::ImpulseLibrary;
use crate::dsp::resample::{output_length, resample_channels};
use crate::engine::AudioBuffer;
use crate::error::{Result, SonicPrepError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvolutionParams {
    pub mix: f64,
    /// Index into the impulse library
    pub impulse_index: usize,
    /// Name of the chosen impulse response
    pub impulse: String,
}

impl ConvolutionParams {
    pub const MIX: ParamRange = ParamRange::new(0.1, 1.0);

    /// Draw a mix and pick an impulse response uniformly
    ///
    /// # Errors
    /// * `DependencyFailure` - If the library is empty
    pub fn sample<R: Rng>(rng: &mut R, impulses: &ImpulseLibrary) -> Result<Self> {
        if impulses.is_empty() {
            return Err(no_impulses());
        }
        let mix = Self::MIX.sample(rng);
        let impulse_index = rng.gen_range(0..impulses.len());
        let impulse = impulses
            .get(impulse_index)
            .map(|i| i.name.clone())
            .unwrap_or_default();
        Ok(Self {
            mix,
            impulse_index,
            impulse,
        })
    }

    pub fn apply(&self, buffer: &AudioBuffer, impulses: &ImpulseLibrary) -> Result<AudioBuffer> {
        let ir = impulses.get(self.impulse_index).ok_or_else(no_impulses)?;
        if buffer.is_empty() {
            return Ok(buffer.clone());
        }
        let kernels = prepare_kernels(&ir.buffer, buffer.sample_rate)?;

        let samples = buffer
            .samples
            .iter()
            .enumerate()
            .map(|(c, channel)| {
                let kernel = &kernels[c % kernels.len()];
                let wet = fft_convolve(channel, kernel);
                channel
                    .iter()
                    .zip(wet)
                    .map(|(&dry, wet)| blend(dry, wet, self.mix))
                    .collect()
            })
            .collect();
        Ok(buffer.with_samples(samples))
    }
}

fn no_impulses() -> SonicPrepError {
    SonicPrepError::DependencyFailure {
        effect: "convolution".to_string(),
        reason: "no impulse response available".to_string(),
    }
}

/// Resample the impulse response to `sample_rate` and scale it to unit energy
fn prepare_kernels(ir: &AudioBuffer, sample_rate: u32) -> Result<Vec<Vec<f64>>> {
    let channels = if ir.sample_rate == sample_rate || ir.sample_rate == 0 {
        ir.samples.clone()
    } else {
        let len = output_length(ir.len(), ir.sample_rate, sample_rate).max(1);
        resample_channels(&ir.samples, sample_rate as f64 / ir.sample_rate as f64, len)?
    };

    let energy = channels
        .iter()
        .map(|ch| ch.iter().map(|&s| (s as f64).powi(2)).sum::<f64>())
        .fold(0.0_f64, f64::max);
    if !(energy > 0.0 && energy.is_finite()) {
        return Err(SonicPrepError::DependencyFailure {
            effect: "convolution".to_string(),
            reason: "impulse response is silent or not finite".to_string(),
        });
    }
    let scale = 1.0 / energy.sqrt();

    Ok(channels
        .iter()
        .map(|ch| ch.iter().map(|&s| s as f64 * scale).collect())
        .collect())
}

/// Linear convolution of `signal` with `kernel`, truncated to the signal length
fn fft_convolve(signal: &[f32], kernel: &[f64]) -> Vec<f64> {
    let fft_size = (signal.len() + kernel.len() - 1).next_power_of_two();
    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(fft_size);
    let inverse = planner.plan_fft_inverse(fft_size);

    let mut a: Vec<Complex<f64>> = signal
        .iter()
        .map(|&s| Complex::new(s as f64, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(fft_size)
        .collect();
    let mut b: Vec<Complex<f64>> = kernel
        .iter()
        .map(|&k| Complex::new(k, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(fft_size)
        .collect();

    forward.process(&mut a);
    forward.process(&mut b);
    for (x, y) in a.iter_mut().zip(&b) {
        *x *= *y;
    }
    inverse.process(&mut a);

    let norm = 1.0 / fft_size as f64;
    a.iter().take(signal.len()).map(|c| c.re * norm).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::effects::test_util::{assert_same_shape, stereo_tone};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn library(ir: Vec<f32>, rate: u32) -> ImpulseLibrary {
        ImpulseLibrary::from_buffers(vec![("ir".to_string(), AudioBuffer::mono(ir, rate))])
    }

    fn params(mix: f64) -> ConvolutionParams {
        ConvolutionParams {
            mix,
            impulse_index: 0,
            impulse: "ir".to_string(),
        }
    }

    #[test]
    fn test_dirac_is_identity() {
        let buffer = stereo_tone();
        let out = params(1.0).apply(&buffer, &library(vec![1.0], 44100)).unwrap();
        assert_same_shape(&out, &buffer);
        for (o, i) in out.samples[1].iter().zip(&buffer.samples[1]) {
            assert_relative_eq!(*o, *i, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_delayed_dirac_shifts_and_truncates() {
        let buffer = AudioBuffer::mono(vec![1.0, 2.0, 3.0, 4.0], 44100);
        let out = params(1.0)
            .apply(&buffer, &library(vec![0.0, 0.0, 0.5], 44100))
            .unwrap();
        let expected = [0.0, 0.0, 1.0, 2.0];
        for (o, e) in out.samples[0].iter().zip(expected) {
            assert_relative_eq!(*o, e, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_mix_blends_dry() {
        let buffer = AudioBuffer::mono(vec![1.0, 0.0, 0.0, 0.0], 44100);
        let out = params(0.5)
            .apply(&buffer, &library(vec![0.0, 1.0], 44100))
            .unwrap();
        let expected = [0.5, 0.5, 0.0, 0.0];
        for (o, e) in out.samples[0].iter().zip(expected) {
            assert_relative_eq!(*o, e, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_impulse_resampled_to_buffer_rate() {
        let buffer = stereo_tone();
        let ir: Vec<f32> = (0..480).map(|i| (-(i as f32) / 50.0).exp()).collect();
        let out = params(0.7).apply(&buffer, &library(ir, 48000)).unwrap();
        assert_same_shape(&out, &buffer);
        assert!(out.is_finite());
    }

    #[test]
    fn test_missing_impulse_is_dependency_failure() {
        let buffer = stereo_tone();
        assert!(matches!(
            params(0.5).apply(&buffer, &ImpulseLibrary::default()),
            Err(SonicPrepError::DependencyFailure { .. })
        ));
        let mut rng = StdRng::seed_from_u64(3);
        assert!(matches!(
            ConvolutionParams::sample(&mut rng, &ImpulseLibrary::default()),
            Err(SonicPrepError::DependencyFailure { .. })
        ));
    }

    #[test]
    fn test_silent_impulse_rejected() {
        let buffer = stereo_tone();
        assert!(matches!(
            params(0.5).apply(&buffer, &library(vec![0.0; 8], 44100)),
            Err(SonicPrepError::DependencyFailure { .. })
        ));
    }
}
