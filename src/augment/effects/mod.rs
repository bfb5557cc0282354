//! Augmentation effect implementations
//!
//! Each effect is a parameter struct with its range table, a `sample`
//! constructor and an `apply` function. Nothing is carried between calls.

mod bitcrush;
mod chorus;
mod clipping;
mod compressor;
mod convolution;
mod delay;
mod gain;
mod limiter;
mod phaser;
mod pitch_shift;
mod resampling;

pub use bitcrush::BitcrushParams;
pub use chorus::ChorusParams;
pub use clipping::ClippingParams;
pub use compressor::CompressorParams;
pub use convolution::ConvolutionParams;
pub use delay::DelayParams;
pub use gain::GainParams;
pub use limiter::LimiterParams;
pub use phaser::PhaserParams;
pub use pitch_shift::PitchShiftParams;
pub use resampling::ResamplingParams;

use crate::engine::AudioBuffer;

/// Apply `f` to every channel independently
fn map_channels<F>(buffer: &AudioBuffer, mut f: F) -> AudioBuffer
where
    F: FnMut(&[f32]) -> Vec<f32>,
{
    buffer.with_samples(buffer.samples.iter().map(|ch| f(ch)).collect())
}

/// Linear dry/wet blend
#[inline]
fn blend(dry: f32, wet: f64, mix: f64) -> f32 {
    ((1.0 - mix) * dry as f64 + mix * wet) as f32
}

/// Linearly interpolated read at fractional index `pos`; zero outside the signal
#[inline]
fn read_interpolated(signal: &[f64], pos: f64) -> f64 {
    if pos < 0.0 {
        return 0.0;
    }
    let i = pos.floor() as usize;
    let frac = pos - i as f64;
    let a = signal.get(i).copied().unwrap_or(0.0);
    let b = signal.get(i + 1).copied().unwrap_or(0.0);
    a + (b - a) * frac
}

/// One-pole smoothing coefficient for a time constant in milliseconds
#[inline]
fn time_to_coeff(time_ms: f64, sample_rate: u32) -> f64 {
    let samples = time_ms * sample_rate as f64 / 1000.0;
    if samples > 0.0 {
        (-1.0 / samples).exp()
    } else {
        0.0
    }
}
