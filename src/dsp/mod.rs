//! Signal Processing Stages
//!
//! The building blocks of the standardization pipeline. Every stage borrows
//! a buffer and returns a new one; none keeps state between calls.

pub mod bandpass;
pub mod chunk;
pub mod loudness;
pub mod resample;
pub mod trim;

pub use bandpass::{bandpass, BandpassFilter};
pub use chunk::{chunk, Chunker};
pub use loudness::{measure_level, normalize, LevelMetric, LoudnessNormalizer};
pub use resample::{resample, Resampler, MAX_TARGET_RATE, MIN_TARGET_RATE};
pub use trim::trim;
