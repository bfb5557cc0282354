//! Audio Buffer Management
//!
//! Provides the core sample buffer type shared by every pipeline stage and
//! augmentation effect. Stages never mutate their input: each one borrows a
//! buffer and returns a new owned one.

use crate::error::{Result, SonicPrepError};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// Returns `-inf` for zero or negative input.
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    if linear <= 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

// ============================================================================
// Channel Layout
// ============================================================================

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Single channel (mono)
    #[default]
    Mono,
    /// Two channels (stereo: left, right)
    Stereo,
}

impl ChannelLayout {
    /// Returns the number of channels for this layout
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Sample buffer passed between pipeline stages
///
/// Stores audio as non-interleaved 32-bit floating point samples, one
/// `Vec<f32>` per channel, paired with the rate they were sampled at.
///
/// # Example
/// ```
/// use sonicprep::engine::AudioBuffer;
///
/// let buffer = AudioBuffer::mono(vec![0.0, 0.5, -0.5, 0.0], 44100);
/// assert_eq!(buffer.channels(), 1);
/// assert_eq!(buffer.len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a zeroed buffer with the given length, layout and rate
    pub fn new(num_samples: usize, layout: ChannelLayout, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; layout.num_channels()],
            sample_rate,
        }
    }

    /// Create a mono buffer from a sample vector
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: vec![samples],
            sample_rate,
        }
    }

    /// Create a buffer from per-channel sample vectors
    ///
    /// Fails if there are no channels or the channels differ in length.
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        let Some(first) = samples.first() else {
            return Err(SonicPrepError::invalid_signal("buffer has no channels"));
        };
        let len = first.len();
        if let Some(bad) = samples.iter().position(|ch| ch.len() != len) {
            return Err(SonicPrepError::invalid_signal(format!(
                "channel {} has {} samples, expected {}",
                bad,
                samples[bad].len(),
                len
            )));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a buffer from interleaved sample data
    pub fn from_interleaved(
        interleaved: &[f32],
        num_channels: usize,
        sample_rate: u32,
    ) -> Result<Self> {
        if num_channels == 0 {
            return Err(SonicPrepError::invalid_parameter(
                "num_channels",
                num_channels,
                ">= 1",
            ));
        }
        if interleaved.len() % num_channels != 0 {
            return Err(SonicPrepError::InvalidAudio {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    num_channels
                ),
                source: None,
            });
        }

        let num_samples = interleaved.len() / num_channels;
        let mut samples = vec![Vec::with_capacity(num_samples); num_channels];
        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Convert the buffer to interleaved format (L, R, L, R, ...)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let num_channels = self.channels();
        let num_samples = self.len();
        let mut interleaved = Vec::with_capacity(num_channels * num_samples);
        for i in 0..num_samples {
            for channel in &self.samples {
                // Short channels are padded with silence
                interleaved.push(channel.get(i).copied().unwrap_or(0.0));
            }
        }
        interleaved
    }

    /// Build a buffer with the same rate but different sample data
    pub fn with_samples(&self, samples: Vec<Vec<f32>>) -> Self {
        Self {
            samples,
            sample_rate: self.sample_rate,
        }
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer is empty (no samples)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Copy out frames `start..end` (clamped to the buffer length)
    pub fn slice_frames(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.len());
        let start = start.min(end);
        self.with_samples(
            self.samples
                .iter()
                .map(|ch| {
                    let end = end.min(ch.len());
                    ch[start.min(end)..end].to_vec()
                })
                .collect(),
        )
    }

    /// Mean of squared samples across all channels (f64 accumulation)
    pub fn mean_square(&self) -> f64 {
        let total = self.channels() * self.len();
        if total == 0 {
            return 0.0;
        }
        let sum: f64 = self
            .samples
            .iter()
            .flat_map(|ch| ch.iter())
            .map(|&s| (s as f64) * (s as f64))
            .sum();
        sum / total as f64
    }

    /// RMS level in dB across all channels; `-inf` for silence
    pub fn rms_db(&self) -> f64 {
        linear_to_db(self.mean_square().sqrt())
    }

    /// Peak absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples
            .iter()
            .flat_map(|ch| ch.iter())
            .map(|s| s.abs())
            .fold(0.0_f32, f32::max)
    }

    /// Check if all samples are finite (not NaN or Infinity)
    pub fn is_finite(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|ch| ch.iter())
            .all(|s| s.is_finite())
    }

    /// Clamp all samples to the range [-ceiling, ceiling]
    pub fn clamp(&mut self, ceiling: f32) {
        for channel in &mut self.samples {
            for sample in channel.iter_mut() {
                *sample = sample.clamp(-ceiling, ceiling);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
