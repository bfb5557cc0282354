//! Fixed-duration segmentation

use crate::engine::AudioBuffer;
use crate::error::{Result, SonicPrepError};

/// Splits buffers into consecutive segments of a fixed duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    samples_per_segment: usize,
}

impl Chunker {
    /// Create a chunker for `duration_secs`-long segments at `sample_rate`
    ///
    /// # Errors
    /// * `InvalidParameter` - If `duration_secs` is not a positive finite
    ///   number or the segment would be shorter than one sample
    pub fn new(duration_secs: f64, sample_rate: u32) -> Result<Self> {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(SonicPrepError::invalid_parameter(
                "chunk_duration_secs",
                duration_secs,
                "> 0 seconds",
            ));
        }
        let samples_per_segment = (duration_secs * sample_rate as f64).floor() as usize;
        if samples_per_segment < 1 {
            return Err(SonicPrepError::invalid_parameter(
                "chunk_duration_secs",
                duration_secs,
                format!("at least one sample at {sample_rate} Hz"),
            ));
        }
        Ok(Self {
            samples_per_segment,
        })
    }

    /// Segment length in samples
    pub fn samples_per_segment(&self) -> usize {
        self.samples_per_segment
    }

    /// Split `buffer` into full segments followed by any remainder
    pub fn chunk(&self, buffer: &AudioBuffer) -> Vec<AudioBuffer> {
        let len = buffer.len();
        (0..len)
            .step_by(self.samples_per_segment)
            .map(|start| buffer.slice_frames(start, start + self.samples_per_segment))
            .collect()
    }

    /// Number of chunks `chunk` produces for a buffer of `len` samples
    pub fn chunk_count(&self, len: usize) -> usize {
        len.div_ceil(self.samples_per_segment)
    }
}

/// Chunk `buffer` into `duration_secs` segments at the buffer's own rate
pub fn chunk(buffer: &AudioBuffer, duration_secs: f64) -> Result<Vec<AudioBuffer>> {
    Ok(Chunker::new(duration_secs, buffer.sample_rate)?.chunk(buffer))
}
