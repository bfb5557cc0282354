//! Resampling round trip
//!
//! Converts down (or up) to the drawn rate and straight back to the buffer's
//! own rate, so content above the intermediate Nyquist is lost while the
//! length and rate are unchanged.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::augment::effect::ParamRange;
use crate::dsp::resample::{output_length, resample_channels};
use crate::engine::AudioBuffer;
use crate::error::{Result, SonicPrepError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResamplingParams {
    pub target_sample_rate: f64,
}

impl ResamplingParams {
    pub const TARGET_SAMPLE_RATE: ParamRange = ParamRange::new(400.0, 120000.0);

    pub fn sample<R: Rng>(rng: &mut R) -> Self {
        Self {
            target_sample_rate: Self::TARGET_SAMPLE_RATE.sample(rng),
        }
    }

    pub fn apply(&self, buffer: &AudioBuffer) -> Result<AudioBuffer> {
        let source = buffer.sample_rate;
        if source == 0 {
            return Err(SonicPrepError::invalid_parameter("sample_rate", 0, "> 0 Hz"));
        }
        let target = self.target_sample_rate.round().max(1.0) as u32;
        if target == source || buffer.is_empty() {
            return Ok(buffer.clone());
        }

        let down_len = output_length(buffer.len(), source, target);
        let down = resample_channels(&buffer.samples, target as f64 / source as f64, down_len)?;
        let back = resample_channels(&down, source as f64 / target as f64, buffer.len())?;
        Ok(buffer.with_samples(back))
    }
}
