//! Bit depth reduction

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::map_channels;
use crate::augment::effect::ParamRange;
use crate::engine::AudioBuffer;

/// Quantize to a (possibly fractional) bit depth
///
/// Samples are rounded to multiples of `2 / 2^bit_depth`, i.e. the step of a
/// signed integer format with `bit_depth` bits over [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BitcrushParams {
    pub bit_depth: f64,
}

impl BitcrushParams {
    pub const BIT_DEPTH: ParamRange = ParamRange::new(1.0, 64.0);

    pub fn sample<R: Rng>(rng: &mut R) -> Self {
        Self {
            bit_depth: Self::BIT_DEPTH.sample(rng),
        }
    }

    pub fn apply(&self, buffer: &AudioBuffer) -> AudioBuffer {
        let levels = 2.0_f64.powf(self.bit_depth - 1.0);
        map_channels(buffer, |ch| {
            ch.iter()
                .map(|&s| ((s as f64 * levels).round() / levels) as f32)
                .collect()
        })
    }
}
