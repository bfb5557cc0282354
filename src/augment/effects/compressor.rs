//! Compressor
//!
//! Feed-forward, hard-knee compressor with linked peak detection across
//! channels. The gain computer works in dB; the resulting linear gain is
//! smoothed with separate attack and release time constants.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::time_to_coeff;
use crate::augment::effect::ParamRange;
use crate::engine::{db_to_linear, linear_to_db, AudioBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressorParams {
    pub threshold_db: f64,
    pub ratio: f64,
    pub attack_ms: f64,
    pub release_ms: f64,
}

impl CompressorParams {
    pub const THRESHOLD_DB: ParamRange = ParamRange::new(-60.0, 0.0);
    pub const RATIO: ParamRange = ParamRange::new(1.0, 10.0);
    pub const ATTACK_MS: ParamRange = ParamRange::new(1.0, 100.0);
    pub const RELEASE_MS: ParamRange = ParamRange::new(1.0, 100.0);

    pub fn sample<R: Rng>(rng: &mut R) -> Self {
        Self {
            threshold_db: Self::THRESHOLD_DB.sample(rng),
            ratio: Self::RATIO.sample(rng),
            attack_ms: Self::ATTACK_MS.sample(rng),
            release_ms: Self::RELEASE_MS.sample(rng),
        }
    }

    /// Gain change in dB for an input level in dB (zero or negative)
    fn gain_reduction_db(&self, input_db: f64) -> f64 {
        if input_db <= self.threshold_db {
            0.0
        } else {
            (self.threshold_db + (input_db - self.threshold_db) / self.ratio) - input_db
        }
    }

    pub fn apply(&self, buffer: &AudioBuffer) -> AudioBuffer {
        let attack = time_to_coeff(self.attack_ms, buffer.sample_rate);
        let release = time_to_coeff(self.release_ms, buffer.sample_rate);
        let mut out = buffer.clone();
        let mut gain = 1.0_f64;

        for frame in 0..buffer.len() {
            let peak = buffer
                .samples
                .iter()
                .map(|ch| ch[frame].abs())
                .fold(0.0_f32, f32::max);
            let target = db_to_linear(self.gain_reduction_db(linear_to_db(peak as f64)));

            let coeff = if target < gain { attack } else { release };
            gain = coeff * gain + (1.0 - coeff) * target;

            for channel in &mut out.samples {
                channel[frame] = (channel[frame] as f64 * gain) as f32;
            }
        }
        out
    }
}
