//! Limiter
//!
//! Brickwall limiter: a near-instant attack envelope on the gain reduction
//! needed to keep linked peaks under the threshold, a configurable release,
//! and a final hard ceiling so no sample exceeds the threshold.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::time_to_coeff;
use crate::augment::effect::ParamRange;
use crate::engine::{db_to_linear, linear_to_db, AudioBuffer};

/// Attack time constant in milliseconds
const ATTACK_MS: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimiterParams {
    pub threshold_db: f64,
    pub release_ms: f64,
}

impl LimiterParams {
    pub const THRESHOLD_DB: ParamRange = ParamRange::new(-60.0, 0.0);
    pub const RELEASE_MS: ParamRange = ParamRange::new(1.0, 100.0);

    pub fn sample<R: Rng>(rng: &mut R) -> Self {
        Self {
            threshold_db: Self::THRESHOLD_DB.sample(rng),
            release_ms: Self::RELEASE_MS.sample(rng),
        }
    }

    pub fn apply(&self, buffer: &AudioBuffer) -> AudioBuffer {
        let ceiling = db_to_linear(self.threshold_db);
        let attack = time_to_coeff(ATTACK_MS, buffer.sample_rate);
        let release = time_to_coeff(self.release_ms, buffer.sample_rate);
        let mut out = buffer.clone();
        // Gain reduction in dB, >= 0
        let mut envelope = 0.0_f64;

        for frame in 0..buffer.len() {
            let peak = buffer
                .samples
                .iter()
                .map(|ch| ch[frame].abs() as f64)
                .fold(0.0_f64, f64::max);
            let target = if peak > ceiling {
                (linear_to_db(peak) - self.threshold_db).max(0.0)
            } else {
                0.0
            };

            let coeff = if target > envelope { attack } else { release };
            envelope = coeff * envelope + (1.0 - coeff) * target;
            let gain = db_to_linear(-envelope);

            for channel in &mut out.samples {
                let limited = (channel[frame] as f64 * gain).clamp(-ceiling, ceiling);
                channel[frame] = limited as f32;
            }
        }
        out
    }
}
