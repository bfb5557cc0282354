//! Feedback delay

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{blend, map_channels};
use crate::augment::effect::ParamRange;
use crate::engine::AudioBuffer;

/// Single-tap echo with feedback
///
/// With a delay longer than the buffer only the dry share `(1 - mix)` remains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayParams {
    pub delay_seconds: f64,
    pub feedback: f64,
    pub mix: f64,
}

impl DelayParams {
    pub const DELAY_SECONDS: ParamRange = ParamRange::new(0.1, 1000.0);
    pub const FEEDBACK: ParamRange = ParamRange::new(0.1, 1.0);
    pub const MIX: ParamRange = ParamRange::new(0.1, 1.0);

    pub fn sample<R: Rng>(rng: &mut R) -> Self {
        Self {
            delay_seconds: Self::DELAY_SECONDS.sample(rng),
            feedback: Self::FEEDBACK.sample(rng),
            mix: Self::MIX.sample(rng),
        }
    }

    /// Delay length in whole samples at `sample_rate` (at least one)
    pub fn delay_samples(&self, sample_rate: u32) -> usize {
        ((self.delay_seconds * sample_rate as f64).round() as usize).max(1)
    }

    pub fn apply(&self, buffer: &AudioBuffer) -> AudioBuffer {
        let delay = self.delay_samples(buffer.sample_rate);
        let feedback = self.feedback.clamp(0.0, 1.0);

        map_channels(buffer, |ch| {
            // line[n] = x[n] + feedback * line[n - delay]; the wet tap reads line[n - delay]
            let mut line = vec![0.0_f64; ch.len()];
            let mut out = Vec::with_capacity(ch.len());
            for (n, &x) in ch.iter().enumerate() {
                let tap = if n >= delay { line[n - delay] } else { 0.0 };
                line[n] = x as f64 + feedback * tap;
                out.push(blend(x, tap, self.mix));
            }
            out
        })
    }
}
