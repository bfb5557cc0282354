//! Gain

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::map_channels;
use crate::augment::effect::ParamRange;
use crate::engine::{db_to_linear, AudioBuffer};

/// Static gain in dB
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainParams {
    pub gain_db: f64,
}

impl GainParams {
    pub const GAIN_DB: ParamRange = ParamRange::new(-100.0, 20.0);

    pub fn sample<R: Rng>(rng: &mut R) -> Self {
        Self {
            gain_db: Self::GAIN_DB.sample(rng),
        }
    }

    pub fn apply(&self, buffer: &AudioBuffer) -> AudioBuffer {
        let gain = db_to_linear(self.gain_db);
        map_channels(buffer, |ch| {
            ch.iter().map(|&s| (s as f64 * gain) as f32).collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::effects::test_util::{assert_same_shape, stereo_tone};
    use approx::assert_relative_eq;

    #[test]
    fn test_six_db_doubles() {
        let buffer = AudioBuffer::mono(vec![0.25, -0.1], 44100);
        let out = GainParams { gain_db: 20.0 * 2.0_f64.log10() }.apply(&buffer);
        assert_relative_eq!(out.samples[0][0], 0.5, epsilon = 1e-6);
        assert_relative_eq!(out.samples[0][1], -0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_shape_preserved() {
        let buffer = stereo_tone();
        assert_same_shape(&GainParams { gain_db: -100.0 }.apply(&buffer), &buffer);
    }
}
