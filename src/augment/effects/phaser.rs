//! Phaser
//!
//! Six first-order allpass stages whose break frequency sweeps up to two
//! octaves either side of the centre frequency (scaled by `depth`), with the
//! chain output fed back into its input.

use std::f64::consts::{PI, TAU};

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{blend, map_channels};
use crate::augment::effect::ParamRange;
use crate::engine::AudioBuffer;

const STAGES: usize = 6;

/// Lowest break frequency the sweep may reach in Hz
const MIN_BREAK_HZ: f64 = 20.0;

/// Loop gain ceiling keeping the feedback path stable
const MAX_LOOP_FEEDBACK: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaserParams {
    pub rate_hz: f64,
    pub depth: f64,
    pub centre_frequency_hz: f64,
    pub feedback: f64,
    pub mix: f64,
}

impl PhaserParams {
    pub const RATE_HZ: ParamRange = ParamRange::new(0.5, 20000.0);
    pub const DEPTH: ParamRange = ParamRange::new(0.0, 1.0);
    pub const CENTRE_FREQUENCY_HZ: ParamRange = ParamRange::new(0.0, 1000.0);
    pub const FEEDBACK: ParamRange = ParamRange::new(0.0, 1.0);
    pub const MIX: ParamRange = ParamRange::new(0.0, 1.0);

    pub fn sample<R: Rng>(rng: &mut R) -> Self {
        Self {
            rate_hz: Self::RATE_HZ.sample(rng),
            depth: Self::DEPTH.sample(rng),
            centre_frequency_hz: Self::CENTRE_FREQUENCY_HZ.sample(rng),
            feedback: Self::FEEDBACK.sample(rng),
            mix: Self::MIX.sample(rng),
        }
    }

    pub fn apply(&self, buffer: &AudioBuffer) -> AudioBuffer {
        let rate = buffer.sample_rate as f64;
        // Break frequencies stay below Nyquist even for very low rates
        let max_break = 0.45 * rate;
        let min_break = MIN_BREAK_HZ.min(max_break);
        let phase_inc = TAU * self.rate_hz / rate;
        let feedback = self.feedback.clamp(0.0, MAX_LOOP_FEEDBACK);
        let centre = self.centre_frequency_hz.max(min_break);

        map_channels(buffer, |ch| {
            let mut x1 = [0.0_f64; STAGES];
            let mut y1 = [0.0_f64; STAGES];
            let mut last = 0.0_f64;

            ch.iter()
                .enumerate()
                .map(|(n, &x)| {
                    let octaves = 2.0 * self.depth * (phase_inc * n as f64).sin();
                    let fc = (centre * octaves.exp2()).clamp(min_break, max_break);
                    let t = (PI * fc / rate).tan();
                    let a = (t - 1.0) / (t + 1.0);

                    let mut stage_in = x as f64 + feedback * last;
                    for s in 0..STAGES {
                        let y = a * stage_in + x1[s] - a * y1[s];
                        x1[s] = stage_in;
                        y1[s] = y;
                        stage_in = y;
                    }
                    last = stage_in;
                    blend(x, stage_in, self.mix)
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::effects::test_util::{assert_same_shape, stereo_tone};

    #[test]
    fn test_dry_mix_is_identity() {
        let buffer = stereo_tone();
        let params = PhaserParams {
            rate_hz: 1.0,
            depth: 0.7,
            centre_frequency_hz: 800.0,
            feedback: 0.5,
            mix: 0.0,
        };
        assert_eq!(params.apply(&buffer), buffer);
    }

    #[test]
    fn test_wet_changes_signal() {
        let buffer = stereo_tone();
        let params = PhaserParams {
            rate_hz: 1.0,
            depth: 0.7,
            centre_frequency_hz: 440.0,
            feedback: 0.0,
            mix: 0.5,
        };
        let out = params.apply(&buffer);
        assert_same_shape(&out, &buffer);
        assert_ne!(out, buffer);
    }

    #[test]
    fn test_full_feedback_stays_finite() {
        let buffer = stereo_tone();
        let params = PhaserParams {
            rate_hz: 20000.0,
            depth: 1.0,
            centre_frequency_hz: 0.0,
            feedback: 1.0,
            mix: 1.0,
        };
        let out = params.apply(&buffer);
        assert!(out.is_finite());
    }

    #[test]
    fn test_very_low_rate() {
        let buffer = AudioBuffer::mono(vec![0.5; 100], 40);
        let params = PhaserParams {
            rate_hz: 1.0,
            depth: 0.5,
            centre_frequency_hz: 100.0,
            feedback: 0.5,
            mix: 0.5,
        };
        let out = params.apply(&buffer);
        assert_same_shape(&out, &buffer);
        assert!(out.is_finite());
    }
}
