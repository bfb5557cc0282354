//! Chorus
//!
//! A single modulated delay tap with feedback. The tap delay swings between
//! half and one-and-a-half times the centre delay (scaled by `depth`) at the
//! LFO rate.

use std::f64::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{blend, map_channels, read_interpolated};
use crate::augment::effect::ParamRange;
use crate::engine::AudioBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChorusParams {
    pub rate_hz: f64,
    pub depth: f64,
    pub centre_delay_ms: f64,
    pub feedback: f64,
    pub mix: f64,
}

impl ChorusParams {
    pub const RATE_HZ: ParamRange = ParamRange::new(0.5, 20000.0);
    pub const DEPTH: ParamRange = ParamRange::new(0.0, 1.0);
    pub const CENTRE_DELAY_MS: ParamRange = ParamRange::new(0.5, 1000.0);
    pub const FEEDBACK: ParamRange = ParamRange::new(0.0, 1.0);
    pub const MIX: ParamRange = ParamRange::new(0.0, 1.0);

    pub fn sample<R: Rng>(rng: &mut R) -> Self {
        Self {
            rate_hz: Self::RATE_HZ.sample(rng),
            depth: Self::DEPTH.sample(rng),
            centre_delay_ms: Self::CENTRE_DELAY_MS.sample(rng),
            feedback: Self::FEEDBACK.sample(rng),
            mix: Self::MIX.sample(rng),
        }
    }

    pub fn apply(&self, buffer: &AudioBuffer) -> AudioBuffer {
        let rate = buffer.sample_rate as f64;
        let centre = self.centre_delay_ms * rate / 1000.0;
        let swing = 0.5 * self.depth * centre;
        let phase_inc = TAU * self.rate_hz / rate;
        let feedback = self.feedback.clamp(0.0, 1.0);

        map_channels(buffer, |ch| {
            // Delay line contents: input plus fed-back tap
            let mut line = vec![0.0_f64; ch.len()];
            let mut out = Vec::with_capacity(ch.len());
            for (n, &x) in ch.iter().enumerate() {
                let delay = (centre + swing * (phase_inc * n as f64).sin()).max(1.0);
                let tap = read_interpolated(&line[..n], n as f64 - delay);
                line[n] = x as f64 + feedback * tap;
                out.push(blend(x, tap, self.mix));
            }
            out
        })
    }
}
