//! Duration-preserving pitch shift
//!
//! Two read heads sweep across a 50 ms window at the pitch ratio and are
//! crossfaded with complementary sin² windows. The whole buffer is
//! available, so the heads are centred on the current frame and the output
//! is not delayed.

use std::f64::consts::PI;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{map_channels, read_interpolated};
use crate::augment::effect::ParamRange;
use crate::engine::AudioBuffer;

/// Read head window length in milliseconds
const WINDOW_MS: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchShiftParams {
    pub semitones: f64,
}

impl PitchShiftParams {
    pub const SEMITONES: ParamRange = ParamRange::new(-2.0, 2.0);

    pub fn sample<R: Rng>(rng: &mut R) -> Self {
        Self {
            semitones: Self::SEMITONES.sample(rng),
        }
    }

    /// Frequency ratio for the shift
    pub fn ratio(&self) -> f64 {
        2.0_f64.powf(self.semitones / 12.0)
    }

    pub fn apply(&self, buffer: &AudioBuffer) -> AudioBuffer {
        if self.semitones == 0.0 {
            return buffer.clone();
        }
        let window = (WINDOW_MS * buffer.sample_rate as f64 / 1000.0).max(2.0);
        let half = window / 2.0;
        let step = (1.0 - self.ratio()) / window;

        map_channels(buffer, |ch| {
            let signal: Vec<f64> = ch.iter().map(|&s| s as f64).collect();
            (0..signal.len())
                .map(|n| {
                    let phase = (step * n as f64).rem_euclid(1.0);
                    let other = (phase + 0.5).rem_euclid(1.0);
                    let head = |p: f64| {
                        let weight = (PI * p).sin().powi(2);
                        weight * read_interpolated(&signal, n as f64 + half - p * window)
                    };
                    (head(phase) + head(other)) as f32
                })
                .collect()
        })
    }
}
