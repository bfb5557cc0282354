//! Hard clipping

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::map_channels;
use crate::augment::effect::ParamRange;
use crate::engine::{db_to_linear, AudioBuffer};

/// Hard clip at a threshold in dBFS
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClippingParams {
    pub threshold_db: f64,
}

impl ClippingParams {
    pub const THRESHOLD_DB: ParamRange = ParamRange::new(-60.0, 0.0);

    pub fn sample<R: Rng>(rng: &mut R) -> Self {
        Self {
            threshold_db: Self::THRESHOLD_DB.sample(rng),
        }
    }

    pub fn apply(&self, buffer: &AudioBuffer) -> AudioBuffer {
        let ceiling = db_to_linear(self.threshold_db) as f32;
        map_channels(buffer, |ch| ch.iter().map(|s| s.clamp(-ceiling, ceiling)).collect())
    }
}
