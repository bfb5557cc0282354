//! Effect roster and per-application parameter specs
//!
//! [`EffectKind`] is the fixed, ordered roster. An [`EffectSpec`] is one kind
//! bound to a freshly drawn, immutable parameter set; applying it is a pure
//! function of the input buffer.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::effects::{
    BitcrushParams, ChorusParams, ClippingParams, CompressorParams, ConvolutionParams,
    DelayParams, GainParams, LimiterParams, PhaserParams, PitchShiftParams, ResamplingParams,
};
use super::impulse::ImpulseLibrary;
use crate::engine::AudioBuffer;
use crate::error::{Result, SonicPrepError};

// ============================================================================
// Parameter Ranges
// ============================================================================

/// Closed interval a parameter is drawn from uniformly
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
}

impl ParamRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Draw a value uniformly from `[min, max]`
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.min..=self.max)
    }

    /// Whether `value` lies inside the interval
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

// ============================================================================
// Roster
// ============================================================================

/// One of the eleven augmentation effects, in roster order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Chorus,
    Phaser,
    Clipping,
    Compression,
    Gain,
    Limiting,
    Convolution,
    Delay,
    PitchShift,
    Resampling,
    Bitcrush,
}

/// The full roster in application order
pub const ROSTER: [EffectKind; 11] = [
    EffectKind::Chorus,
    EffectKind::Phaser,
    EffectKind::Clipping,
    EffectKind::Compression,
    EffectKind::Gain,
    EffectKind::Limiting,
    EffectKind::Convolution,
    EffectKind::Delay,
    EffectKind::PitchShift,
    EffectKind::Resampling,
    EffectKind::Bitcrush,
];

impl EffectKind {
    /// Stable identifier
    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::Chorus => "chorus",
            EffectKind::Phaser => "phaser",
            EffectKind::Clipping => "clipping",
            EffectKind::Compression => "compression",
            EffectKind::Gain => "gain",
            EffectKind::Limiting => "limiting",
            EffectKind::Convolution => "convolution",
            EffectKind::Delay => "delay",
            EffectKind::PitchShift => "pitch_shift",
            EffectKind::Resampling => "resampling",
            EffectKind::Bitcrush => "bitcrush",
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EffectKind {
    type Err = SonicPrepError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ROSTER
            .iter()
            .copied()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| {
                SonicPrepError::invalid_parameter(
                    "effect",
                    s,
                    format!(
                        "one of: {}",
                        ROSTER.iter().map(EffectKind::name).collect::<Vec<_>>().join(", ")
                    ),
                )
            })
    }
}

// ============================================================================
// Effect Spec
// ============================================================================

/// An effect kind with its drawn parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum EffectSpec {
    Chorus(ChorusParams),
    Phaser(PhaserParams),
    Clipping(ClippingParams),
    Compression(CompressorParams),
    Gain(GainParams),
    Limiting(LimiterParams),
    Convolution(ConvolutionParams),
    Delay(DelayParams),
    PitchShift(PitchShiftParams),
    Resampling(ResamplingParams),
    Bitcrush(BitcrushParams),
}

impl EffectSpec {
    /// Draw a fresh parameter set for `kind`
    ///
    /// # Errors
    /// * `DependencyFailure` - If `kind` is convolution and `impulses` is empty
    pub fn sample<R: Rng>(
        kind: EffectKind,
        rng: &mut R,
        impulses: &ImpulseLibrary,
    ) -> Result<Self> {
        Ok(match kind {
            EffectKind::Chorus => EffectSpec::Chorus(ChorusParams::sample(rng)),
            EffectKind::Phaser => EffectSpec::Phaser(PhaserParams::sample(rng)),
            EffectKind::Clipping => EffectSpec::Clipping(ClippingParams::sample(rng)),
            EffectKind::Compression => EffectSpec::Compression(CompressorParams::sample(rng)),
            EffectKind::Gain => EffectSpec::Gain(GainParams::sample(rng)),
            EffectKind::Limiting => EffectSpec::Limiting(LimiterParams::sample(rng)),
            EffectKind::Convolution => {
                EffectSpec::Convolution(ConvolutionParams::sample(rng, impulses)?)
            }
            EffectKind::Delay => EffectSpec::Delay(DelayParams::sample(rng)),
            EffectKind::PitchShift => EffectSpec::PitchShift(PitchShiftParams::sample(rng)),
            EffectKind::Resampling => EffectSpec::Resampling(ResamplingParams::sample(rng)),
            EffectKind::Bitcrush => EffectSpec::Bitcrush(BitcrushParams::sample(rng)),
        })
    }

    /// Roster entry this spec belongs to
    pub fn kind(&self) -> EffectKind {
        match self {
            EffectSpec::Chorus(_) => EffectKind::Chorus,
            EffectSpec::Phaser(_) => EffectKind::Phaser,
            EffectSpec::Clipping(_) => EffectKind::Clipping,
            EffectSpec::Compression(_) => EffectKind::Compression,
            EffectSpec::Gain(_) => EffectKind::Gain,
            EffectSpec::Limiting(_) => EffectKind::Limiting,
            EffectSpec::Convolution(_) => EffectKind::Convolution,
            EffectSpec::Delay(_) => EffectKind::Delay,
            EffectSpec::PitchShift(_) => EffectKind::PitchShift,
            EffectSpec::Resampling(_) => EffectKind::Resampling,
            EffectSpec::Bitcrush(_) => EffectKind::Bitcrush,
        }
    }

    /// Apply the effect; output has the input's length and channel count
    pub fn apply(&self, buffer: &AudioBuffer, impulses: &ImpulseLibrary) -> Result<AudioBuffer> {
        match self {
            EffectSpec::Chorus(p) => Ok(p.apply(buffer)),
            EffectSpec::Phaser(p) => Ok(p.apply(buffer)),
            EffectSpec::Clipping(p) => Ok(p.apply(buffer)),
            EffectSpec::Compression(p) => Ok(p.apply(buffer)),
            EffectSpec::Gain(p) => Ok(p.apply(buffer)),
            EffectSpec::Limiting(p) => Ok(p.apply(buffer)),
            EffectSpec::Convolution(p) => p.apply(buffer, impulses),
            EffectSpec::Delay(p) => Ok(p.apply(buffer)),
            EffectSpec::PitchShift(p) => Ok(p.apply(buffer)),
            EffectSpec::Resampling(p) => p.apply(buffer),
            EffectSpec::Bitcrush(p) => Ok(p.apply(buffer)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_roster_order_is_sorted() {
        assert_eq!(ROSTER.len(), 11);
        assert!(ROSTER.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_kind_parsing() {
        for kind in ROSTER {
            assert_eq!(kind.name().parse::<EffectKind>().unwrap(), kind);
        }
        assert_eq!("Pitch-Shift".parse::<EffectKind>().unwrap(), EffectKind::PitchShift);
        assert!("reverb".parse::<EffectKind>().is_err());
    }

    #[test]
    fn test_sampled_kind_matches() {
        let mut rng = StdRng::seed_from_u64(7);
        let impulses = ImpulseLibrary::from_buffers(vec![(
            "dirac".to_string(),
            AudioBuffer::mono(vec![1.0], 44100),
        )]);
        for kind in ROSTER {
            let spec = EffectSpec::sample(kind, &mut rng, &impulses).unwrap();
            assert_eq!(spec.kind(), kind);
        }
    }

    #[test]
    fn test_convolution_needs_impulses() {
        let mut rng = StdRng::seed_from_u64(7);
        let result = EffectSpec::sample(EffectKind::Convolution, &mut rng, &ImpulseLibrary::default());
        assert!(matches!(result, Err(SonicPrepError::DependencyFailure { .. })));
    }

    #[test]
    fn test_spec_serializes_with_tag() {
        let spec = EffectSpec::Gain(GainParams { gain_db: -3.0 });
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["effect"], "gain");
        assert_eq!(json["gain_db"], -3.0);
    }

    #[test]
    fn test_param_range_sampling() {
        let mut rng = StdRng::seed_from_u64(1);
        let range = ParamRange::new(-2.0, 2.0);
        for _ in 0..1000 {
            assert!(range.contains(range.sample(&mut rng)));
        }
    }
}
