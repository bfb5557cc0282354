//! Combinatorial Augmentation
//!
//! Applies every non-empty proper subset of the effect roster to a buffer,
//! several times each with freshly drawn parameters. For the full roster of
//! eleven effects and three variants per subset this is
//! `3 · (2^11 − 2) = 6138` outputs per input buffer.
//!
//! Effects within a subset always run in roster order. Randomness comes only
//! from the caller's [`Rng`], so a seeded generator reproduces a run exactly.

pub mod effect;
pub mod effects;
pub mod impulse;

use std::path::PathBuf;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use effect::{EffectKind, EffectSpec, ParamRange, ROSTER};
pub use impulse::{Impulse, ImpulseLibrary};

use crate::cancel::CancelToken;
use crate::engine::AudioBuffer;
use crate::error::{Result, SonicPrepError};

// ============================================================================
// Configuration
// ============================================================================

/// Augmenter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmenterConfig {
    /// Repetitions per effect subset, each with new parameters
    pub variants_per_combination: usize,
    /// Directory holding impulse responses for the convolution effect
    pub ir_dir: PathBuf,
    /// Clamp every chain output to [-1, 1]
    pub clip_guard: bool,
}

impl Default for AugmenterConfig {
    fn default() -> Self {
        Self {
            variants_per_combination: 3,
            ir_dir: PathBuf::from("impulses"),
            clip_guard: true,
        }
    }
}

// ============================================================================
// Combinations
// ============================================================================

/// All `k`-element index subsets of `0..n` in lexicographic order
pub fn index_combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if k > n {
        return out;
    }
    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        out.push(idx.clone());
        // Rightmost position that can still advance
        let Some(i) = (0..k).rev().find(|&i| idx[i] < n - k + i) else {
            return out;
        };
        idx[i] += 1;
        for j in i + 1..k {
            idx[j] = idx[j - 1] + 1;
        }
    }
}

/// Every non-empty proper subset of `roster`, by size then lexicographically
pub fn proper_subsets(roster: &[EffectKind]) -> Vec<Vec<EffectKind>> {
    let n = roster.len();
    (1..n)
        .flat_map(|k| index_combinations(n, k))
        .map(|indices| indices.into_iter().map(|i| roster[i]).collect())
        .collect()
}

// ============================================================================
// Augmenter
// ============================================================================

/// One augmented output together with the effects that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedBuffer {
    pub specs: Vec<EffectSpec>,
    pub data: AudioBuffer,
}

impl AugmentedBuffer {
    /// Effect kinds in the order they were applied
    pub fn kinds(&self) -> Vec<EffectKind> {
        self.specs.iter().map(EffectSpec::kind).collect()
    }
}

/// Combinatorial augmentation engine
#[derive(Debug, Clone)]
pub struct Augmenter {
    roster: Vec<EffectKind>,
    variants_per_combination: usize,
    clip_guard: bool,
    impulses: ImpulseLibrary,
}

impl Augmenter {
    /// Build an augmenter over the full roster, loading impulse responses
    /// from `config.ir_dir`
    pub fn new(config: &AugmenterConfig) -> Result<Self> {
        let impulses = ImpulseLibrary::load(&config.ir_dir)?;
        Self::with_impulses(config, impulses)
    }

    /// Build an augmenter over the full roster with the given impulse responses
    ///
    /// # Errors
    /// * `InvalidParameter` - If `variants_per_combination` is zero
    pub fn with_impulses(config: &AugmenterConfig, impulses: ImpulseLibrary) -> Result<Self> {
        if config.variants_per_combination == 0 {
            return Err(SonicPrepError::invalid_parameter(
                "variants_per_combination",
                0,
                ">= 1",
            ));
        }
        info!(
            variants = config.variants_per_combination,
            impulses = impulses.len(),
            clip_guard = config.clip_guard,
            "augmenter ready"
        );
        Ok(Self {
            roster: ROSTER.to_vec(),
            variants_per_combination: config.variants_per_combination,
            clip_guard: config.clip_guard,
            impulses,
        })
    }

    /// Restrict the roster to `kinds`, kept in roster order without duplicates
    ///
    /// # Errors
    /// * `InvalidParameter` - If `kinds` is empty
    pub fn with_roster(mut self, kinds: &[EffectKind]) -> Result<Self> {
        if kinds.is_empty() {
            return Err(SonicPrepError::invalid_parameter(
                "roster",
                "[]",
                "at least one effect",
            ));
        }
        let mut roster = kinds.to_vec();
        roster.sort();
        roster.dedup();
        self.roster = roster;
        Ok(self)
    }

    /// Effects in the active roster
    pub fn roster(&self) -> &[EffectKind] {
        &self.roster
    }

    pub fn variants_per_combination(&self) -> usize {
        self.variants_per_combination
    }

    pub fn impulses(&self) -> &ImpulseLibrary {
        &self.impulses
    }

    /// Effect subsets in application order
    pub fn combinations(&self) -> Vec<Vec<EffectKind>> {
        proper_subsets(&self.roster)
    }

    /// Number of buffers `apply_combinations` returns
    pub fn output_count(&self) -> usize {
        let subsets = (1usize << self.roster.len()).saturating_sub(2);
        self.variants_per_combination * subsets
    }

    /// Apply every combination to `buffer`
    pub fn apply_combinations<R: Rng>(
        &self,
        buffer: &AudioBuffer,
        rng: &mut R,
    ) -> Result<Vec<AudioBuffer>> {
        Ok(self
            .run(buffer, rng, None)?
            .into_iter()
            .map(|augmented| augmented.data)
            .collect())
    }

    /// Like [`apply_combinations`](Self::apply_combinations), keeping the
    /// drawn effect parameters with each output
    pub fn apply_combinations_labeled<R: Rng>(
        &self,
        buffer: &AudioBuffer,
        rng: &mut R,
    ) -> Result<Vec<AugmentedBuffer>> {
        self.run(buffer, rng, None)
    }

    /// Like [`apply_combinations_labeled`](Self::apply_combinations_labeled),
    /// checking `cancel` before each combination
    pub fn apply_combinations_with_cancel<R: Rng>(
        &self,
        buffer: &AudioBuffer,
        rng: &mut R,
        cancel: &CancelToken,
    ) -> Result<Vec<AugmentedBuffer>> {
        self.run(buffer, rng, Some(cancel))
    }

    /// Apply `specs` in order, then the clip guard if enabled
    ///
    /// # Errors
    /// * `InvalidParameter` - If the buffer's sample rate is zero
    pub fn apply_chain(&self, buffer: &AudioBuffer, specs: &[EffectSpec]) -> Result<AudioBuffer> {
        check_sample_rate(buffer)?;
        let mut current = buffer.clone();
        for spec in specs {
            current = spec.apply(&current, &self.impulses)?;
        }
        if !current.is_finite() {
            let kinds: Vec<&str> = specs.iter().map(|s| s.kind().name()).collect();
            return Err(SonicPrepError::invalid_signal(format!(
                "effect chain [{}] produced non-finite samples",
                kinds.join(", ")
            )));
        }
        if self.clip_guard {
            current.clamp(1.0);
        }
        Ok(current)
    }

    /// Apply every combination, handing each output to `sink` as soon as it
    /// is produced instead of collecting them
    ///
    /// `cancel` is checked before each combination. An error from `sink`
    /// stops the run and is returned as is.
    pub fn for_each_combination<R, F>(
        &self,
        buffer: &AudioBuffer,
        rng: &mut R,
        cancel: Option<&CancelToken>,
        mut sink: F,
    ) -> Result<()>
    where
        R: Rng,
        F: FnMut(AugmentedBuffer) -> Result<()>,
    {
        check_sample_rate(buffer)?;
        if buffer.is_empty() {
            return Err(SonicPrepError::invalid_signal("cannot augment an empty buffer"));
        }
        if !buffer.is_finite() {
            return Err(SonicPrepError::invalid_signal(
                "buffer contains NaN or infinite samples",
            ));
        }

        let combinations = self.combinations();
        info!(
            combinations = combinations.len(),
            outputs = self.output_count(),
            "augmenting"
        );

        for combination in &combinations {
            if let Some(token) = cancel {
                token.check()?;
            }
            for _ in 0..self.variants_per_combination {
                let specs = combination
                    .iter()
                    .map(|&kind| EffectSpec::sample(kind, rng, &self.impulses))
                    .collect::<Result<Vec<_>>>()?;
                let data = self.apply_chain(buffer, &specs)?;
                sink(AugmentedBuffer { specs, data })?;
            }
            debug!(
                effects = ?combination.iter().map(EffectKind::name).collect::<Vec<_>>(),
                "combination applied"
            );
        }
        Ok(())
    }

    fn run<R: Rng>(
        &self,
        buffer: &AudioBuffer,
        rng: &mut R,
        cancel: Option<&CancelToken>,
    ) -> Result<Vec<AugmentedBuffer>> {
        let mut outputs = Vec::with_capacity(self.output_count());
        self.for_each_combination(buffer, rng, cancel, |augmented| {
            outputs.push(augmented);
            Ok(())
        })?;
        Ok(outputs)
    }
}

fn check_sample_rate(buffer: &AudioBuffer) -> Result<()> {
    if buffer.sample_rate == 0 {
        return Err(SonicPrepError::invalid_parameter("sample_rate", 0, "> 0 Hz"));
    }
    Ok(())
}
