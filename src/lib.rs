//! SonicPrep - Audio Dataset Preparation
//!
//! SonicPrep turns raw recordings into uniform training material:
//! 1. Standardization - resample, loudness-normalize, trim silence,
//!    bandpass-filter and chunk every source into `Variation`s
//! 2. Augmentation - apply every non-trivial subset of eleven effects,
//!    several times each with randomized parameters
//!
//! # Architecture
//!
//! - `engine`: sample buffers and WAV I/O
//! - `dsp`: the individual standardization transforms
//! - `pipeline`: the fixed-order `Standardizer`
//! - `augment`: the effect roster and combinatorial `Augmenter`
//! - `prep`: the batch driver that ties everything to the file system

pub mod augment;
pub mod cancel;
pub mod cli;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod prep;

pub use augment::{Augmenter, AugmenterConfig, EffectKind, EffectSpec};
pub use cancel::CancelToken;
pub use engine::AudioBuffer;
pub use error::{Result, SonicPrepError};
pub use pipeline::{PipelineConfig, Standardizer, Variation};
pub use prep::{PrepConfig, Prepper};
