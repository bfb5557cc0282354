//! Standardization Pipeline
//!
//! Turns a decoded source buffer into a list of named [`Variation`]s with a
//! uniform sample rate, loudness, band and chunk length.

pub mod config;
pub mod standardizer;
pub mod variation;

pub use config::PipelineConfig;
pub use standardizer::Standardizer;
pub use variation::{chunk_name, Variation, VariationSummary};
