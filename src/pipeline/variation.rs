//! Named pipeline outputs

use serde::{Deserialize, Serialize};

use crate::engine::AudioBuffer;

/// A named, immutable output of the standardization pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Variation {
    root: String,
    name: String,
    data: AudioBuffer,
}

impl Variation {
    /// Create a variation derived from the source called `root`
    pub fn new(root: impl Into<String>, name: impl Into<String>, data: AudioBuffer) -> Self {
        Self {
            root: root.into(),
            name: name.into(),
            data,
        }
    }

    /// Name of the source this variation came from
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Unique name of this variation
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Audio content
    pub fn data(&self) -> &AudioBuffer {
        &self.data
    }

    /// Consume the variation and keep its audio
    pub fn into_data(self) -> AudioBuffer {
        self.data
    }

    /// Manifest-friendly description of this variation
    pub fn summary(&self) -> VariationSummary {
        VariationSummary {
            root: self.root.clone(),
            name: self.name.clone(),
            sample_rate: self.data.sample_rate,
            channels: self.data.channels(),
            samples: self.data.len(),
            duration_secs: self.data.duration_secs(),
        }
    }
}

/// Serializable summary of a [`Variation`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariationSummary {
    pub root: String,
    pub name: String,
    pub sample_rate: u32,
    pub channels: usize,
    pub samples: usize,
    pub duration_secs: f64,
}

/// Name of chunk `index` of the variation called `name`
pub fn chunk_name(name: &str, index: usize) -> String {
    format!("{name}_chunk_{index}")
}
