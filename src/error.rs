//! Error handling for SonicPrep
//!
//! Transforms never recover from errors themselves; every failure surfaces
//! to the direct caller, and batch drivers decide whether to abort or skip.

use thiserror::Error;

/// Result type alias for SonicPrep operations
pub type Result<T> = std::result::Result<T, SonicPrepError>;

/// Main error type for SonicPrep operations
#[derive(Error, Debug)]
pub enum SonicPrepError {
    // Parameter Errors
    #[error("Invalid parameter {param} = {value} (expected {expected})")]
    InvalidParameter {
        param: String,
        value: String,
        expected: String,
    },

    #[error("{param} = {value} is outside the supported range [{min}, {max}]")]
    OutOfRange {
        param: String,
        value: String,
        min: String,
        max: String,
    },

    // Signal Errors
    #[error("Invalid signal: {reason}")]
    InvalidSignal { reason: String },

    // Augmentation Errors
    #[error("Effect '{effect}' could not complete: {reason}")]
    DependencyFailure { effect: String, reason: String },

    #[error("Operation cancelled")]
    Cancelled,

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("No audio files found in {dir}")]
    NoFilesFound { dir: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SonicPrepError {
    /// Shorthand for an `InvalidParameter` error
    pub fn invalid_parameter(
        param: &str,
        value: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        SonicPrepError::InvalidParameter {
            param: param.to_string(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }

    /// Shorthand for an `InvalidSignal` error
    pub fn invalid_signal(reason: impl Into<String>) -> Self {
        SonicPrepError::InvalidSignal {
            reason: reason.into(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            SonicPrepError::InvalidParameter { .. } => "INVALID_PARAMETER",
            SonicPrepError::OutOfRange { .. } => "OUT_OF_RANGE",
            SonicPrepError::InvalidSignal { .. } => "INVALID_SIGNAL",
            SonicPrepError::DependencyFailure { .. } => "DEPENDENCY_FAILURE",
            SonicPrepError::Cancelled => "CANCELLED",
            SonicPrepError::FileNotFound { .. } => "FILE_NOT_FOUND",
            SonicPrepError::InvalidAudio { .. } => "INVALID_AUDIO",
            SonicPrepError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            SonicPrepError::NoFilesFound { .. } => "NO_FILES_FOUND",
            SonicPrepError::Io(_) => "IO_ERROR",
            SonicPrepError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check whether a batch driver may skip this error and keep going.
    ///
    /// Per-file problems (bad signal, undecodable file, failed effect) are
    /// skippable; configuration mistakes and cancellation are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SonicPrepError::InvalidSignal { .. }
                | SonicPrepError::DependencyFailure { .. }
                | SonicPrepError::FileNotFound { .. }
                | SonicPrepError::InvalidAudio { .. }
                | SonicPrepError::UnsupportedFormat { .. }
        )
    }
}
