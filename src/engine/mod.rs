//! Audio Engine Module
//!
//! Core audio data handling:
//! - Sample buffer type shared by every stage
//! - File discovery, batching and WAV I/O

pub mod buffer;
pub mod io;

pub use buffer::{db_to_linear, linear_to_db, AudioBuffer, ChannelLayout};
pub use io::{
    export_audio, file_batches, find_audio_files, generate_test_tone, import_audio,
    validate_audio_type, ExportFormat, ACCEPTED_EXTENSIONS,
};
