//! Audio file I/O for SonicPrep
//!
//! Handles discovering, importing and exporting audio files. WAV is read and
//! written through `hound`; MP3 and FLAC sources are decoded with `symphonia`.
//! Export is always WAV.
//!
//! Imported audio keeps its native sample rate. Rate conversion belongs to
//! the standardization pipeline, not to I/O.

use std::fs::File;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::warn;
use walkdir::WalkDir;

use crate::engine::buffer::AudioBuffer;
use crate::error::{Result, SonicPrepError};

/// File extensions accepted as audio sources
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["wav", "mp3", "flac"];

/// Export format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFormat {
    /// Bit depth: 16, 24, or 32 (32 = float)
    pub bit_depth: u16,
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat { bit_depth: 24 }
    }
}

impl ExportFormat {
    /// Create format for CD quality (16-bit)
    pub fn cd_quality() -> Self {
        ExportFormat { bit_depth: 16 }
    }

    /// Create format for maximum quality (32-bit float)
    pub fn max_quality() -> Self {
        ExportFormat { bit_depth: 32 }
    }
}

/// Check that a file has one of the accepted audio extensions
///
/// # Errors
/// * `UnsupportedFormat` - If the extension is missing or not whitelisted
pub fn validate_audio_type(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(SonicPrepError::UnsupportedFormat {
            format: format!("File type .{} not supported", extension),
        })
    }
}

/// Find audio files directly inside `dir` with one of `extensions`
///
/// Matching is case-insensitive and does not descend into subdirectories.
/// Results are sorted by path so batch order is deterministic.
///
/// # Errors
/// * `FileNotFound` - If `dir` does not exist
/// * `NoFilesFound` - If no matching file is present
pub fn find_audio_files(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(SonicPrepError::FileNotFound {
            path: dir.display().to_string(),
            source: None,
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            SonicPrepError::Io(
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false);
        if matches {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        return Err(SonicPrepError::NoFilesFound {
            dir: dir.display().to_string(),
        });
    }

    files.sort();
    Ok(files)
}

/// Split a file list into consecutive batches of at most `batch_size`
///
/// A `batch_size` of zero is treated as one.
pub fn file_batches(files: &[PathBuf], batch_size: usize) -> impl Iterator<Item = &[PathBuf]> {
    files.chunks(batch_size.max(1))
}

/// Import an audio file at its native sample rate
///
/// WAV files go through `hound`; MP3 and FLAC through `symphonia`.
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `UnsupportedFormat` - If the extension is not whitelisted
/// * `InvalidAudio` - If the file cannot be decoded or has no samples
pub fn import_audio(path: &Path) -> Result<AudioBuffer> {
    validate_audio_type(path)?;

    if !path.exists() {
        return Err(SonicPrepError::FileNotFound {
            path: path.display().to_string(),
            source: None,
        });
    }

    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false);
    if !is_wav {
        return decode_compressed(path);
    }

    let reader = WavReader::open(path).map_err(|e| SonicPrepError::InvalidAudio {
        reason: format!("Failed to open WAV file: {}", e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    let samples = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;

    if samples.is_empty() {
        return Err(SonicPrepError::InvalidAudio {
            reason: format!("{} contains no samples", path.display()),
            source: None,
        });
    }

    AudioBuffer::from_interleaved(&samples, channels, spec.sample_rate)
}

/// Export an AudioBuffer to a WAV file at the buffer's own sample rate
///
/// 16 and 24-bit output saturates samples outside [-1, 1]; 32-bit float
/// writes them unchanged.
///
/// # Errors
/// * `UnsupportedFormat` - If the bit depth is not 16, 24 or 32
/// * `Io` - If the file cannot be written
pub fn export_audio(buffer: &AudioBuffer, path: &Path, format: ExportFormat) -> Result<()> {
    let spec = WavSpec {
        channels: buffer.channels() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: format.bit_depth,
        sample_format: if format.bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    if !matches!(format.bit_depth, 16 | 24 | 32) {
        return Err(SonicPrepError::UnsupportedFormat {
            format: format!("{}-bit audio (only 16, 24, 32 supported)", format.bit_depth),
        });
    }

    let mut writer = WavWriter::create(path, spec).map_err(hound_to_io)?;

    for sample in buffer.to_interleaved() {
        match format.bit_depth {
            16 => {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled).map_err(hound_to_io)?;
            }
            24 => {
                // 24-bit stored as i32 in hound
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer.write_sample(scaled).map_err(hound_to_io)?;
            }
            _ => writer.write_sample(sample).map_err(hound_to_io)?,
        }
    }

    writer.finalize().map_err(hound_to_io)?;
    Ok(())
}

/// Generate a mono sine test tone
pub fn generate_test_tone(frequency: f32, duration_secs: f32, sample_rate: u32) -> AudioBuffer {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let angular_freq = 2.0 * std::f64::consts::PI * frequency as f64 / sample_rate as f64;
    let samples = (0..num_samples)
        .map(|i| (angular_freq * i as f64).sin() as f32)
        .collect();
    AudioBuffer::mono(samples, sample_rate)
}

// ============================================================================
// Internal helper functions
// ============================================================================

/// Decode an MP3 or FLAC file into a buffer at its native rate and layout
fn decode_compressed(path: &Path) -> Result<AudioBuffer> {
    let invalid = |context: &str, e: SymphoniaError| SonicPrepError::InvalidAudio {
        reason: format!("{}: {}", context, e),
        source: Some(Box::new(e)),
    };

    let file = File::open(path).map_err(|e| SonicPrepError::FileNotFound {
        path: path.display().to_string(),
        source: Some(e),
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| invalid("Failed to probe file", e))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| SonicPrepError::InvalidAudio {
            reason: format!("{} has no audio track", path.display()),
            source: None,
        })?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count());
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| invalid("Failed to create decoder", e))?;

    let mut interleaved = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(invalid("Error reading packet", e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                warn!(path = %path.display(), reason, "skipping corrupt packet");
                continue;
            }
            Err(e) => return Err(invalid("Decode error", e)),
        };

        let spec = *decoded.spec();
        sample_rate = Some(spec.rate);
        channels = Some(spec.channels.count());
        let mut samples = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        samples.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(samples.samples());
    }

    let (Some(sample_rate), Some(channels)) = (sample_rate, channels) else {
        return Err(SonicPrepError::InvalidAudio {
            reason: format!("{} does not declare a sample rate and channel layout", path.display()),
            source: None,
        });
    };
    if interleaved.is_empty() {
        return Err(SonicPrepError::InvalidAudio {
            reason: format!("{} contains no samples", path.display()),
            source: None,
        });
    }

    AudioBuffer::from_interleaved(&interleaved, channels, sample_rate)
}

fn hound_to_io(e: hound::Error) -> SonicPrepError {
    match e {
        hound::Error::IoError(io) => SonicPrepError::Io(io),
        other => SonicPrepError::Io(std::io::Error::other(other.to_string())),
    }
}

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let invalid = |e: hound::Error| SonicPrepError::InvalidAudio {
        reason: format!("Failed to read {}-bit samples: {}", bits_per_sample, e),
        source: Some(Box::new(e)),
    };

    match (sample_format, bits_per_sample) {
        (SampleFormat::Float, _) => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid),
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| v as f32 / 128.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid),
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388608.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid),
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2147483648.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid),
        (SampleFormat::Int, bits) => Err(SonicPrepError::UnsupportedFormat {
            format: format!("{}-bit integer audio", bits),
        }),
    }
}
