//! Integration Tests
//!
//! End-to-end tests for the SonicPrep standardization pipeline and batch driver.

use std::fs;
use std::path::Path;

use approx::assert_abs_diff_eq;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use sonicprep::augment::{Augmenter, AugmenterConfig, EffectKind, ImpulseLibrary};
use sonicprep::engine::{export_audio, import_audio, ExportFormat};
use sonicprep::prep::{Manifest, OnError, PrepConfig, Prepper, MANIFEST_FILE};
use sonicprep::{AudioBuffer, CancelToken, PipelineConfig, SonicPrepError, Standardizer};

/// Helper to create a test sine wave buffer
fn create_sine_buffer(
    frequency: f64,
    amplitude: f64,
    sample_rate: u32,
    channels: usize,
    duration_secs: f64,
) -> AudioBuffer {
    let num_samples = (sample_rate as f64 * duration_secs) as usize;
    let channel: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            (amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin()) as f32
        })
        .collect();
    AudioBuffer::from_channels(vec![channel; channels], sample_rate).unwrap()
}

fn write_wav(dir: &Path, name: &str, buffer: &AudioBuffer) {
    export_audio(buffer, &dir.join(name), ExportFormat::default()).unwrap();
}

// === Standardization Tests ===

#[test]
fn test_long_recording_yields_seven_chunks() {
    let buffer = create_sine_buffer(440.0, 0.5, 44100, 1, 195.0);
    let standardizer = Standardizer::new(PipelineConfig::default()).unwrap();

    let variations = standardizer.standardize("long", &buffer).unwrap();
    assert_eq!(variations.len(), 8);

    let names: Vec<&str> = variations.iter().map(|v| v.name()).collect();
    assert_eq!(
        names,
        vec![
            "long_chunk_0",
            "long_chunk_1",
            "long_chunk_2",
            "long_chunk_3",
            "long_chunk_4",
            "long_chunk_5",
            "long_chunk_6",
            "long"
        ]
    );
    for chunk in &variations[..6] {
        assert_eq!(chunk.data().len(), 30 * 44100);
    }
    assert!(variations[6].data().len() < 30 * 44100);
    assert!(variations.iter().all(|v| v.root() == "long"));
}

#[test]
fn test_standardize_converts_rate_and_level() {
    let buffer = create_sine_buffer(440.0, 0.1, 48000, 2, 2.0);
    let standardizer = Standardizer::new(PipelineConfig::default()).unwrap();

    let variations = standardizer.standardize("tone", &buffer).unwrap();
    let whole = variations.last().unwrap();
    assert_eq!(whole.name(), "tone");
    assert_eq!(whole.data().sample_rate, 44100);
    assert_eq!(whole.data().channels(), 2);
    assert_abs_diff_eq!(whole.data().rms_db(), -0.1, epsilon = 0.5);
}

#[test]
fn test_standardize_rejects_silence() {
    let silent = AudioBuffer::from_channels(vec![vec![0.0; 44100]], 44100).unwrap();
    let standardizer = Standardizer::new(PipelineConfig::default()).unwrap();
    assert!(matches!(
        standardizer.standardize("silent", &silent),
        Err(SonicPrepError::InvalidSignal { .. })
    ));
}

#[test]
fn test_standardize_cancelled() {
    let buffer = create_sine_buffer(440.0, 0.5, 44100, 1, 0.5);
    let standardizer = Standardizer::new(PipelineConfig::default()).unwrap();
    let token = CancelToken::with_timeout(std::time::Duration::ZERO);
    assert!(matches!(
        standardizer.standardize_with_cancel("tone", &buffer, &token),
        Err(SonicPrepError::Cancelled)
    ));
}

// === WAV I/O Tests ===

#[test]
fn test_wav_round_trip_preserves_shape() {
    let dir = TempDir::new().unwrap();
    let buffer = create_sine_buffer(1000.0, 0.5, 48000, 2, 0.25);

    for format in [
        ExportFormat::cd_quality(),
        ExportFormat::default(),
        ExportFormat::max_quality(),
    ] {
        let path = dir.path().join(format!("tone_{}.wav", format.bit_depth));
        export_audio(&buffer, &path, format).unwrap();
        let loaded = import_audio(&path).unwrap();

        assert_eq!(loaded.sample_rate, 48000);
        assert_eq!(loaded.channels(), 2);
        assert_eq!(loaded.len(), buffer.len());
        for (a, b) in loaded.samples[0].iter().zip(&buffer.samples[0]) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-4);
        }
    }
}

#[test]
fn test_truncated_flac_is_invalid() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("song.flac");
    fs::write(&path, b"fLaC").unwrap();
    assert!(matches!(
        import_audio(&path),
        Err(SonicPrepError::InvalidAudio { .. })
    ));
}

#[test]
fn test_unlisted_extension_unsupported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("song.ogg");
    fs::write(&path, b"OggS").unwrap();
    assert!(matches!(
        import_audio(&path),
        Err(SonicPrepError::UnsupportedFormat { .. })
    ));
}

// === Batch Preparation Tests ===

#[test]
fn test_prep_with_augmentation() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_wav(
        input.path(),
        "voice.wav",
        &create_sine_buffer(330.0, 0.4, 44100, 1, 0.5),
    );

    let config = PrepConfig {
        output_dir: output.path().to_path_buf(),
        augment: Some(AugmenterConfig {
            variants_per_combination: 2,
            ..AugmenterConfig::default()
        }),
        seed: Some(3),
        ..PrepConfig::default()
    };
    let augmenter = Augmenter::with_impulses(config.augment.as_ref().unwrap(), ImpulseLibrary::default())
        .unwrap()
        .with_roster(&[EffectKind::Gain, EffectKind::Delay, EffectKind::Clipping])
        .unwrap();
    let prepper = Prepper::new(config).unwrap().with_augmenter(Some(augmenter));
    let manifest = prepper.run(input.path()).unwrap();

    assert_eq!(manifest.sources.len(), 1);
    let source = &manifest.sources[0];
    // voice_chunk_0 and voice, each augmented 2 * 6 times
    let augmented: Vec<_> = source.outputs.iter().filter(|o| !o.effects.is_empty()).collect();
    assert_eq!(augmented.len() + source.discarded * 2, 2 * 12 * 2);
    for out in &source.outputs {
        let path = output.path().join(&out.file);
        assert!(path.exists(), "missing {}", out.file);
    }
    assert!(source
        .outputs
        .iter()
        .any(|o| o.file == "voice_chunk_0_aug_0_chunk_0.wav"));
    assert!(source.outputs.iter().any(|o| o.file == "voice_aug_11.wav"));

    let saved = Manifest::load(&output.path().join(MANIFEST_FILE)).unwrap();
    assert_eq!(saved.run_id, manifest.run_id);
    assert_eq!(saved.output_count(), manifest.output_count());
}

#[test]
fn test_prep_same_seed_same_outputs() {
    let input = TempDir::new().unwrap();
    write_wav(
        input.path(),
        "a.wav",
        &create_sine_buffer(440.0, 0.5, 44100, 1, 0.3),
    );

    let run = |seed: u64| {
        let output = TempDir::new().unwrap();
        let config = PrepConfig {
            output_dir: output.path().to_path_buf(),
            augment: Some(AugmenterConfig {
                variants_per_combination: 1,
                ..AugmenterConfig::default()
            }),
            seed: Some(seed),
            ..PrepConfig::default()
        };
        let augmenter = Augmenter::with_impulses(config.augment.as_ref().unwrap(), ImpulseLibrary::default())
            .unwrap()
            .with_roster(&[EffectKind::Gain, EffectKind::Bitcrush])
            .unwrap();
        let manifest = Prepper::new(config)
            .unwrap()
            .with_augmenter(Some(augmenter))
            .run(input.path())
            .unwrap();
        manifest.sources[0]
            .outputs
            .iter()
            .map(|o| o.effects.clone())
            .collect::<Vec<_>>()
    };

    assert_eq!(run(21), run(21));
}

#[test]
fn test_prep_skip_corrupt_sources() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_wav(
        input.path(),
        "a.wav",
        &create_sine_buffer(440.0, 0.5, 44100, 1, 0.3),
    );
    fs::write(input.path().join("b.mp3"), b"ID3").unwrap();

    let config = PrepConfig {
        output_dir: output.path().to_path_buf(),
        on_error: OnError::Skip,
        ..PrepConfig::default()
    };
    let manifest = Prepper::new(config).unwrap().run(input.path()).unwrap();
    assert_eq!(manifest.sources.len(), 1);
    assert_eq!(manifest.failures.len(), 1);
    assert_eq!(manifest.failures[0].code, "INVALID_AUDIO");
}

#[test]
fn test_prep_empty_directory() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let config = PrepConfig {
        output_dir: output.path().to_path_buf(),
        ..PrepConfig::default()
    };
    assert!(matches!(
        Prepper::new(config).unwrap().run(input.path()),
        Err(SonicPrepError::NoFilesFound { .. })
    ));
}
