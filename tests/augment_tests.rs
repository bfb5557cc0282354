//! Augmentation Tests
//!
//! Exercise the combinatorial engine over the full effect roster.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use sonicprep::augment::{Augmenter, AugmenterConfig, EffectKind, ImpulseLibrary, ROSTER};
use sonicprep::engine::generate_test_tone;
use sonicprep::{AudioBuffer, CancelToken, SonicPrepError};

fn dirac_library() -> ImpulseLibrary {
    let mut ir = vec![0.0; 16];
    ir[0] = 1.0;
    ImpulseLibrary::from_buffers(vec![("dirac".to_string(), AudioBuffer::mono(ir, 44100))])
}

/// Very short clip so the full roster stays fast
fn short_clip() -> AudioBuffer {
    let tone = generate_test_tone(1000.0, 0.003, 44100);
    AudioBuffer::mono(tone.samples[0].iter().map(|s| s * 0.5).collect(), 44100)
}

#[test]
fn test_full_roster_output_count() {
    let augmenter = Augmenter::with_impulses(&AugmenterConfig::default(), dirac_library()).unwrap();
    let clip = short_clip();

    let outputs = augmenter
        .apply_combinations(&clip, &mut StdRng::seed_from_u64(2024))
        .unwrap();

    assert_eq!(outputs.len(), 6138);
    for out in &outputs {
        assert_eq!(out.len(), clip.len());
        assert_eq!(out.channels(), 1);
        assert_eq!(out.sample_rate, 44100);
        assert!(out.is_finite());
        assert!(out.peak() <= 1.0);
    }
}

#[test]
fn test_labels_follow_roster_order() {
    let config = AugmenterConfig {
        variants_per_combination: 1,
        ..AugmenterConfig::default()
    };
    let augmenter = Augmenter::with_impulses(&config, dirac_library()).unwrap();
    let outputs = augmenter
        .apply_combinations_labeled(&short_clip(), &mut StdRng::seed_from_u64(1))
        .unwrap();

    assert_eq!(outputs.len(), 2046);
    assert_eq!(outputs[0].kinds(), vec![EffectKind::Chorus]);
    assert_eq!(outputs[10].kinds(), vec![EffectKind::Bitcrush]);
    assert_eq!(outputs.last().unwrap().kinds(), ROSTER[1..].to_vec());
    for out in &outputs {
        let kinds = out.kinds();
        assert!(!kinds.is_empty() && kinds.len() < ROSTER.len());
        assert!(kinds.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn test_same_seed_same_outputs() {
    let augmenter = Augmenter::with_impulses(&AugmenterConfig::default(), dirac_library())
        .unwrap()
        .with_roster(&[
            EffectKind::Chorus,
            EffectKind::PitchShift,
            EffectKind::Convolution,
            EffectKind::Resampling,
        ])
        .unwrap();
    let clip = short_clip();

    let a = augmenter
        .apply_combinations_labeled(&clip, &mut StdRng::seed_from_u64(99))
        .unwrap();
    let b = augmenter
        .apply_combinations_labeled(&clip, &mut StdRng::seed_from_u64(99))
        .unwrap();
    let c = augmenter
        .apply_combinations_labeled(&clip, &mut StdRng::seed_from_u64(100))
        .unwrap();

    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_expired_token_cancels_augmentation() {
    let augmenter = Augmenter::with_impulses(&AugmenterConfig::default(), dirac_library()).unwrap();
    let token = CancelToken::with_timeout(Duration::ZERO);
    let result =
        augmenter.apply_combinations_with_cancel(&short_clip(), &mut StdRng::seed_from_u64(1), &token);
    assert!(matches!(result, Err(SonicPrepError::Cancelled)));
}

#[test]
fn test_convolution_without_impulses_fails() {
    let augmenter = Augmenter::with_impulses(&AugmenterConfig::default(), ImpulseLibrary::default())
        .unwrap();
    let result = augmenter.apply_combinations(&short_clip(), &mut StdRng::seed_from_u64(1));
    assert!(matches!(
        result,
        Err(SonicPrepError::DependencyFailure { .. })
    ));
}
