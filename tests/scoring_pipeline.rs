use std::sync::atomic::{AtomicUsize, Ordering};

use vocalyzer::config::AnalysisConfig;
use vocalyzer::error::{ContourRole, ErrorKind, Result, ScoringError};
use vocalyzer::scoring::metrics::ScoreMapper;
use vocalyzer::scoring::session::{ScoreResponse, VocalAnalyser};
use vocalyzer::scoring::{self, PitchContour, PitchScorer};
use vocalyzer::services::{FeatureStore, MemoryFeatureStore, PassthroughIsolator};
use vocalyzer::types::AudioData;

const SAMPLE_RATE: u32 = 22_050;

fn scorer() -> PitchScorer {
    PitchScorer::from_config(&AnalysisConfig::default()).expect("default settings")
}

#[test]
fn identical_contours_with_gaps_score_one_hundred() {
    let contour = PitchContour::from_hz(&[220.0, 220.0, 0.0, 440.0, 440.0]);
    let report = scorer().score_contours(&contour, &contour).unwrap();
    assert_eq!(report.score, 100.0);
    assert_eq!(report.distance, 0.0);
}

#[test]
fn silent_user_contour_is_a_voicing_error() {
    let reference = PitchContour::from_hz(&[220.0; 5]);
    let user = PitchContour::from_hz(&[0.0; 5]);
    let err = scorer().score_contours(&reference, &user).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::VoicingError);
    assert!(matches!(
        err,
        ScoringError::NoVoicedFrames {
            role: Some(ContourRole::User)
        }
    ));
}

#[test]
fn contours_of_different_length_score_strictly_between_bounds() {
    let reference = PitchContour::from_hz(&[220.0, 247.0, 262.0, 294.0, 330.0]);
    let user = PitchContour::from_hz(&[233.0, 277.0, 349.0]);
    let report = scorer().score_contours(&reference, &user).unwrap();
    assert!(report.score > 0.0 && report.score < 100.0, "score {}", report.score);
    assert_eq!((report.score * 100.0).round() / 100.0, report.score);
    assert_eq!(report.reference_frames, 5);
    assert_eq!(report.user_frames, 3);
}

#[test]
fn empty_reference_is_an_input_error() {
    let audio = AudioData::new(vec![0.1; 4096], SAMPLE_RATE);
    let err = scoring::score(&PitchContour::default(), &audio, &AnalysisConfig::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputError);
    assert!(matches!(
        err,
        ScoringError::EmptySequence {
            role: ContourRole::Reference
        }
    ));
}

#[test]
fn scores_fall_as_distance_grows_and_floor_at_zero() {
    let mapper = ScoreMapper::new();
    let scores: Vec<f64> = [0.0, 0.5, 1.0, 4.0, 9.5, 10.0, 250.0]
        .iter()
        .map(|&d| mapper.map(d, 10).unwrap())
        .collect();
    assert_eq!(scores[0], 100.0);
    assert!(scores.windows(2).all(|pair| pair[1] <= pair[0]));
    assert_eq!(scores[5], 0.0);
    assert_eq!(scores[6], 0.0);
}

#[test]
fn recording_scored_against_its_own_reference_is_perfect() {
    let config = AnalysisConfig::default();
    let scorer = PitchScorer::from_config(&config).unwrap();
    let take = melody_clip(&[262.0, 294.0, 330.0, 294.0]);
    let reference = scorer.extract(&take).unwrap();

    let report = scoring::score(&reference, &take, &config).unwrap();
    assert_eq!(report.score, 100.0);
    assert!(report.voiced_fraction > 0.8);
}

#[test]
fn renditions_at_other_rates_are_scored_on_the_reference_grid() {
    let config = AnalysisConfig::default();
    let notes = [262.0, 294.0, 330.0, 349.0, 392.0, 330.0];
    let reference = PitchScorer::from_config(&config)
        .unwrap()
        .extract(&melody_clip_at(&notes, SAMPLE_RATE))
        .unwrap();

    for (rate, floor) in [(44_100, 98.0), (16_000, 95.0)] {
        let report = scoring::score(&reference, &melody_clip_at(&notes, rate), &config).unwrap();
        assert_eq!(
            report.user_frames,
            reference.len(),
            "{rate} Hz take framed on a different grid"
        );
        assert!(report.score > floor, "{rate} Hz take scored {}", report.score);
    }
}

#[test]
fn analyser_scores_resampled_recordings() {
    let analyser = VocalAnalyser::new(
        MemoryFeatureStore::new(),
        PassthroughIsolator,
        &AnalysisConfig::default(),
    )
    .unwrap();
    let take = melody_clip(&[220.0, 247.0, 262.0, 247.0]);
    analyser.publish_reference("tune", take.clone()).unwrap();
    assert!(analyser.store().get("tune").is_ok());

    let upsampled = AudioData::new(
        vocalyzer::audio::resample::linear_resample(&take.samples, SAMPLE_RATE, 44_100).unwrap(),
        44_100,
    );
    let response = analyser.respond("tune", upsampled);
    match response {
        ScoreResponse::Score { score } => assert!(score > 90.0, "score {score}"),
        other => panic!("expected a score, got {other:?}"),
    }
}

#[test]
fn unknown_song_fails_before_isolation() {
    let calls = AtomicUsize::new(0);
    let isolator = |audio: AudioData| -> Result<AudioData> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(audio)
    };
    let analyser = VocalAnalyser::new(
        MemoryFeatureStore::new().with_song("known", vec![220.0; 10]),
        isolator,
        &AnalysisConfig::default(),
    )
    .unwrap();
    let response = analyser.respond("unknown", melody_clip(&[220.0]));
    assert!(response.is_error());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    let ScoreResponse::Error { error } = response else {
        panic!("expected error response");
    };
    assert_eq!(error.kind, ErrorKind::InputError);
}

#[test]
fn separator_outage_is_reported_as_upstream() {
    let isolator = |_: AudioData| -> Result<AudioData> {
        Err(ScoringError::upstream("vocal isolation", "service unavailable"))
    };
    let analyser = VocalAnalyser::new(
        MemoryFeatureStore::new().with_song("known", vec![220.0; 10]),
        isolator,
        &AnalysisConfig::default(),
    )
    .unwrap();
    let err = analyser.analyse("known", melody_clip(&[220.0])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamError);
    assert_eq!(err.to_string(), "vocal isolation failed: service unavailable");
}

#[test]
fn empty_recording_is_rejected_up_front() {
    let analyser = VocalAnalyser::new(
        MemoryFeatureStore::new().with_song("known", vec![220.0; 10]),
        PassthroughIsolator,
        &AnalysisConfig::default(),
    )
    .unwrap();
    let err = analyser
        .analyse("known", AudioData::new(Vec::new(), SAMPLE_RATE))
        .unwrap_err();
    assert!(matches!(err, ScoringError::InvalidAudio { .. }));
}

fn melody_clip(notes: &[f32]) -> AudioData {
    melody_clip_at(notes, SAMPLE_RATE)
}

/// Quarter-second notes, phase-continuous across note changes.
fn melody_clip_at(notes: &[f32], sample_rate: u32) -> AudioData {
    let per_note = sample_rate as usize / 4;
    let dt = 1.0 / sample_rate as f32;
    let mut phase = 0.0_f32;
    let mut samples = Vec::with_capacity(per_note * notes.len());
    for &freq in notes {
        for _ in 0..per_note {
            phase += 2.0 * std::f32::consts::PI * freq * dt;
            samples.push(phase.sin() * 0.4);
        }
    }
    AudioData::new(samples, sample_rate)
}
