pub mod alignment;
pub mod cli;
pub mod features;
pub mod metrics;
pub mod session;

use std::borrow::Cow;

use serde::Serialize;
use tracing::debug;

use crate::audio::resample;
use crate::config::AnalysisConfig;
use crate::error::{ContourRole, ScoringError};
use crate::types::AudioData;

pub use crate::error::Result;

use alignment::AlignmentEngine;
use features::{ContourNormalizer, PitchTracker};
use metrics::ScoreMapper;

/// Single pitch estimate for one analysis frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchFrame {
    pub index: usize,
    /// Estimated fundamental frequency; exactly `0.0` when unvoiced.
    pub frequency_hz: f64,
    pub voiced: bool,
    /// Periodicity confidence in `[0, 1]`; `0.0` when unvoiced.
    pub confidence: f64,
}

impl PitchFrame {
    /// Builds a voiced frame, falling back to unvoiced for non-positive or non-finite input.
    pub fn voiced(index: usize, frequency_hz: f64, confidence: f64) -> Self {
        if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
            return Self::unvoiced(index);
        }
        Self {
            index,
            frequency_hz,
            voiced: true,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn unvoiced(index: usize) -> Self {
        Self {
            index,
            frequency_hz: 0.0,
            voiced: false,
            confidence: 0.0,
        }
    }
}

/// Time-ordered, gap-free sequence of pitch frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PitchContour {
    frames: Vec<PitchFrame>,
}

impl PitchContour {
    /// Re-indexes `frames` so that frame `k` carries index `k`.
    pub fn from_frames(frames: impl IntoIterator<Item = PitchFrame>) -> Self {
        let frames = frames
            .into_iter()
            .enumerate()
            .map(|(index, frame)| PitchFrame { index, ..frame })
            .collect();
        Self { frames }
    }

    /// Interprets a persisted Hz array where `0` (or any non-positive value) marks an unvoiced frame.
    pub fn from_hz(values: &[f64]) -> Self {
        let frames = values
            .iter()
            .enumerate()
            .map(|(index, &hz)| PitchFrame::voiced(index, hz, 1.0))
            .collect();
        Self { frames }
    }

    pub fn to_hz(&self) -> Vec<f64> {
        self.frames.iter().map(|frame| frame.frequency_hz).collect()
    }

    pub fn frames(&self) -> &[PitchFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn voiced_count(&self) -> usize {
        self.frames.iter().filter(|frame| frame.voiced).count()
    }

    pub fn voiced_fraction(&self) -> f64 {
        if self.frames.is_empty() {
            0.0
        } else {
            self.voiced_count() as f64 / self.frames.len() as f64
        }
    }
}

/// Normalized pitch values; `None` is the sentinel for frames that carried no pitch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedContour {
    values: Vec<Option<f64>>,
}

impl NormalizedContour {
    pub fn from_values(values: Vec<Option<f64>>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Outcome of scoring one rendition against a reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song_id: Option<String>,
    /// Score in `[0, 100]`, rounded to two decimals.
    pub score: f64,
    pub distance: f64,
    pub reference_frames: usize,
    pub user_frames: usize,
    pub voiced_fraction: f64,
}

/// The four pitch-scoring stages wired together with one configuration.
#[derive(Debug, Clone)]
pub struct PitchScorer {
    /// Rate every buffer is brought to before tracking, so contours share one time grid.
    sample_rate: u32,
    tracker: PitchTracker,
    normalizer: ContourNormalizer,
    aligner: AlignmentEngine,
    mapper: ScoreMapper,
}

impl PitchScorer {
    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sample_rate: config.sample_rate,
            tracker: PitchTracker::new(config.tracker.clone())?,
            normalizer: ContourNormalizer::new(config.normalizer)?,
            aligner: AlignmentEngine::new(config.alignment)?,
            mapper: ScoreMapper::new(),
        })
    }

    /// Extracts the pitch contour of a vocal buffer at the analysis rate.
    pub fn extract(&self, audio: &AudioData) -> Result<PitchContour> {
        let audio = self.at_analysis_rate(audio)?;
        self.tracker.track(&audio)
    }

    /// Scores a user recording against a precomputed reference contour.
    pub fn score_audio(&self, reference: &PitchContour, user_audio: &AudioData) -> Result<ScoreReport> {
        ensure_non_empty(reference, ContourRole::Reference)?;
        let user = self.extract(user_audio)?;
        self.score_contours(reference, &user)
    }

    /// Scores two pitch contours; every stage short-circuits on failure.
    pub fn score_contours(&self, reference: &PitchContour, user: &PitchContour) -> Result<ScoreReport> {
        ensure_non_empty(reference, ContourRole::Reference)?;
        ensure_non_empty(user, ContourRole::User)?;
        let reference_norm = self
            .normalizer
            .normalize(reference)
            .map_err(|err| err.for_role(ContourRole::Reference))?;
        let user_norm = self
            .normalizer
            .normalize(user)
            .map_err(|err| err.for_role(ContourRole::User))?;
        let distance = self.aligner.distance(&reference_norm, &user_norm)?;
        let raw = self.mapper.map(distance, reference.len())?;
        debug!(
            distance,
            raw_score = raw,
            reference_frames = reference.len(),
            user_frames = user.len(),
            "contours scored"
        );
        Ok(ScoreReport {
            song_id: None,
            score: metrics::round2(raw),
            distance,
            reference_frames: reference.len(),
            user_frames: user.len(),
            voiced_fraction: user.voiced_fraction(),
        })
    }

    fn at_analysis_rate<'a>(&self, audio: &'a AudioData) -> Result<Cow<'a, AudioData>> {
        if audio.sample_rate == self.sample_rate {
            return Ok(Cow::Borrowed(audio));
        }
        let samples = resample::linear_resample(&audio.samples, audio.sample_rate, self.sample_rate)?;
        debug!(
            from = audio.sample_rate,
            to = self.sample_rate,
            "resampled to analysis rate"
        );
        Ok(Cow::Owned(AudioData::new(samples, self.sample_rate)))
    }
}

/// Scores `user_audio` against `reference` using the stages described by `config`.
pub fn score(
    reference: &PitchContour,
    user_audio: &AudioData,
    config: &AnalysisConfig,
) -> Result<ScoreReport> {
    PitchScorer::from_config(config)?.score_audio(reference, user_audio)
}

fn ensure_non_empty(contour: &PitchContour, role: ContourRole) -> Result<()> {
    if contour.is_empty() {
        return Err(ScoringError::EmptySequence { role });
    }
    Ok(())
}
