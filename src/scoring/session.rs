use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::AnalysisConfig;
use crate::error::{ContourRole, ErrorKind, Result, ScoringError};
use crate::services::{render_report, FeatureStore, FeedbackGenerator, ReferenceFeatures, VocalIsolator};
use crate::types::AudioData;

use super::{PitchScorer, ScoreReport};

const ISOLATION_SERVICE: &str = "vocal isolation";

/// Scores recordings of known songs: reference lookup, vocal isolation, then
/// the pitch scorer (which brings the vocals to the analysis rate).
pub struct VocalAnalyser<S, I> {
    store: S,
    isolator: I,
    scorer: PitchScorer,
    config: AnalysisConfig,
}

impl<S, I> VocalAnalyser<S, I>
where
    S: FeatureStore,
    I: VocalIsolator,
{
    pub fn new(store: S, isolator: I, config: &AnalysisConfig) -> Result<Self> {
        Ok(Self {
            store,
            isolator,
            scorer: PitchScorer::from_config(config)?,
            config: config.clone(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Scores `recording` against the stored reference for `song_id`.
    ///
    /// The reference is fetched before isolation runs, so an unknown song
    /// never reaches the separator.
    pub fn analyse(&self, song_id: &str, recording: AudioData) -> Result<ScoreReport> {
        let started = Instant::now();
        ensure_playable(&recording)?;

        let features = self.store.get(song_id)?;
        self.check_reference(song_id, &features)?;
        let reference = features.contour();

        let vocals = self.isolate(recording)?;
        let mut report = self.scorer.score_audio(&reference, &vocals)?;
        report.song_id = Some(song_id.to_string());
        info!(
            song_id,
            score = report.score,
            distance = report.distance,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "recording scored"
        );
        Ok(report)
    }

    /// Extracts the reference contour of `recording` and stores it under `song_id`.
    pub fn publish_reference(&self, song_id: &str, recording: AudioData) -> Result<ReferenceFeatures> {
        ensure_playable(&recording)?;
        let vocals = self.isolate(recording)?;
        let contour = self.scorer.extract(&vocals)?;
        if contour.voiced_count() == 0 {
            return Err(ScoringError::NoVoicedFrames {
                role: Some(ContourRole::Reference),
            });
        }
        let features = ReferenceFeatures::from_contour(
            &contour,
            self.config.sample_rate,
            self.config.tracker.hop_length,
        );
        self.store.put(song_id, &features)?;
        info!(
            song_id,
            frames = contour.len(),
            voiced = contour.voiced_count(),
            "reference published"
        );
        Ok(features)
    }

    /// Runs [`Self::analyse`] and folds the outcome into a wire response.
    pub fn respond(&self, song_id: &str, recording: AudioData) -> ScoreResponse {
        let result = self.analyse(song_id, recording);
        if let Err(err) = &result {
            error!(song_id, kind = %err.kind(), error = %err, "scoring failed");
        }
        ScoreResponse::from(result)
    }

    /// Markdown report for a finished score. Coaching text is best effort.
    pub fn feedback_report<F: FeedbackGenerator>(&self, report: &ScoreReport, coach: &F) -> String {
        let song_id = report.song_id.as_deref().unwrap_or("your song");
        match coach.feedback(song_id, report.score) {
            Ok(text) => render_report(report.score, Some(&text)),
            Err(err) => {
                warn!(song_id, error = %err, "feedback unavailable, reporting score only");
                render_report(report.score, None)
            }
        }
    }

    fn isolate(&self, recording: AudioData) -> Result<AudioData> {
        let vocals = self.isolator.isolate(recording).map_err(|err| match err {
            err @ ScoringError::Upstream { .. } => err,
            other => ScoringError::upstream(ISOLATION_SERVICE, other),
        })?;
        debug!(
            samples = vocals.samples.len(),
            sample_rate = vocals.sample_rate,
            "vocals isolated"
        );
        Ok(vocals)
    }

    /// Stored contours are only comparable when framed the same way as the user's.
    fn check_reference(&self, song_id: &str, features: &ReferenceFeatures) -> Result<()> {
        if let Some(rate) = features.sample_rate {
            if rate != self.config.sample_rate {
                return Err(ScoringError::invalid_request(format!(
                    "reference for \"{song_id}\" was extracted at {rate} Hz, analysis runs at {} Hz",
                    self.config.sample_rate
                )));
            }
        }
        if let Some(hop) = features.hop_length {
            if hop != self.config.tracker.hop_length {
                return Err(ScoringError::invalid_request(format!(
                    "reference for \"{song_id}\" uses hop {hop}, analysis uses hop {}",
                    self.config.tracker.hop_length
                )));
            }
        }
        Ok(())
    }
}

fn ensure_playable(recording: &AudioData) -> Result<()> {
    if recording.is_empty() {
        return Err(ScoringError::invalid_audio("recording is empty"));
    }
    if recording.sample_rate == 0 {
        return Err(ScoringError::invalid_audio("recording has no sample rate"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

/// Either a score or a classified error, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScoreResponse {
    Score { score: f64 },
    Error { error: ErrorBody },
}

impl ScoreResponse {
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        ScoreResponse::Error {
            error: ErrorBody {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ScoreResponse::Error { .. })
    }
}

impl From<Result<ScoreReport>> for ScoreResponse {
    fn from(result: Result<ScoreReport>) -> Self {
        match result {
            Ok(report) => ScoreResponse::Score {
                score: report.score,
            },
            Err(err) => ScoreResponse::failure(err.kind(), err.to_string()),
        }
    }
}
