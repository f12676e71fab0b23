mod contour;
mod statistics;
mod viterbi;
mod yin;

use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScoringError};
use crate::scoring::{PitchContour, PitchFrame};
use crate::types::AudioData;

pub use contour::{ContourNormalizer, NormalizerConfig};
pub use viterbi::SmoothingConfig;

use yin::{analyse_frame, Candidate, FrameAnalysis, LagRange};

/// Note C2.
pub const DEFAULT_FMIN: f64 = 65.406_391_325_149_66;
/// Note C7.
pub const DEFAULT_FMAX: f64 = 2_093.004_522_404_789;

/// Framing and search settings for the fundamental-frequency tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub frame_length: usize,
    pub hop_length: usize,
    pub fmin: f64,
    pub fmax: f64,
    /// Absolute aperiodicity threshold below which a dip counts as voiced.
    pub threshold: f64,
    /// Frames whose RMS falls below this level are unvoiced without analysis.
    pub min_rms: f64,
    pub max_candidates: usize,
    /// Viterbi smoothing of the per-frame decisions; `None` keeps raw YIN picks.
    pub smoothing: Option<SmoothingConfig>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            frame_length: 2048,
            hop_length: 512,
            fmin: DEFAULT_FMIN,
            fmax: DEFAULT_FMAX,
            threshold: 0.15,
            min_rms: 0.005,
            max_candidates: 4,
            smoothing: Some(SmoothingConfig::default()),
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.hop_length == 0 || self.frame_length == 0 {
            return Err(ScoringError::invalid_config(
                "frame_length and hop_length must be positive",
            ));
        }
        if !(self.fmin.is_finite() && self.fmin > 0.0) {
            return Err(ScoringError::invalid_config(format!(
                "fmin must be positive, got {}",
                self.fmin
            )));
        }
        if !(self.fmax.is_finite() && self.fmax > self.fmin) {
            return Err(ScoringError::invalid_config(format!(
                "fmax ({}) must exceed fmin ({})",
                self.fmax, self.fmin
            )));
        }
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(ScoringError::invalid_config(format!(
                "threshold must lie in (0, 1], got {}",
                self.threshold
            )));
        }
        if !(self.min_rms.is_finite() && self.min_rms >= 0.0) {
            return Err(ScoringError::invalid_config("min_rms must be non-negative"));
        }
        if self.max_candidates == 0 {
            return Err(ScoringError::invalid_config(
                "max_candidates must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Turns a mono buffer into a per-frame pitch contour.
#[derive(Debug, Clone)]
pub struct PitchTracker {
    config: TrackerConfig,
}

impl PitchTracker {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Checks that the lag search fits the frame at `sample_rate`.
    pub fn supports_rate(&self, sample_rate: u32) -> Result<()> {
        LagRange::new(sample_rate, &self.config).map(|_| ())
    }

    /// Number of frames produced for a buffer of `sample_count` samples.
    pub fn frame_count(&self, sample_count: usize) -> usize {
        1 + sample_count / self.config.hop_length
    }

    pub fn track(&self, audio: &AudioData) -> Result<PitchContour> {
        if audio.samples.is_empty() {
            return Err(ScoringError::invalid_audio("audio buffer is empty"));
        }
        if audio.sample_rate == 0 {
            return Err(ScoringError::invalid_audio("sample rate must be positive"));
        }
        let lags = LagRange::new(audio.sample_rate, &self.config)?;
        let frame_count = self.frame_count(audio.samples.len());

        let analyses: Vec<FrameAnalysis> = (0..frame_count)
            .into_par_iter()
            .map(|t| {
                let bounds = self.frame_bounds(t, audio.samples.len());
                analyse_frame(&audio.samples[bounds], audio.sample_rate, lags, &self.config)
            })
            .collect();

        let picks: Vec<Option<Candidate>> = match &self.config.smoothing {
            Some(smoothing) => viterbi::decode(&analyses, self.config.threshold, smoothing),
            None => analyses
                .iter()
                .map(|analysis| analysis.first_below(self.config.threshold))
                .collect(),
        };

        let contour = PitchContour::from_frames(picks.into_iter().enumerate().map(
            |(index, pick)| match pick {
                Some(candidate) => {
                    PitchFrame::voiced(index, candidate.frequency_hz, candidate.confidence())
                }
                None => PitchFrame::unvoiced(index),
            },
        ));
        debug!(
            frames = contour.len(),
            voiced = contour.voiced_count(),
            sample_rate = audio.sample_rate,
            "pitch contour extracted"
        );
        Ok(contour)
    }

    /// Samples covered by frame `t`: centred on `t * hop`, clipped to the buffer.
    fn frame_bounds(&self, t: usize, total: usize) -> Range<usize> {
        let half = self.config.frame_length / 2;
        let centre = t * self.config.hop_length;
        let start = centre.saturating_sub(half).min(total);
        let end = (centre + self.config.frame_length - half).min(total);
        start..end
    }
}
