use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoringError};
use crate::scoring::{NormalizedContour, PitchContour};

use super::statistics::voiced_moments;

const DEFAULT_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Added to the standard deviation so constant pitch never divides by zero.
    pub epsilon: f64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
        }
    }
}

/// Z-scores the voiced frames of a contour; unvoiced frames become the `None` sentinel.
#[derive(Debug, Clone, Copy)]
pub struct ContourNormalizer {
    epsilon: f64,
}

impl Default for ContourNormalizer {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl ContourNormalizer {
    pub fn new(config: NormalizerConfig) -> Result<Self> {
        if !(config.epsilon.is_finite() && config.epsilon > 0.0) {
            return Err(ScoringError::invalid_config(format!(
                "normalizer epsilon must be a positive number, got {}",
                config.epsilon
            )));
        }
        Ok(Self {
            epsilon: config.epsilon,
        })
    }

    pub fn normalize(&self, contour: &PitchContour) -> Result<NormalizedContour> {
        let voiced: Vec<f64> = contour
            .frames()
            .iter()
            .filter(|frame| frame.voiced)
            .map(|frame| frame.frequency_hz)
            .collect();
        let moments =
            voiced_moments(&voiced).ok_or(ScoringError::NoVoicedFrames { role: None })?;
        let scale = moments.std_dev + self.epsilon;
        let values = contour
            .frames()
            .iter()
            .map(|frame| {
                frame
                    .voiced
                    .then(|| (frame.frequency_hz - moments.mean) / scale)
            })
            .collect();
        Ok(NormalizedContour::from_values(values))
    }
}
