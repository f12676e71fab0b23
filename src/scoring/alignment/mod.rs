pub(crate) mod dtw;
mod window;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ContourRole, Result, ScoringError};
use crate::scoring::NormalizedContour;

use window::Window;

/// Settings for the dynamic time warping stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Sakoe-Chiba band radius in frames; `None` searches the whole table.
    pub band_radius: Option<usize>,
    /// Cost of pairing a voiced frame with an unvoiced one.
    pub unvoiced_mismatch_penalty: f64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            band_radius: None,
            unvoiced_mismatch_penalty: 1.0,
        }
    }
}

/// Cumulative DTW distance and, when requested, the optimal warping path.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentResult {
    pub distance: f64,
    /// 0-based `(reference, user)` pairs from `(0, 0)` to `(N−1, M−1)`.
    pub path: Option<Vec<(usize, usize)>>,
}

/// Minimal-cost monotonic alignment between a reference and a user contour.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentEngine {
    window: Window,
    mismatch_penalty: f64,
}

impl Default for AlignmentEngine {
    fn default() -> Self {
        Self {
            window: Window::Full,
            mismatch_penalty: AlignmentConfig::default().unvoiced_mismatch_penalty,
        }
    }
}

impl AlignmentEngine {
    pub fn new(config: AlignmentConfig) -> Result<Self> {
        if config.band_radius == Some(0) {
            return Err(ScoringError::alignment(
                "band radius must be at least one frame",
            ));
        }
        let penalty = config.unvoiced_mismatch_penalty;
        if !(penalty.is_finite() && penalty >= 0.0) {
            return Err(ScoringError::invalid_config(format!(
                "unvoiced_mismatch_penalty must be a non-negative number, got {penalty}"
            )));
        }
        Ok(Self {
            window: Window::from_radius(config.band_radius),
            mismatch_penalty: penalty,
        })
    }

    /// Pointwise cost between two normalized frames.
    ///
    /// Two voiced frames cost their squared difference; two unvoiced frames agree
    /// and cost nothing; a voiced/unvoiced pair costs the fixed mismatch penalty.
    pub fn cost(&self, reference: Option<f64>, user: Option<f64>) -> f64 {
        match (reference, user) {
            (Some(a), Some(b)) => (a - b) * (a - b),
            (None, None) => 0.0,
            _ => self.mismatch_penalty,
        }
    }

    /// Full-table alignment with path reconstruction.
    pub fn align(
        &self,
        reference: &NormalizedContour,
        user: &NormalizedContour,
    ) -> Result<AlignmentResult> {
        let (a, b) = validate(reference, user)?;
        let table = dtw::fill_table(a.len(), b.len(), self.window, |i, j| {
            self.cost(a[i], b[j])
        });
        let distance = table[[a.len(), b.len()]];
        ensure_finite(distance)?;
        let path = dtw::backtrack(&table)?;
        debug!(
            distance,
            path_len = path.len(),
            reference_frames = a.len(),
            user_frames = b.len(),
            "aligned contours"
        );
        Ok(AlignmentResult {
            distance,
            path: Some(path),
        })
    }

    /// Distance-only alignment using two rolling rows.
    pub fn distance(&self, reference: &NormalizedContour, user: &NormalizedContour) -> Result<f64> {
        let (a, b) = validate(reference, user)?;
        let distance = dtw::rolling_distance(a.len(), b.len(), self.window, |i, j| {
            self.cost(a[i], b[j])
        });
        ensure_finite(distance)?;
        Ok(distance)
    }
}

fn validate<'a>(
    reference: &'a NormalizedContour,
    user: &'a NormalizedContour,
) -> Result<(&'a [Option<f64>], &'a [Option<f64>])> {
    for (contour, role) in [(reference, ContourRole::Reference), (user, ContourRole::User)] {
        if contour.is_empty() {
            return Err(ScoringError::EmptySequence { role });
        }
        if let Some(index) = contour
            .values()
            .iter()
            .position(|value| value.is_some_and(|v| !v.is_finite()))
        {
            return Err(ScoringError::alignment(format!(
                "{role} frame {index} holds a non-finite value"
            )));
        }
    }
    Ok((reference.values(), user.values()))
}

fn ensure_finite(distance: f64) -> Result<()> {
    if distance.is_finite() {
        Ok(())
    } else {
        Err(ScoringError::alignment(
            "no admissible warping path between the contours",
        ))
    }
}
