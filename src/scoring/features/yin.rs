//! Per-frame period candidates from the cumulative mean normalized difference
//! function (YIN, de Cheveigné & Kawahara 2002).
//!
//! For a frame `x` and lag `τ` the difference function is
//! `d(τ) = Σ_{j<W} (x[j] − x[j+τ])²` and its normalized form is
//! `d'(0) = 1`, `d'(τ) = d(τ)·τ / Σ_{k=1..τ} d(k)`. Dips of `d'` mark candidate
//! periods; the depth of a dip (its "aperiodicity") is how far from perfectly
//! periodic the frame is at that lag.

use crate::error::{Result, ScoringError};

use super::TrackerConfig;

const PARABOLA_EPSILON: f64 = 1e-12;

/// Admissible lag window, in samples, for a frequency search range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LagRange {
    pub min: usize,
    pub max: usize,
}

impl LagRange {
    pub fn new(sample_rate: u32, config: &TrackerConfig) -> Result<Self> {
        let sr = sample_rate as f64;
        if config.fmax >= sr / 2.0 {
            return Err(ScoringError::invalid_config(format!(
                "fmax {:.1} Hz must stay below the Nyquist frequency {:.1} Hz",
                config.fmax,
                sr / 2.0
            )));
        }
        let min = ((sr / config.fmax).floor() as usize).max(1);
        let max = (sr / config.fmin).ceil() as usize;
        if config.frame_length < 2 * (max + 1) {
            return Err(ScoringError::invalid_config(format!(
                "frame_length {} is too short for fmin {:.1} Hz at {} Hz (needs at least {})",
                config.frame_length,
                config.fmin,
                sample_rate,
                2 * (max + 1)
            )));
        }
        Ok(Self { min, max })
    }
}

/// A dip of the normalized difference function, refined to sub-sample precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Candidate {
    pub period: f64,
    pub frequency_hz: f64,
    pub aperiodicity: f64,
}

impl Candidate {
    pub fn confidence(&self) -> f64 {
        (1.0 - self.aperiodicity).clamp(0.0, 1.0)
    }
}

/// Everything the decoders need to know about one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct FrameAnalysis {
    /// Sorted by ascending period.
    pub candidates: Vec<Candidate>,
    /// Too quiet or too short to carry a pitch; must decode as unvoiced.
    pub forced_unvoiced: bool,
}

impl FrameAnalysis {
    pub fn unvoiced() -> Self {
        Self {
            candidates: Vec::new(),
            forced_unvoiced: true,
        }
    }

    /// Classic YIN absolute-threshold rule: the shortest period whose dip is deep enough.
    pub fn first_below(&self, threshold: f64) -> Option<Candidate> {
        if self.forced_unvoiced {
            return None;
        }
        self.candidates
            .iter()
            .find(|candidate| candidate.aperiodicity < threshold)
            .copied()
    }
}

pub(crate) fn analyse_frame(
    frame: &[f32],
    sample_rate: u32,
    lags: LagRange,
    config: &TrackerConfig,
) -> FrameAnalysis {
    let span = lags.max + 1;
    if frame.len() < span + lags.max {
        return FrameAnalysis::unvoiced();
    }
    let signal: Vec<f64> = frame.iter().map(|&s| s as f64).collect();
    if rms(&signal) < config.min_rms {
        return FrameAnalysis::unvoiced();
    }

    let window = signal.len() - span;
    let diff = difference(&signal, window, span);
    let cmndf = cumulative_mean_normalized(&diff);
    let candidates = collect_candidates(&cmndf, sample_rate, lags, config);
    FrameAnalysis {
        candidates,
        forced_unvoiced: false,
    }
}

fn rms(signal: &[f64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|s| s * s).sum::<f64>() / signal.len() as f64).sqrt()
}

/// `d(τ)` for `τ ∈ [0, max_lag]` over an integration window of `window` samples.
fn difference(signal: &[f64], window: usize, max_lag: usize) -> Vec<f64> {
    let mut diff = vec![0.0; max_lag + 1];
    for (tau, slot) in diff.iter_mut().enumerate().skip(1) {
        let lagged = &signal[tau..tau + window];
        *slot = signal[..window]
            .iter()
            .zip(lagged)
            .map(|(a, b)| {
                let delta = a - b;
                delta * delta
            })
            .sum();
    }
    diff
}

fn cumulative_mean_normalized(diff: &[f64]) -> Vec<f64> {
    let mut cmndf = vec![1.0; diff.len()];
    let mut running_sum = 0.0;
    for tau in 1..diff.len() {
        running_sum += diff[tau];
        cmndf[tau] = if running_sum > 0.0 {
            diff[tau] * tau as f64 / running_sum
        } else {
            1.0
        };
    }
    cmndf
}

fn collect_candidates(
    cmndf: &[f64],
    sample_rate: u32,
    lags: LagRange,
    config: &TrackerConfig,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = (lags.min..=lags.max)
        .filter(|&tau| cmndf[tau] < cmndf[tau - 1] && cmndf[tau] <= cmndf[tau + 1])
        .filter_map(|tau| {
            let (offset, depth) = parabolic_minimum(cmndf[tau - 1], cmndf[tau], cmndf[tau + 1]);
            let period = tau as f64 + offset;
            let frequency_hz = sample_rate as f64 / period;
            (config.fmin..=config.fmax)
                .contains(&frequency_hz)
                .then_some(Candidate {
                    period,
                    frequency_hz,
                    aperiodicity: depth.max(0.0),
                })
        })
        .collect();

    if candidates.len() > config.max_candidates {
        candidates.sort_by(|a, b| a.aperiodicity.total_cmp(&b.aperiodicity));
        candidates.truncate(config.max_candidates);
    }
    candidates.sort_by(|a, b| a.period.total_cmp(&b.period));
    candidates
}

/// Vertex of the parabola through three equally spaced points: `(offset, value)`.
fn parabolic_minimum(left: f64, centre: f64, right: f64) -> (f64, f64) {
    let denom = left - 2.0 * centre + right;
    if denom.abs() <= PARABOLA_EPSILON {
        return (0.0, centre);
    }
    let offset = (0.5 * (left - right) / denom).clamp(-0.5, 0.5);
    let value = centre - 0.25 * (left - right) * offset;
    (offset, value)
}
