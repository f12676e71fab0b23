use serde::{Deserialize, Serialize};

use super::yin::{Candidate, FrameAnalysis};

/// Penalties for the frame-to-frame smoothing pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Cost per semitone of pitch movement between consecutive voiced frames.
    pub jump_penalty: f64,
    /// Cost of switching between voiced and unvoiced.
    pub switch_penalty: f64,
    /// Emission cost per octave a candidate sits below the frame's shortest-period candidate.
    pub subharmonic_penalty: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            jump_penalty: 0.01,
            switch_penalty: 0.1,
            subharmonic_penalty: 0.1,
        }
    }
}

const UNVOICED: usize = 0;

/// Minimum-cost state sequence over `{unvoiced} ∪ candidates` per frame.
///
/// State `0` is unvoiced, state `k > 0` is `candidates[k - 1]`. Ties resolve to
/// the lowest state index so the decode is deterministic.
pub(crate) fn decode(
    frames: &[FrameAnalysis],
    threshold: f64,
    config: &SmoothingConfig,
) -> Vec<Option<Candidate>> {
    if frames.is_empty() {
        return Vec::new();
    }

    let mut backpointers: Vec<Vec<usize>> = Vec::with_capacity(frames.len());
    let mut previous = emissions(&frames[0], threshold, config);
    backpointers.push(vec![UNVOICED; previous.len()]);

    for window in frames.windows(2) {
        let (prev_frame, frame) = (&window[0], &window[1]);
        let emission = emissions(frame, threshold, config);
        let mut current = Vec::with_capacity(emission.len());
        let mut pointers = Vec::with_capacity(emission.len());
        for (state, cost) in emission.iter().enumerate() {
            let (best_prev, best_cost) = previous
                .iter()
                .enumerate()
                .map(|(prev_state, &prev_cost)| {
                    let step = transition(prev_frame, prev_state, frame, state, config);
                    (prev_state, prev_cost + step)
                })
                .fold((UNVOICED, f64::INFINITY), |best, candidate| {
                    if candidate.1 < best.1 {
                        candidate
                    } else {
                        best
                    }
                });
            current.push(best_cost + cost);
            pointers.push(best_prev);
        }
        backpointers.push(pointers);
        previous = current;
    }

    let mut state = previous
        .iter()
        .enumerate()
        .fold((UNVOICED, f64::INFINITY), |best, (idx, &cost)| {
            if cost < best.1 {
                (idx, cost)
            } else {
                best
            }
        })
        .0;

    let mut path = vec![UNVOICED; frames.len()];
    for t in (0..frames.len()).rev() {
        path[t] = state;
        state = backpointers[t][state];
    }

    path.into_iter()
        .zip(frames)
        .map(|(state, frame)| candidate_for(frame, state))
        .collect()
}

fn emissions(frame: &FrameAnalysis, threshold: f64, config: &SmoothingConfig) -> Vec<f64> {
    if frame.forced_unvoiced {
        return vec![0.0];
    }
    let shortest = frame.candidates.first().map(|c| c.period);
    let mut costs = Vec::with_capacity(frame.candidates.len() + 1);
    costs.push(threshold);
    costs.extend(frame.candidates.iter().map(|candidate| {
        let octaves_below = shortest
            .map(|base| (candidate.period / base).log2().max(0.0))
            .unwrap_or(0.0);
        candidate.aperiodicity + config.subharmonic_penalty * octaves_below
    }));
    costs
}

fn transition(
    prev_frame: &FrameAnalysis,
    prev_state: usize,
    frame: &FrameAnalysis,
    state: usize,
    config: &SmoothingConfig,
) -> f64 {
    match (
        candidate_for(prev_frame, prev_state),
        candidate_for(frame, state),
    ) {
        (None, None) => 0.0,
        (Some(_), None) | (None, Some(_)) => config.switch_penalty,
        (Some(from), Some(to)) => {
            let semitones = 12.0 * (to.frequency_hz / from.frequency_hz).log2().abs();
            config.jump_penalty * semitones
        }
    }
}

fn candidate_for(frame: &FrameAnalysis, state: usize) -> Option<Candidate> {
    if state == UNVOICED || frame.forced_unvoiced {
        return None;
    }
    frame.candidates.get(state - 1).copied()
}

#[cfg(test)]
mod tests {
    use super::{decode, SmoothingConfig};
    use crate::scoring::features::yin::{Candidate, FrameAnalysis};

    const SR: f64 = 22_050.0;

    fn candidate(hz: f64, aperiodicity: f64) -> Candidate {
        Candidate {
            period: SR / hz,
            frequency_hz: hz,
            aperiodicity,
        }
    }

    fn frame(mut candidates: Vec<Candidate>) -> FrameAnalysis {
        candidates.sort_by(|a, b| a.period.total_cmp(&b.period));
        FrameAnalysis {
            candidates,
            forced_unvoiced: false,
        }
    }

    #[test]
    fn isolated_octave_jump_is_suppressed() {
        let steady = || frame(vec![candidate(220.0, 0.05), candidate(110.0, 0.06)]);
        let glitch = frame(vec![candidate(440.0, 0.10), candidate(220.0, 0.03)]);
        let frames = vec![steady(), steady(), glitch, steady(), steady()];

        let threshold = 0.15;
        assert_eq!(frames[2].first_below(threshold).unwrap().frequency_hz, 440.0);

        let decoded = decode(&frames, threshold, &SmoothingConfig::default());
        let hz: Vec<f64> = decoded
            .iter()
            .map(|c| c.map(|c| c.frequency_hz).unwrap_or(0.0))
            .collect();
        assert_eq!(hz, vec![220.0; 5]);
    }

    #[test]
    fn forced_unvoiced_frames_stay_unvoiced() {
        let frames = vec![
            frame(vec![candidate(220.0, 0.02)]),
            FrameAnalysis::unvoiced(),
            frame(vec![candidate(220.0, 0.02)]),
        ];
        let decoded = decode(&frames, 0.15, &SmoothingConfig::default());
        assert!(decoded[0].is_some());
        assert!(decoded[1].is_none());
        assert!(decoded[2].is_some());
    }

    #[test]
    fn weak_candidates_decode_as_unvoiced() {
        let frames = vec![frame(vec![candidate(300.0, 0.7)]); 4];
        let decoded = decode(&frames, 0.15, &SmoothingConfig::default());
        assert!(decoded.iter().all(Option::is_none));
    }
}
