use crate::error::{ContourRole, Result, ScoringError};

const MAX_SCORE: f64 = 100.0;

/// Maps an alignment distance onto a score in `[0, 100]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoreMapper;

impl ScoreMapper {
    pub fn new() -> Self {
        Self
    }

    /// `clamp(100 × (1 − distance / reference_len), 0, 100)`, unrounded.
    pub fn map(&self, distance: f64, reference_len: usize) -> Result<f64> {
        if reference_len == 0 {
            return Err(ScoringError::EmptySequence {
                role: ContourRole::Reference,
            });
        }
        if distance.is_nan() || distance < 0.0 {
            return Err(ScoringError::alignment(format!(
                "distance must be a non-negative number, got {distance}"
            )));
        }
        let raw = MAX_SCORE * (1.0 - distance / reference_len as f64);
        Ok(raw.clamp(0.0, MAX_SCORE))
    }
}

/// Rounds to two decimals for presentation.
pub fn round2(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::{round2, ScoreMapper};

    #[test]
    fn zero_distance_scores_full_marks() {
        assert_eq!(ScoreMapper::new().map(0.0, 5).unwrap(), 100.0);
    }

    #[test]
    fn distance_at_or_beyond_length_floors_at_zero() {
        let mapper = ScoreMapper::new();
        assert_eq!(mapper.map(5.0, 5).unwrap(), 0.0);
        assert_eq!(mapper.map(42.0, 5).unwrap(), 0.0);
        assert_eq!(mapper.map(f64::INFINITY, 5).unwrap(), 0.0);
    }

    #[test]
    fn score_is_non_increasing_in_distance() {
        let mapper = ScoreMapper::new();
        let scores: Vec<f64> = (0..40)
            .map(|step| mapper.map(step as f64 * 0.25, 8).unwrap())
            .collect();
        assert!(scores.windows(2).all(|pair| pair[1] <= pair[0]));
    }

    #[test]
    fn rejects_negative_distance_and_empty_reference() {
        let mapper = ScoreMapper::new();
        assert!(mapper.map(-0.1, 5).is_err());
        assert!(mapper.map(f64::NAN, 5).is_err());
        assert!(mapper.map(1.0, 0).is_err());
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round2(84.5362), 84.54);
        assert_eq!(round2(100.0), 100.0);
    }
}
