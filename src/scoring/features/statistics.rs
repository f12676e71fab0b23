/// Population moments of the voiced part of a contour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct VoicedMoments {
    pub mean: f64,
    pub std_dev: f64,
}

/// Two-pass mean and population standard deviation; `None` when `values` is empty.
pub(crate) fn voiced_moments(values: &[f64]) -> Option<VoicedMoments> {
    if values.is_empty() {
        return None;
    }
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    Some(VoicedMoments {
        mean,
        std_dev: variance.sqrt(),
    })
}
