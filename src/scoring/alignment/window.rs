use std::ops::RangeInclusive;

/// Admissible region of the cumulative cost table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Window {
    Full,
    /// Sakoe-Chiba band: cell `(i, j)` is admissible iff `|i·M − j·N| ≤ radius·max(N, M)`.
    Band { radius: usize },
}

impl Window {
    pub fn from_radius(radius: Option<usize>) -> Self {
        match radius {
            Some(radius) => Window::Band { radius },
            None => Window::Full,
        }
    }

    /// 1-based columns of row `i` (also 1-based) that may be filled. May be empty.
    pub fn columns(&self, i: usize, n: usize, m: usize) -> RangeInclusive<usize> {
        match *self {
            Window::Full => 1..=m,
            Window::Band { radius } => {
                let tolerance = radius as u128 * n.max(m) as u128;
                let (i, n, m) = (i as u128, n as u128, m as u128);
                let scaled = i * m;
                let low = if scaled <= tolerance {
                    1
                } else {
                    (scaled - tolerance).div_ceil(n).max(1)
                };
                let high = ((scaled + tolerance) / n).min(m);
                low as usize..=high as usize
            }
        }
    }
}
