use ndarray::Array2;

use crate::error::{Result, ScoringError};

use super::window::Window;

/// Predecessor of a filled cell, in tie-break priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Diagonal,
    Vertical,
    Horizontal,
}

/// Minimum of the three predecessors; ties prefer diagonal, then vertical, then horizontal.
pub(crate) fn best_predecessor(diagonal: f64, vertical: f64, horizontal: f64) -> (f64, Step) {
    let mut best = (diagonal, Step::Diagonal);
    if vertical < best.0 {
        best = (vertical, Step::Vertical);
    }
    if horizontal < best.0 {
        best = (horizontal, Step::Horizontal);
    }
    best
}

/// Fills the `(N+1)×(M+1)` cumulative cost table. Row `i` / column `j` refer to
/// reference frame `i−1` / user frame `j−1`; cells outside `window` stay `+∞`.
pub(crate) fn fill_table<F>(n: usize, m: usize, window: Window, cost: F) -> Array2<f64>
where
    F: Fn(usize, usize) -> f64,
{
    let mut table = Array2::from_elem((n + 1, m + 1), f64::INFINITY);
    table[[0, 0]] = 0.0;
    for i in 1..=n {
        for j in window.columns(i, n, m) {
            let (previous, _) = best_predecessor(
                table[[i - 1, j - 1]],
                table[[i - 1, j]],
                table[[i, j - 1]],
            );
            table[[i, j]] = cost(i - 1, j - 1) + previous;
        }
    }
    table
}

/// Same recurrence as [`fill_table`] with two rolling rows; returns `D[N][M]` only.
pub(crate) fn rolling_distance<F>(n: usize, m: usize, window: Window, cost: F) -> f64
where
    F: Fn(usize, usize) -> f64,
{
    let mut previous = vec![f64::INFINITY; m + 1];
    let mut current = vec![f64::INFINITY; m + 1];
    previous[0] = 0.0;
    for i in 1..=n {
        current.fill(f64::INFINITY);
        for j in window.columns(i, n, m) {
            let (best, _) = best_predecessor(previous[j - 1], previous[j], current[j - 1]);
            current[j] = cost(i - 1, j - 1) + best;
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[m]
}

/// Walks the filled table from `(N, M)` back to `(1, 1)` using the fill's tie-break.
/// Returns 0-based `(reference, user)` index pairs in time order.
pub(crate) fn backtrack(table: &Array2<f64>) -> Result<Vec<(usize, usize)>> {
    let (rows, cols) = table.dim();
    let (mut i, mut j) = (rows - 1, cols - 1);
    if !table[[i, j]].is_finite() {
        return Err(ScoringError::alignment(
            "no admissible warping path to backtrack",
        ));
    }
    let mut path = Vec::with_capacity(i + j);
    path.push((i - 1, j - 1));
    while (i, j) != (1, 1) {
        let (best, step) = best_predecessor(
            table[[i - 1, j - 1]],
            table[[i - 1, j]],
            table[[i, j - 1]],
        );
        if !best.is_finite() {
            return Err(ScoringError::alignment(format!(
                "warping path broke off at cell ({i}, {j})"
            )));
        }
        match step {
            Step::Diagonal => {
                i -= 1;
                j -= 1;
            }
            Step::Vertical => i -= 1,
            Step::Horizontal => j -= 1,
        }
        path.push((i - 1, j - 1));
    }
    path.reverse();
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::{backtrack, best_predecessor, fill_table, rolling_distance, Step};
    use crate::scoring::alignment::window::Window;

    fn squared(a: &[f64], b: &[f64]) -> impl Fn(usize, usize) -> f64 {
        let (a, b) = (a.to_vec(), b.to_vec());
        move |i, j| (a[i] - b[j]).powi(2)
    }

    #[test]
    fn ties_prefer_diagonal_then_vertical() {
        assert_eq!(best_predecessor(1.0, 1.0, 1.0).1, Step::Diagonal);
        assert_eq!(best_predecessor(2.0, 1.0, 1.0).1, Step::Vertical);
        assert_eq!(best_predecessor(2.0, 1.0, 0.5).1, Step::Horizontal);
    }

    #[test]
    fn boundary_cells_stay_infinite() {
        let a = [0.0, 1.0];
        let b = [0.0, 1.0, 2.0];
        let table = fill_table(2, 3, Window::Full, squared(&a, &b));
        assert_eq!(table[[0, 0]], 0.0);
        assert!(table[[0, 2]].is_infinite());
        assert!(table[[1, 0]].is_infinite());
    }

    #[test]
    fn rolling_rows_match_full_table() {
        let a = [0.1, -0.4, 1.3, 0.7, -1.2];
        let b = [0.0, 1.1, 0.9, -1.0];
        let table = fill_table(5, 4, Window::Full, squared(&a, &b));
        let rolling = rolling_distance(5, 4, Window::Full, squared(&a, &b));
        assert_eq!(table[[5, 4]], rolling);
    }

    #[test]
    fn backtrack_walks_vertically_when_diagonal_is_closed() {
        let a = [0.0, 0.0, 0.0];
        let b = [0.0, 0.0];
        let table = fill_table(3, 2, Window::Full, squared(&a, &b));
        let path = backtrack(&table).unwrap();
        assert_eq!(path, vec![(0, 0), (1, 0), (2, 1)]);
    }
}
