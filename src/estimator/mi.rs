//! Plug-in mutual information estimate
//!
//! MI = [ψ(k) + ψ(n) - mean_i(ψ(n_y(i)) + ψ(n_x(i)))] / ln 2
//!
//! where n_y(i) is the number of neighbors of point i regardless of label and
//! n_x(i) the population of its label.

use ndarray::ArrayView2;
use std::f64::consts::LN_2;

use super::dataset::PreparedDataset;
use super::neighborhood::Neighborhoods;
use crate::error::{CapacityError, Result};
use crate::utils::special::{checked_digamma, digamma};

/// Convert a nats-valued `ψ(k) + ψ(n) - penalty` into bits
#[inline]
pub fn bits_from_penalty(k: usize, n: usize, penalty: f64) -> f64 {
    (digamma(k as f64) + digamma(n as f64) - penalty) / LN_2
}

/// MI in bits from a raw neighbor-count matrix
pub fn mi_from_counts(
    counts: ArrayView2<'_, usize>,
    point_labels: &[usize],
    populations: &[usize],
    k: usize,
) -> Result<f64> {
    let n = counts.nrows();
    if n == 0 {
        return Err(CapacityError::NoDataLoaded);
    }
    if point_labels.len() != n {
        return Err(CapacityError::ShapeError {
            expected: format!("{} point labels", n),
            actual: point_labels.len().to_string(),
        });
    }

    let mut total = 0.0;
    for (row, &label) in counts.rows().into_iter().zip(point_labels) {
        let ny = row.sum() as f64;
        let nx = populations.get(label).copied().unwrap_or(0) as f64;
        total += checked_digamma(ny, "neighbor count")? + checked_digamma(nx, "label population")?;
    }

    Ok(bits_from_penalty(k, n, total / n as f64))
}

/// MI in bits for `dataset` from neighborhoods computed on it
pub fn estimate_mi<L>(dataset: &PreparedDataset<L>, neighborhoods: &Neighborhoods) -> Result<f64> {
    neighborhoods.ensure_fresh(dataset)?;
    let populations: Vec<usize> = (0..dataset.n_labels())
        .map(|j| dataset.label_index().population(j))
        .collect();
    mi_from_counts(
        neighborhoods.counts().view(),
        dataset.point_labels(),
        &populations,
        neighborhoods.k().get(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_perfectly_separated_counts() {
        // two labels, every neighbor shares the label
        let k = 3;
        let counts = array![[3, 0], [3, 0], [3, 0], [3, 0], [0, 3], [0, 3], [0, 3], [0, 3]];
        let labels = [0, 0, 0, 0, 1, 1, 1, 1];
        let mi = mi_from_counts(counts.view(), &labels, &[4, 4], k).unwrap();

        let expected = (digamma(8.0) - digamma(4.0)) / LN_2;
        assert!((mi - expected).abs() < 1e-12);
    }

    #[test]
    fn test_zero_row_is_degenerate() {
        let counts = array![[0, 0], [1, 0]];
        assert!(matches!(
            mi_from_counts(counts.view(), &[0, 0], &[2, 0], 1),
            Err(CapacityError::NumericalDegeneracy(_))
        ));
    }

    #[test]
    fn test_label_length_mismatch() {
        let counts = array![[1, 0], [1, 0]];
        assert!(matches!(
            mi_from_counts(counts.view(), &[0], &[2], 1),
            Err(CapacityError::ShapeError { .. })
        ));
    }
}
