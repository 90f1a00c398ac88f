//! Weighted loss: the MI estimate under re-weighted label probabilities
//!
//! For weights w over labels, populations c and n points:
//!
//! ```text
//! nx_j  = w_j n
//! s_i   = Σ_j N_ij w_j / c_j
//! ny_i  = c_l(i) s_i / w_l(i)
//! loss  = Σ_j ψ(nx_j) w_j + Σ_i ψ(ny_i) w_l(i) / c_l(i)
//! ```
//!
//! Weighted MI in bits is `(ψ(k) + ψ(n) - loss) / ln 2`, so minimizing the loss
//! maximizes the weighted MI. With `w_j = c_j / n` it reduces to the plain
//! estimate.

use ndarray::{Array1, Array2, ArrayView2};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use super::dataset::PreparedDataset;
use super::labels::LabelIndex;
use super::mi::bits_from_penalty;
use super::neighborhood::Neighborhoods;
use crate::error::{CapacityError, Result};
use crate::optimizer::SimplexObjective;
use crate::utils::special::{checked_digamma, digamma, trigamma};

/// Weights at or below this are treated as zero
pub const MIN_WEIGHT: f64 = 1e-12;

/// Allowed deviation of a caller-supplied weight vector's sum from 1
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// Loss functional over label weights for a fixed neighbor-count matrix
#[derive(Debug, Clone)]
pub struct WeightedLoss {
    counts: Array2<f64>,
    labels: Vec<usize>,
    populations: Array1<f64>,
}

impl WeightedLoss {
    /// Build from a neighbor-count matrix and the label index of every point.
    /// Populations are counted from `labels`.
    pub fn new(counts: ArrayView2<'_, usize>, labels: &[usize]) -> Result<Self> {
        let (n, n_labels) = counts.dim();
        if labels.len() != n {
            return Err(CapacityError::ShapeError {
                expected: format!("{} point labels", n),
                actual: labels.len().to_string(),
            });
        }

        let mut populations = Array1::<f64>::zeros(n_labels);
        for (i, &label) in labels.iter().enumerate() {
            if label >= n_labels {
                return Err(CapacityError::ShapeError {
                    expected: format!("label index below {}", n_labels),
                    actual: format!("{} at point {}", label, i),
                });
            }
            populations[label] += 1.0;
        }
        if let Some(j) = populations.iter().position(|&c| c == 0.0) {
            return Err(CapacityError::NumericalDegeneracy(format!(
                "label {} has no points",
                j
            )));
        }

        Ok(Self {
            counts: counts.mapv(|c| c as f64),
            labels: labels.to_vec(),
            populations,
        })
    }

    pub fn n_points(&self) -> usize {
        self.labels.len()
    }

    pub fn n_labels(&self) -> usize {
        self.populations.len()
    }

    fn check_weights(&self, weights: &Array1<f64>) -> Result<()> {
        if weights.len() != self.n_labels() {
            return Err(CapacityError::ShapeError {
                expected: format!("{} weights", self.n_labels()),
                actual: weights.len().to_string(),
            });
        }
        if let Some(j) = weights.iter().position(|&w| !(w > MIN_WEIGHT) || !w.is_finite()) {
            return Err(CapacityError::NumericalDegeneracy(format!(
                "weight of label {} is numerically zero ({})",
                j, weights[j]
            )));
        }
        Ok(())
    }

    /// Per-point `s_i` and `ny_i`
    fn neighbor_masses(&self, weights: &Array1<f64>) -> (Array1<f64>, Array1<f64>) {
        let ratio = weights / &self.populations;
        let s = self.counts.dot(&ratio);
        let ny = s
            .iter()
            .zip(&self.labels)
            .map(|(&s_i, &l)| self.populations[l] * s_i / weights[l])
            .collect();
        (s, ny)
    }

    /// Loss value alone
    pub fn value(&self, weights: &Array1<f64>) -> Result<f64> {
        self.check_weights(weights)?;
        let n = self.n_points() as f64;
        let (_, ny) = self.neighbor_masses(weights);

        let mut loss = 0.0;
        for &w in weights.iter() {
            loss += checked_digamma(w * n, "weighted label mass")? * w;
        }
        for (&ny_i, &l) in ny.iter().zip(&self.labels) {
            loss += checked_digamma(ny_i, "weighted neighbor mass")? * weights[l]
                / self.populations[l];
        }

        if !loss.is_finite() {
            return Err(CapacityError::NumericalDegeneracy(format!(
                "loss is not finite ({})",
                loss
            )));
        }
        Ok(loss)
    }

    /// Loss and its gradient with respect to the weights
    pub fn value_and_gradient(&self, weights: &Array1<f64>) -> Result<(f64, Array1<f64>)> {
        let loss = self.value(weights)?;
        let n = self.n_points() as f64;
        let (s, ny) = self.neighbor_masses(weights);

        // d/dw_j [ψ(n w_j) w_j]
        let mut grad: Array1<f64> = weights.mapv(|w| {
            let x = n * w;
            digamma(x) + x * trigamma(x)
        });

        // ψ₁(ny_i) N_ij / c_j through s_i
        let tri: Array1<f64> = ny.mapv(trigamma);
        grad = grad + &(self.counts.t().dot(&tri) / &self.populations);

        // own-label terms of ny_i and of the w_l(i) / c_l(i) factor
        for i in 0..self.n_points() {
            let l = self.labels[i];
            grad[l] += digamma(ny[i]) / self.populations[l] - tri[i] * s[i] / weights[l];
        }

        if grad.iter().any(|g| !g.is_finite()) {
            return Err(CapacityError::NumericalDegeneracy(
                "loss gradient is not finite".to_string(),
            ));
        }
        Ok((loss, grad))
    }
}

impl SimplexObjective for WeightedLoss {
    fn dimension(&self) -> usize {
        self.n_labels()
    }

    fn loss_and_gradient(&self, weights: &Array1<f64>) -> Result<(f64, Array1<f64>)> {
        self.value_and_gradient(weights)
    }

    fn loss(&self, weights: &Array1<f64>) -> Result<f64> {
        self.value(weights)
    }
}

/// Loss for the given neighbor counts, point labels and weights
pub fn weighted_loss(
    counts: ArrayView2<'_, usize>,
    labels: &[usize],
    weights: &Array1<f64>,
) -> Result<f64> {
    WeightedLoss::new(counts, labels)?.value(weights)
}

/// Turn a label -> weight dictionary into a vector indexed like `labels`.
///
/// Every loaded label must be present, no other label may be, weights must be
/// finite and non-negative and sum to 1 within [`WEIGHT_SUM_TOLERANCE`].
pub fn weights_from_map<L>(labels: &LabelIndex<L>, weights: &HashMap<L, f64>) -> Result<Array1<f64>>
where
    L: Clone + Eq + Hash + Debug,
{
    if let Some(unknown) = weights.keys().find(|l| labels.index_of(l).is_none()) {
        return Err(CapacityError::UnknownLabel(format!("{:?}", unknown)));
    }

    let mut vector = Array1::<f64>::zeros(labels.len());
    for (j, label) in labels.labels().iter().enumerate() {
        let w = *weights.get(label).ok_or_else(|| {
            CapacityError::ValidationError(format!("missing weight for label {:?}", label))
        })?;
        if !w.is_finite() || w < 0.0 {
            return Err(CapacityError::ValidationError(format!(
                "weight for label {:?} must be finite and non-negative, got {}",
                label, w
            )));
        }
        vector[j] = w;
    }

    let total = vector.sum();
    if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(CapacityError::ValidationError(format!(
            "weights sum to {}, expected 1 within {}",
            total, WEIGHT_SUM_TOLERANCE
        )));
    }
    Ok(vector)
}

/// Weighted MI in bits from a loss value
pub fn bits_from_loss(loss: f64, k: usize, n: usize) -> f64 {
    bits_from_penalty(k, n, loss)
}

/// Weighted MI in bits for `dataset`, given a weight vector indexed like its labels
pub fn estimate_weighted_mi<L>(
    dataset: &PreparedDataset<L>,
    neighborhoods: &Neighborhoods,
    weights: &Array1<f64>,
) -> Result<f64> {
    neighborhoods.ensure_fresh(dataset)?;
    let loss = weighted_loss(neighborhoods.counts().view(), dataset.point_labels(), weights)?;
    Ok(bits_from_loss(loss, neighborhoods.k().get(), dataset.len()))
}
