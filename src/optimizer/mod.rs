//! Optimization over the probability simplex
//!
//! Provides:
//! - [`SimplexObjective`]: a differentiable loss of a weight vector
//! - [`SimplexOptimizer`]: a pluggable engine minimizing such a loss
//! - [`AdamOptimizer`]: Adam over softmax logits, the default engine
//!
//! Engines search over unconstrained logits mapped through softmax, so every
//! iterate is a valid probability vector without projection.

mod adam;
mod config;

pub use adam::AdamOptimizer;
pub use config::AdamConfig;

use crate::error::Result;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// A differentiable loss over probability vectors
pub trait SimplexObjective {
    /// Length of the weight vector
    fn dimension(&self) -> usize;

    /// Loss and its gradient with respect to the weights
    fn loss_and_gradient(&self, weights: &Array1<f64>) -> Result<(f64, Array1<f64>)>;

    /// Loss alone
    fn loss(&self, weights: &Array1<f64>) -> Result<f64> {
        self.loss_and_gradient(weights).map(|(loss, _)| loss)
    }
}

/// Minimizes a [`SimplexObjective`], returning the loss and the weights reached
pub trait SimplexOptimizer {
    fn minimize(&self, objective: &dyn SimplexObjective) -> Result<OptimizationOutcome>;
}

/// Result of a simplex optimization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    /// Loss at `weights`
    pub loss: f64,
    /// Final probability vector
    pub weights: Array1<f64>,
    /// Gradient steps taken
    pub iterations: usize,
}

/// Numerically stable softmax
pub fn softmax(logits: &Array1<f64>) -> Array1<f64> {
    let max_val = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exp: Array1<f64> = logits.mapv(|x| (x - max_val).exp());
    let sum: f64 = exp.sum();
    if sum > 0.0 {
        exp / sum
    } else {
        Array1::from_elem(logits.len(), 1.0 / logits.len() as f64)
    }
}

/// Pull a weight-space gradient back through softmax to logit space
pub fn softmax_backward(weights: &Array1<f64>, grad: &Array1<f64>) -> Array1<f64> {
    let inner = weights.dot(grad);
    weights * &(grad - inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_softmax_is_on_simplex() {
        let w = softmax(&array![1.0, 2.0, 3.0]);
        assert!((w.sum() - 1.0).abs() < 1e-12);
        assert!(w.iter().all(|&v| v > 0.0));
        assert!(w[2] > w[1] && w[1] > w[0]);
    }

    #[test]
    fn test_softmax_equal_logits_uniform() {
        let w = softmax(&array![1.0, 1.0, 1.0, 1.0]);
        for v in w.iter() {
            assert!((v - 0.25).abs() < 1e-15);
        }
    }

    #[test]
    fn test_softmax_large_logits_stable() {
        let w = softmax(&array![1000.0, 1000.0]);
        assert!((w[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_softmax_backward_matches_finite_difference() {
        // f(w) = sum_j c_j w_j^2
        let c = array![1.0, -2.0, 0.5];
        let logits = array![0.3, -0.1, 0.7];
        let f = |theta: &Array1<f64>| {
            let w = softmax(theta);
            (&c * &w * &w).sum()
        };

        let w = softmax(&logits);
        let grad_w = &c * &w * 2.0;
        let analytic = softmax_backward(&w, &grad_w);

        let h = 1e-6;
        for j in 0..3 {
            let mut plus = logits.clone();
            let mut minus = logits.clone();
            plus[j] += h;
            minus[j] -= h;
            let numeric = (f(&plus) - f(&minus)) / (2.0 * h);
            assert!((numeric - analytic[j]).abs() < 1e-7);
        }
    }
}
