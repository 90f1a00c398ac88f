//! Adam over softmax logits

use ndarray::Array1;
use tracing::{debug, trace};

use super::{
    softmax, softmax_backward, AdamConfig, OptimizationOutcome, SimplexObjective,
    SimplexOptimizer,
};
use crate::error::{CapacityError, Result};

/// Adam gradient descent on logits, weights obtained through softmax.
///
/// Runs exactly `max_iter` steps. Convergence is not checked; re-run from other
/// `initial_logits` or with more steps to gain confidence in the optimum.
#[derive(Debug, Clone, Default)]
pub struct AdamOptimizer {
    config: AdamConfig,
}

impl AdamOptimizer {
    pub fn new(config: AdamConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdamConfig {
        &self.config
    }

    fn initial_logits(&self, dimension: usize) -> Result<Array1<f64>> {
        match &self.config.initial_logits {
            Some(logits) if logits.len() != dimension => Err(CapacityError::ShapeError {
                expected: format!("{} initial logits", dimension),
                actual: logits.len().to_string(),
            }),
            Some(logits) => Ok(Array1::from_vec(logits.clone())),
            None => Ok(Array1::ones(dimension)),
        }
    }
}

impl SimplexOptimizer for AdamOptimizer {
    fn minimize(&self, objective: &dyn SimplexObjective) -> Result<OptimizationOutcome> {
        self.config.validate()?;
        let dimension = objective.dimension();
        if dimension == 0 {
            return Err(CapacityError::ValidationError(
                "cannot optimize over an empty simplex".to_string(),
            ));
        }

        let learning_rate = self.config.learning_rate;
        let (beta1, beta2) = (self.config.beta1, self.config.beta2);
        let epsilon = self.config.epsilon;
        let max_iter = self.config.max_iter;

        let mut logits = self.initial_logits(dimension)?;
        let mut m = Array1::<f64>::zeros(dimension);
        let mut v = Array1::<f64>::zeros(dimension);

        for step in 1..=max_iter {
            let weights = softmax(&logits);
            let (loss, grad_w) = objective.loss_and_gradient(&weights)?;
            let grad = softmax_backward(&weights, &grad_w);

            m = &m * beta1 + &grad * (1.0 - beta1);
            v = &v * beta2 + &grad.mapv(|g| g * g) * (1.0 - beta2);

            let m_hat = &m / (1.0 - beta1.powi(step as i32));
            let v_hat = &v / (1.0 - beta2.powi(step as i32));
            logits = logits - &(m_hat / v_hat.mapv(|x| x.sqrt() + epsilon)) * learning_rate;

            if step % 250 == 0 {
                trace!(step, loss, weights = ?weights.to_vec(), "Adam progress");
            }
        }

        let weights = softmax(&logits);
        let loss = objective.loss(&weights)?;
        debug!(loss, iterations = max_iter, weights = ?weights.to_vec(), "Adam finished");

        Ok(OptimizationOutcome {
            loss,
            weights,
            iterations: max_iter,
        })
    }
}
