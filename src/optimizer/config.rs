//! Optimization configuration

use serde::{Deserialize, Serialize};

use crate::error::{CapacityError, Result};

/// Configuration for the Adam weight optimizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdamConfig {
    /// Step size
    pub learning_rate: f64,

    /// Decay of the first-moment estimate
    pub beta1: f64,

    /// Decay of the second-moment estimate
    pub beta2: f64,

    /// Denominator fuzz
    pub epsilon: f64,

    /// Number of gradient steps; there is no early stopping
    pub max_iter: usize,

    /// Starting logits (uniform weights when absent)
    pub initial_logits: Option<Vec<f64>>,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            max_iter: 5000,
            initial_logits: None,
        }
    }
}

impl AdamConfig {
    /// Create a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the learning rate
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Builder method to set the number of steps
    pub fn with_max_iter(mut self, n: usize) -> Self {
        self.max_iter = n;
        self
    }

    /// Builder method to start from the given logits
    pub fn with_initial_logits(mut self, logits: Vec<f64>) -> Self {
        self.initial_logits = Some(logits);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0) || !self.learning_rate.is_finite() {
            return Err(CapacityError::invalid_parameter(
                "learning_rate",
                self.learning_rate,
                "must be a finite positive number",
            ));
        }
        for (name, beta) in [("beta1", self.beta1), ("beta2", self.beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(CapacityError::invalid_parameter(name, beta, "must lie in [0, 1)"));
            }
        }
        if !(self.epsilon > 0.0) {
            return Err(CapacityError::invalid_parameter(
                "epsilon",
                self.epsilon,
                "must be positive",
            ));
        }
        if self.max_iter == 0 {
            return Err(CapacityError::invalid_parameter(
                "max_iter",
                self.max_iter,
                "must be positive",
            ));
        }
        if let Some(logits) = &self.initial_logits {
            if logits.iter().any(|v| !v.is_finite()) {
                return Err(CapacityError::invalid_parameter(
                    "initial_logits",
                    format!("{:?}", logits),
                    "must be finite",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AdamConfig::default();
        assert_eq!(config.max_iter, 5000);
        assert_eq!(config.learning_rate, 1e-3);
        assert!(config.initial_logits.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = AdamConfig::new()
            .with_learning_rate(0.05)
            .with_max_iter(200)
            .with_initial_logits(vec![0.0, 1.0]);

        assert_eq!(config.learning_rate, 0.05);
        assert_eq!(config.max_iter, 200);
        assert_eq!(config.initial_logits, Some(vec![0.0, 1.0]));
    }

    #[test]
    fn test_invalid_values() {
        assert!(AdamConfig::new().with_learning_rate(0.0).validate().is_err());
        assert!(AdamConfig::new().with_max_iter(0).validate().is_err());
        let mut config = AdamConfig::new();
        config.beta2 = 1.0;
        assert!(config.validate().is_err());
        assert!(AdamConfig::new()
            .with_initial_logits(vec![f64::INFINITY])
            .validate()
            .is_err());
    }
}
