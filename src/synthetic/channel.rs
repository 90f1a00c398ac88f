//! Gaussian noisy channel
//!
//! Each input label is sent a fixed number of times; every transmission comes
//! out as the label's target vector plus independent Gaussian noise.

use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::error::{CapacityError, Result};
use crate::estimator::Observation;

/// One input symbol of a [`NoisyChannel`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInput<L> {
    pub label: L,
    /// Number of transmissions
    pub count: usize,
    /// Noise-free output
    pub target: Vec<f64>,
}

/// Generator of (label, output) samples from a Gaussian channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoisyChannel<L> {
    inputs: Vec<ChannelInput<L>>,
    /// Noise standard deviation
    sigma: f64,
    /// Random seed
    seed: Option<u64>,
}

impl<L: Clone + Debug> NoisyChannel<L> {
    pub fn new(sigma: f64) -> Self {
        Self {
            inputs: Vec::new(),
            sigma,
            seed: None,
        }
    }

    /// Add an input sent `count` times with noise-free output `target`
    pub fn with_input(mut self, label: L, count: usize, target: Vec<f64>) -> Self {
        self.inputs.push(ChannelInput { label, count, target });
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn inputs(&self) -> &[ChannelInput<L>] {
        &self.inputs
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Total number of samples produced by [`transmit`](Self::transmit)
    pub fn len(&self) -> usize {
        self.inputs.iter().map(|i| i.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validate(&self) -> Result<()> {
        if !(self.sigma >= 0.0) || !self.sigma.is_finite() {
            return Err(CapacityError::invalid_parameter(
                "sigma",
                self.sigma,
                "must be a finite non-negative number",
            ));
        }
        let dim = self.inputs.first().map_or(0, |i| i.target.len());
        for input in &self.inputs {
            if input.target.len() != dim || dim == 0 {
                return Err(CapacityError::ShapeError {
                    expected: format!("non-empty targets of dimension {}", dim.max(1)),
                    actual: format!("{} for input {:?}", input.target.len(), input.label),
                });
            }
        }
        Ok(())
    }

    /// Generate samples, inputs in insertion order
    pub fn transmit(&self) -> Result<Vec<Observation<L>>> {
        self.validate()?;
        let mut rng = match self.seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };
        let noise = Normal::new(0.0, self.sigma)
            .map_err(|e| CapacityError::invalid_parameter("sigma", self.sigma, e.to_string()))?;

        let mut samples = Vec::with_capacity(self.len());
        for input in &self.inputs {
            for _ in 0..input.count {
                let value = input.target.iter().map(|&t| t + noise.sample(&mut rng)).collect();
                samples.push(Observation::new(input.label.clone(), value));
            }
        }
        Ok(samples)
    }
}
