//! Stateful estimator facade
//!
//! Thin cache over the value pipeline: holds the last prepared dataset and the
//! neighborhoods last computed for it, and recomputes only when the dataset or
//! k changes.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::{debug, info};

use super::capacity::{estimate_capacity, optimize_weights, Capacity};
use super::config::{EstimatorConfig, NeighborCount};
use super::dataset::{Observation, PreparedDataset};
use super::mi::estimate_mi;
use super::neighborhood::{compute_neighborhoods, Neighborhoods};
use super::weighted::{estimate_weighted_mi, weights_from_map};
use crate::error::{CapacityError, Result};
use crate::optimizer::{AdamOptimizer, SimplexOptimizer};

/// What the estimator currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimatorState {
    /// Nothing loaded, or the last load was empty
    Empty,
    /// A dataset is loaded but has no neighborhoods yet
    Stale,
    /// Neighborhoods for the loaded dataset and this k are cached
    Fresh { k: NeighborCount },
}

/// Weighted Kraskov estimator of mutual information and channel capacity
/// between a discrete label and a continuous value.
///
/// ```no_run
/// use channel_capacity::estimator::{Observation, WeightedKraskovEstimator};
///
/// let samples = vec![
///     Observation::new("on", vec![0.91]),
///     Observation::new("on", vec![0.87]),
///     Observation::new("off", vec![0.12]),
///     Observation::new("off", vec![0.05]),
/// ];
/// let mut estimator = WeightedKraskovEstimator::new();
/// estimator.load(&samples).unwrap();
/// let (bits, weights) = estimator.calculate_maximized_mi(1).unwrap();
/// println!("capacity {:.3} bits at {:?}", bits, weights);
/// ```
pub struct WeightedKraskovEstimator<L> {
    config: EstimatorConfig,
    optimizer: Box<dyn SimplexOptimizer + Send + Sync>,
    dataset: Option<PreparedDataset<L>>,
    neighborhoods: Option<Neighborhoods>,
}

impl<L> Default for WeightedKraskovEstimator<L>
where
    L: Clone + Eq + Hash + Debug + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<L> WeightedKraskovEstimator<L>
where
    L: Clone + Eq + Hash + Debug + Send + Sync,
{
    /// Estimator with the default configuration
    pub fn new() -> Self {
        let config = EstimatorConfig::default();
        Self {
            optimizer: Box::new(AdamOptimizer::new(config.optimizer.clone())),
            config,
            dataset: None,
            neighborhoods: None,
        }
    }

    /// Estimator with a validated custom configuration
    pub fn with_config(config: EstimatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            optimizer: Box::new(AdamOptimizer::new(config.optimizer.clone())),
            config,
            dataset: None,
            neighborhoods: None,
        })
    }

    /// Replace the weight optimizer
    pub fn with_optimizer(mut self, optimizer: impl SimplexOptimizer + Send + Sync + 'static) -> Self {
        self.optimizer = Box::new(optimizer);
        self
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Default neighbor count from the configuration
    pub fn k(&self) -> usize {
        self.config.neighbors.get()
    }

    pub fn state(&self) -> EstimatorState {
        match (&self.dataset, &self.neighborhoods) {
            (None, _) => EstimatorState::Empty,
            (Some(dataset), Some(hoods)) if hoods.belongs_to(dataset) => {
                EstimatorState::Fresh { k: hoods.k() }
            }
            (Some(_), _) => EstimatorState::Stale,
        }
    }

    /// Loaded dataset, if any
    pub fn dataset(&self) -> Option<&PreparedDataset<L>> {
        self.dataset.as_ref()
    }

    /// Cached neighborhoods, if fresh
    pub fn neighborhoods(&self) -> Option<&Neighborhoods> {
        match (&self.dataset, &self.neighborhoods) {
            (Some(dataset), Some(hoods)) if hoods.belongs_to(dataset) => Some(hoods),
            _ => None,
        }
    }

    /// Replace the loaded sample. Always drops cached neighborhoods; an empty
    /// sample leaves the estimator empty.
    pub fn load(&mut self, samples: &[Observation<L>]) -> Result<()> {
        self.neighborhoods = None;
        self.dataset = None;
        if samples.is_empty() {
            info!("Loaded empty sample");
            return Ok(());
        }
        self.dataset = Some(PreparedDataset::prepare(samples, &self.config)?);
        Ok(())
    }

    fn loaded(&self) -> Result<&PreparedDataset<L>> {
        self.dataset.as_ref().ok_or(CapacityError::NoDataLoaded)
    }

    /// Compute neighborhoods for `k`, or reuse them if already computed for the
    /// loaded dataset and the same `k`.
    pub fn calculate_neighborhoods(&mut self, k: usize) -> Result<&Neighborhoods> {
        let k = NeighborCount::new(k)?;
        let dataset = self.dataset.as_ref().ok_or(CapacityError::NoDataLoaded)?;

        let cached = matches!(
            &self.neighborhoods,
            Some(hoods) if hoods.belongs_to(dataset) && hoods.k() == k
        );
        if cached {
            debug!(dataset_id = dataset.id(), k = k.get(), "Reusing cached neighborhoods");
        } else {
            self.neighborhoods = Some(compute_neighborhoods(dataset, k, self.config.parallel)?);
        }
        self.neighborhoods.as_ref().ok_or(CapacityError::StaleNeighborhoods)
    }

    /// MI between label and value, in bits
    pub fn calculate_mi(&mut self, k: usize) -> Result<f64> {
        self.calculate_neighborhoods(k)?;
        let (dataset, hoods) = self.fresh()?;
        let bits = estimate_mi(dataset, hoods)?;
        info!(k, n_points = dataset.len(), bits, "Estimated mutual information");
        Ok(bits)
    }

    /// MI in bits with the label distribution re-weighted to `weights`
    pub fn calculate_weighted_mi(&mut self, weights: &HashMap<L, f64>, k: usize) -> Result<f64> {
        let vector = weights_from_map(self.loaded()?.label_index(), weights)?;
        self.calculate_neighborhoods(k)?;
        let (dataset, hoods) = self.fresh()?;
        let bits = estimate_weighted_mi(dataset, hoods, &vector)?;
        info!(k, n_points = dataset.len(), bits, "Estimated weighted mutual information");
        Ok(bits)
    }

    /// Minimize the weighted loss over the cached neighborhoods.
    /// Returns the loss and the label -> weight map reaching it.
    pub fn optimize_weights(&self) -> Result<(f64, HashMap<L, f64>)> {
        let (dataset, hoods) = self.fresh()?;
        let outcome = optimize_weights(dataset, hoods, self.optimizer.as_ref())?;
        Ok((outcome.loss, dataset.label_index().to_map(&outcome.weights)))
    }

    /// Channel capacity estimate in bits and the input distribution reaching it
    pub fn calculate_maximized_mi(&mut self, k: usize) -> Result<(f64, HashMap<L, f64>)> {
        let capacity = self.calculate_capacity(k)?;
        Ok((capacity.bits, capacity.weights))
    }

    /// Like [`calculate_maximized_mi`](Self::calculate_maximized_mi), keeping the loss
    pub fn calculate_capacity(&mut self, k: usize) -> Result<Capacity<L>> {
        self.calculate_neighborhoods(k)?;
        let (dataset, hoods) = self.fresh()?;
        let capacity = estimate_capacity(dataset, hoods, self.optimizer.as_ref())?;
        info!(k, n_points = dataset.len(), bits = capacity.bits, "Estimated channel capacity");
        Ok(capacity)
    }

    fn fresh(&self) -> Result<(&PreparedDataset<L>, &Neighborhoods)> {
        let dataset = self.loaded()?;
        let hoods = self
            .neighborhoods
            .as_ref()
            .ok_or(CapacityError::StaleNeighborhoods)?;
        hoods.ensure_fresh(dataset)?;
        Ok((dataset, hoods))
    }
}
