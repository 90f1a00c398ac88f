//! Channel capacity: the maximum of the weighted MI over input distributions

use ndarray::Array1;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Instant;
use tracing::info;

use super::dataset::PreparedDataset;
use super::neighborhood::Neighborhoods;
use super::weighted::{bits_from_loss, WeightedLoss};
use crate::error::Result;
use crate::optimizer::{OptimizationOutcome, SimplexOptimizer};

/// Capacity estimate and the input distribution achieving it
#[derive(Debug, Clone, Serialize)]
pub struct Capacity<L: Eq + Hash> {
    /// Weighted MI at `weights`, in bits
    pub bits: f64,
    /// Optimal probability of each label
    pub weights: HashMap<L, f64>,
    /// Loss reached by the optimizer
    pub loss: f64,
}

/// Minimize the weighted loss for `dataset` with `optimizer`.
///
/// Weights in the outcome are indexed like the dataset's labels.
pub fn optimize_weights<L>(
    dataset: &PreparedDataset<L>,
    neighborhoods: &Neighborhoods,
    optimizer: &dyn SimplexOptimizer,
) -> Result<OptimizationOutcome> {
    neighborhoods.ensure_fresh(dataset)?;
    let objective = WeightedLoss::new(neighborhoods.counts().view(), dataset.point_labels())?;

    let start = Instant::now();
    let outcome = optimizer.minimize(&objective)?;
    info!(
        dataset_id = dataset.id(),
        n_labels = dataset.n_labels(),
        loss = outcome.loss,
        iterations = outcome.iterations,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Optimized label weights"
    );
    Ok(outcome)
}

/// Capacity in bits plus the label -> weight map reaching it
pub fn estimate_capacity<L>(
    dataset: &PreparedDataset<L>,
    neighborhoods: &Neighborhoods,
    optimizer: &dyn SimplexOptimizer,
) -> Result<Capacity<L>>
where
    L: Clone + Eq + Hash + Debug,
{
    let outcome = optimize_weights(dataset, neighborhoods, optimizer)?;
    Ok(Capacity {
        bits: bits_from_loss(outcome.loss, neighborhoods.k().get(), dataset.len()),
        weights: dataset.label_index().to_map(&outcome.weights),
        loss: outcome.loss,
    })
}

/// Weights proportional to label populations
pub fn natural_weights<L>(dataset: &PreparedDataset<L>) -> Array1<f64> {
    dataset.populations() / dataset.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CapacityError;
    use crate::estimator::config::{EstimatorConfig, NeighborCount};
    use crate::estimator::dataset::Observation;
    use crate::estimator::neighborhood::compute_neighborhoods;
    use crate::estimator::weighted::estimate_weighted_mi;
    use crate::optimizer::{AdamConfig, AdamOptimizer};

    fn clusters() -> Vec<Observation<u8>> {
        // two well separated groups of unequal size
        let mut samples = Vec::new();
        for i in 0..20 {
            samples.push(Observation::new(0, vec![i as f64 * 0.013 + 0.0001 * (i * i) as f64]));
        }
        for i in 0..40 {
            samples.push(Observation::new(1, vec![5.0 + i as f64 * 0.007 + 0.0002 * (i * i) as f64]));
        }
        samples
    }

    #[test]
    fn test_capacity_not_below_natural_estimate() {
        let samples = clusters();
        let dataset = PreparedDataset::prepare(&samples, &EstimatorConfig::default()).unwrap();
        let k = NeighborCount::new(3).unwrap();
        let hoods = compute_neighborhoods(&dataset, k, false).unwrap();

        let natural = estimate_weighted_mi(&dataset, &hoods, &natural_weights(&dataset)).unwrap();
        let optimizer = AdamOptimizer::new(AdamConfig::new().with_learning_rate(0.01).with_max_iter(2000));
        let capacity = estimate_capacity(&dataset, &hoods, &optimizer).unwrap();

        assert!(capacity.bits >= natural - 1e-9);
        assert!((capacity.bits - 1.0).abs() < 0.02);
        assert!((capacity.weights[&0] - 0.5).abs() < 0.02);
        let total: f64 = capacity.weights.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_stale_neighborhoods_rejected() {
        let samples = clusters();
        let config = EstimatorConfig::default();
        let first = PreparedDataset::prepare(&samples, &config).unwrap();
        let second = PreparedDataset::prepare(&samples, &config).unwrap();
        let hoods = compute_neighborhoods(&first, NeighborCount::new(2).unwrap(), false).unwrap();

        assert!(matches!(
            optimize_weights(&second, &hoods, &AdamOptimizer::default()),
            Err(CapacityError::StaleNeighborhoods)
        ));
    }
}
