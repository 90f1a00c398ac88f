//! Weighted Kraskov estimation of mutual information and channel capacity
//!
//! The estimator works on (label, value) samples where the label is discrete
//! and the value a point in R^d. Each label is immersed in its own slice of an
//! extended space, far enough apart that nearest-neighbor searches in the
//! extended space never cross labels. Neighbor counts in the original space
//! then give the Kraskov estimate.
//!
//! Two ways to drive it:
//! - the value pipeline: [`PreparedDataset::prepare`], [`compute_neighborhoods`],
//!   then [`estimate_mi`], [`estimate_weighted_mi`] or [`estimate_capacity`];
//! - the stateful [`WeightedKraskovEstimator`], which caches the pipeline values.

mod capacity;
mod config;
mod dataset;
mod immersion;
mod kdtree;
mod kraskov;
mod labels;
mod mi;
mod neighborhood;
mod weighted;

pub use capacity::{estimate_capacity, natural_weights, optimize_weights, Capacity};
pub use config::{EstimatorConfig, LeafSize, NeighborCount, SeparationPolicy};
pub use dataset::{check_dimensions, Observation, PreparedDataset};
pub use immersion::{extent, immerse, resolve_separation};
pub use kdtree::{euclidean_distance, KdTree};
pub use kraskov::{EstimatorState, WeightedKraskovEstimator};
pub use labels::LabelIndex;
pub use mi::{estimate_mi, mi_from_counts};
pub use neighborhood::{compute_epsilons, compute_neighborhoods, Neighborhoods};
pub use weighted::{
    bits_from_loss, estimate_weighted_mi, weighted_loss, weights_from_map, WeightedLoss,
    MIN_WEIGHT, WEIGHT_SUM_TOLERANCE,
};
