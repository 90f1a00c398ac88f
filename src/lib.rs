//! Channel capacity estimation
//!
//! Estimates the mutual information between a discrete input label and a
//! continuous, possibly multidimensional output with the weighted Kraskov
//! nearest-neighbor estimator, and the channel capacity: the maximum of that
//! information over all input distributions.
//!
//! # Modules
//!
//! - [`estimator`] - Label immersion, k-d tree neighborhoods, MI and capacity
//! - [`optimizer`] - Simplex optimization (Adam over softmax logits)
//! - [`preprocessing`] - Normalization and duplicate jitter
//! - [`synthetic`] - Gaussian noisy channel sample generation
//! - [`utils`] - Special functions and sample file loading
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use channel_capacity::prelude::*;
//!
//! let samples = NoisyChannel::new(1e-4)
//!     .with_input("teddy", 500, vec![0.0])
//!     .with_input("bunny", 1000, vec![1.0])
//!     .with_seed(7)
//!     .transmit()?;
//!
//! let mut estimator = WeightedKraskovEstimator::new();
//! estimator.load(&samples)?;
//! let mi = estimator.calculate_mi(10)?;
//! let (capacity, weights) = estimator.calculate_maximized_mi(10)?;
//! println!("MI {:.3} bits, capacity {:.3} bits at {:?}", mi, capacity, weights);
//! # Ok::<(), channel_capacity::CapacityError>(())
//! ```

pub mod error;

pub mod estimator;
pub mod optimizer;

pub mod preprocessing;
pub mod synthetic;
pub mod utils;

pub mod cli;

pub use error::{CapacityError, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{CapacityError, Result};
    pub use crate::estimator::{
        compute_neighborhoods, estimate_capacity, estimate_mi, estimate_weighted_mi, Capacity,
        EstimatorConfig, EstimatorState, LeafSize, NeighborCount, Neighborhoods, Observation,
        PreparedDataset, SeparationPolicy, WeightedKraskovEstimator,
    };
    pub use crate::optimizer::{AdamConfig, AdamOptimizer, SimplexObjective, SimplexOptimizer};
    pub use crate::preprocessing::{normalize, PreprocessingConfig, Preprocessor, ScalerType};
    pub use crate::synthetic::NoisyChannel;
}
