//! Estimator configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{CapacityError, Result};
use crate::optimizer::AdamConfig;

/// Number of same-label neighbors defining each point's epsilon radius.
///
/// Always positive; invalid values are rejected on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct NeighborCount(usize);

impl NeighborCount {
    pub fn new(k: usize) -> Result<Self> {
        if k == 0 {
            return Err(CapacityError::invalid_parameter("k", k, "must be positive"));
        }
        Ok(Self(k))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl TryFrom<usize> for NeighborCount {
    type Error = CapacityError;

    fn try_from(k: usize) -> Result<Self> {
        Self::new(k)
    }
}

impl From<NeighborCount> for usize {
    fn from(k: NeighborCount) -> usize {
        k.0
    }
}

impl fmt::Display for NeighborCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bucket size of the k-d tree leaves. Affects speed only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct LeafSize(usize);

impl LeafSize {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(CapacityError::invalid_parameter(
                "leaf_size",
                size,
                "must be positive",
            ));
        }
        Ok(Self(size))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for LeafSize {
    fn default() -> Self {
        Self(10)
    }
}

impl TryFrom<usize> for LeafSize {
    type Error = CapacityError;

    fn try_from(size: usize) -> Result<Self> {
        Self::new(size)
    }
}

impl From<LeafSize> for usize {
    fn from(size: LeafSize) -> usize {
        size.0
    }
}

/// How the distance between label hyperplanes is chosen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SeparationPolicy {
    /// `factor * max(extent, 1)`, where extent is the bounding-box diagonal of the data
    Derived { factor: f64 },
    /// Caller-supplied constant; must exceed the data extent
    Fixed(f64),
}

impl Default for SeparationPolicy {
    fn default() -> Self {
        Self::Derived { factor: 10.0 }
    }
}

impl SeparationPolicy {
    pub fn validate(&self) -> Result<()> {
        match *self {
            SeparationPolicy::Derived { factor } if !(factor > 1.0) || !factor.is_finite() => {
                Err(CapacityError::invalid_parameter(
                    "separation.factor",
                    factor,
                    "must be a finite number greater than 1",
                ))
            }
            SeparationPolicy::Fixed(value) if !(value > 0.0) || !value.is_finite() => {
                Err(CapacityError::invalid_parameter(
                    "separation",
                    value,
                    "must be a finite positive number",
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Configuration for the weighted Kraskov estimator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Neighbor count used when the caller does not supply one
    pub neighbors: NeighborCount,

    /// Leaf size of both k-d trees
    pub leaf_size: LeafSize,

    /// Label hyperplane separation
    pub separation: SeparationPolicy,

    /// Run per-point neighbor queries on the rayon pool
    pub parallel: bool,

    /// Weight optimizer settings
    pub optimizer: AdamConfig,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            neighbors: NeighborCount(100),
            leaf_size: LeafSize::default(),
            separation: SeparationPolicy::default(),
            parallel: true,
            optimizer: AdamConfig::default(),
        }
    }
}

impl EstimatorConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the default neighbor count
    pub fn with_k(mut self, k: NeighborCount) -> Self {
        self.neighbors = k;
        self
    }

    /// Builder method to set the k-d tree leaf size
    pub fn with_leaf_size(mut self, leaf_size: LeafSize) -> Self {
        self.leaf_size = leaf_size;
        self
    }

    /// Builder method to set the separation policy
    pub fn with_separation(mut self, separation: SeparationPolicy) -> Self {
        self.separation = separation;
        self
    }

    /// Builder method to toggle parallel neighbor queries
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Builder method to set optimizer settings
    pub fn with_optimizer(mut self, optimizer: AdamConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Check every field that cannot be enforced by its type
    pub fn validate(&self) -> Result<()> {
        self.separation.validate()?;
        self.optimizer.validate()
    }

    /// Load and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
}
