//! Per-point epsilon radii and neighbor counts by label
//!
//! For neighbor count k, point i gets `eps_i`, the distance to its k-th nearest
//! same-label neighbor (found in the immersed space, bounded by the label
//! separation). Row i of the count matrix tallies, per label, the points within
//! `eps_i` of point i in coordinate space, boundary included and point i itself
//! excluded. With no distance ties a row sums to exactly k; ties on the
//! boundary add points.

use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Instant;
use tracing::debug;

use super::config::NeighborCount;
use super::dataset::PreparedDataset;
use crate::error::{CapacityError, Result};

/// Neighbor data for one dataset and one k
#[derive(Debug, Clone)]
pub struct Neighborhoods {
    dataset_id: u64,
    k: NeighborCount,
    epsilons: Array1<f64>,
    counts: Array2<usize>,
}

impl Neighborhoods {
    pub fn dataset_id(&self) -> u64 {
        self.dataset_id
    }

    pub fn k(&self) -> NeighborCount {
        self.k
    }

    pub fn epsilons(&self) -> &Array1<f64> {
        &self.epsilons
    }

    /// `(n_points, n_labels)` neighbor counts
    pub fn counts(&self) -> &Array2<usize> {
        &self.counts
    }

    pub fn n_points(&self) -> usize {
        self.counts.nrows()
    }

    pub fn n_labels(&self) -> usize {
        self.counts.ncols()
    }

    /// Neighbors of each point regardless of label
    pub fn row_sums(&self) -> Array1<usize> {
        self.counts.sum_axis(Axis(1))
    }

    /// True if these neighborhoods were computed for `dataset`
    pub fn belongs_to<L>(&self, dataset: &PreparedDataset<L>) -> bool {
        self.dataset_id == dataset.id()
    }

    /// Fail with `StaleNeighborhoods` unless computed for `dataset`
    pub fn ensure_fresh<L>(&self, dataset: &PreparedDataset<L>) -> Result<()> {
        if self.belongs_to(dataset) {
            Ok(())
        } else {
            Err(CapacityError::StaleNeighborhoods)
        }
    }
}

fn map_points<T, F>(n: usize, parallel: bool, f: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> Result<T> + Send + Sync,
{
    if parallel {
        (0..n).into_par_iter().map(f).collect()
    } else {
        (0..n).map(f).collect()
    }
}

/// Distance from every point to its k-th nearest same-label neighbor
pub fn compute_epsilons<L>(
    dataset: &PreparedDataset<L>,
    k: NeighborCount,
    parallel: bool,
) -> Result<Array1<f64>>
where
    L: Clone + Eq + Hash + Debug + Sync,
{
    dataset.check_neighbor_count(k)?;
    let tree = dataset.full_index();
    let bound = dataset.separation();

    let epsilons = map_points(dataset.len(), parallel, |i| {
        tree.kth_neighbor_distance(i, k.get(), bound).ok_or_else(|| {
            CapacityError::NumericalDegeneracy(format!(
                "point {} has fewer than {} same-label neighbors closer than the separation {}",
                i, k, bound
            ))
        })
    })?;

    Ok(Array1::from_vec(epsilons))
}

/// Epsilons plus the neighbor-count matrix for `dataset` and `k`
pub fn compute_neighborhoods<L>(
    dataset: &PreparedDataset<L>,
    k: NeighborCount,
    parallel: bool,
) -> Result<Neighborhoods>
where
    L: Clone + Eq + Hash + Debug + Sync,
{
    let start = Instant::now();
    let epsilons = compute_epsilons(dataset, k, parallel)?;

    let n_labels = dataset.n_labels();
    let point_labels = dataset.point_labels();
    let tree = dataset.coord_index();

    let rows = map_points(dataset.len(), parallel, |i| {
        let mut row = vec![0usize; n_labels];
        tree.for_each_within(tree.point(i), epsilons[i], |j| row[point_labels[j]] += 1);

        let own = &mut row[point_labels[i]];
        *own = own.checked_sub(1).ok_or_else(|| {
            CapacityError::NumericalDegeneracy(format!(
                "point {} is missing from its own neighborhood",
                i
            ))
        })?;
        Ok(row)
    })?;

    let flat: Vec<usize> = rows.into_iter().flatten().collect();
    let counts = Array2::from_shape_vec((dataset.len(), n_labels), flat)?;

    debug!(
        dataset_id = dataset.id(),
        k = k.get(),
        n_points = dataset.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Computed neighborhoods"
    );

    Ok(Neighborhoods {
        dataset_id: dataset.id(),
        k,
        epsilons,
        counts,
    })
}
