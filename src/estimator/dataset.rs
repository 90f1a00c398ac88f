//! Immutable prepared dataset: label index, immersed points and both k-d trees

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

use super::config::{EstimatorConfig, NeighborCount};
use super::immersion::{extent, immerse, resolve_separation};
use super::kdtree::KdTree;
use super::labels::LabelIndex;
use crate::error::{CapacityError, Result};

static NEXT_DATASET_ID: AtomicU64 = AtomicU64::new(1);

/// A single (label, value) observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation<L> {
    pub label: L,
    pub value: Vec<f64>,
}

impl<L> Observation<L> {
    pub fn new(label: L, value: Vec<f64>) -> Self {
        Self { label, value }
    }
}

impl<L> From<(L, Vec<f64>)> for Observation<L> {
    fn from((label, value): (L, Vec<f64>)) -> Self {
        Self { label, value }
    }
}

/// Check that every observation has the same non-zero, finite dimension.
/// Returns that dimension.
pub fn check_dimensions<L>(samples: &[Observation<L>]) -> Result<usize> {
    let dim = samples.first().map_or(0, |s| s.value.len());
    if dim == 0 {
        return Err(CapacityError::ShapeError {
            expected: "at least one coordinate per observation".to_string(),
            actual: "0".to_string(),
        });
    }
    for (i, sample) in samples.iter().enumerate() {
        if sample.value.len() != dim {
            return Err(CapacityError::ShapeError {
                expected: format!("{} coordinates", dim),
                actual: format!("{} coordinates at observation {}", sample.value.len(), i),
            });
        }
        if sample.value.iter().any(|v| !v.is_finite()) {
            return Err(CapacityError::ValidationError(format!(
                "observation {} has a non-finite coordinate",
                i
            )));
        }
    }
    Ok(dim)
}

/// Everything derived from one loaded sample.
///
/// Built once; a new load produces a new value with a new id, which is how
/// neighborhoods computed for an older dataset are recognised as stale.
#[derive(Debug)]
pub struct PreparedDataset<L> {
    id: u64,
    labels: LabelIndex<L>,
    point_labels: Vec<usize>,
    coords: Array2<f64>,
    separation: f64,
    full_index: KdTree,
    coord_index: KdTree,
}

impl<L> PreparedDataset<L>
where
    L: Clone + Eq + Hash + Debug,
{
    /// Index labels, immerse the points and build both spatial indexes
    pub fn prepare(samples: &[Observation<L>], config: &EstimatorConfig) -> Result<Self> {
        if samples.is_empty() {
            return Err(CapacityError::NoDataLoaded);
        }
        let start = Instant::now();
        let dim = check_dimensions(samples)?;

        let (labels, point_labels) = LabelIndex::build(samples.iter().map(|s| &s.label));
        let flat: Vec<f64> = samples.iter().flat_map(|s| s.value.iter().copied()).collect();
        let coords = Array2::from_shape_vec((samples.len(), dim), flat)?;

        let separation = resolve_separation(config.separation, extent(coords.view()))?;
        let immersed = immerse(coords.view(), &point_labels, separation);

        let full_index = KdTree::new(immersed.view(), config.leaf_size);
        let coord_index = KdTree::new(coords.view(), config.leaf_size);

        let dataset = Self {
            id: NEXT_DATASET_ID.fetch_add(1, Ordering::Relaxed),
            labels,
            point_labels,
            coords,
            separation,
            full_index,
            coord_index,
        };

        info!(
            dataset_id = dataset.id,
            n_points = dataset.len(),
            n_labels = dataset.n_labels(),
            dim,
            leaf_size = config.leaf_size.get(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Prepared dataset"
        );

        Ok(dataset)
    }

    /// Reject a k for which some label has no k-th same-label neighbor
    pub fn check_neighbor_count(&self, k: NeighborCount) -> Result<()> {
        if let Some((index, population)) = self.labels.smallest_population() {
            if k.get() >= population {
                let label = self
                    .labels
                    .label(index)
                    .map(|l| format!("{:?}", l))
                    .unwrap_or_default();
                return Err(CapacityError::NeighborhoodTooLarge {
                    k: k.get(),
                    label,
                    population,
                });
            }
        }
        Ok(())
    }
}

impl<L> PreparedDataset<L> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.point_labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point_labels.is_empty()
    }

    pub fn n_labels(&self) -> usize {
        self.labels.len()
    }

    pub fn dim(&self) -> usize {
        self.coords.ncols()
    }

    pub fn label_index(&self) -> &LabelIndex<L> {
        &self.labels
    }

    /// Label index of every point, in load order
    pub fn point_labels(&self) -> &[usize] {
        &self.point_labels
    }

    pub fn coords(&self) -> &Array2<f64> {
        &self.coords
    }

    pub fn separation(&self) -> f64 {
        self.separation
    }

    pub fn full_index(&self) -> &KdTree {
        &self.full_index
    }

    pub fn coord_index(&self) -> &KdTree {
        &self.coord_index
    }

    pub fn populations(&self) -> Array1<f64> {
        self.labels.populations()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<Observation<&'static str>> {
        vec![
            ("a", vec![0.0, 0.1]).into(),
            ("b", vec![0.9, 1.0]).into(),
            ("a", vec![0.2, 0.1]).into(),
            ("a", vec![0.1, 0.3]).into(),
            ("b", vec![0.8, 0.7]).into(),
        ]
    }

    #[test]
    fn test_prepare_builds_everything() {
        let dataset = PreparedDataset::prepare(&samples(), &EstimatorConfig::default()).unwrap();
        assert_eq!(dataset.len(), 5);
        assert_eq!(dataset.n_labels(), 2);
        assert_eq!(dataset.dim(), 2);
        assert_eq!(dataset.point_labels(), &[0, 1, 0, 0, 1]);
        assert_eq!(dataset.populations().to_vec(), vec![3.0, 2.0]);
        assert_eq!(dataset.full_index().dim(), 3);
        assert_eq!(dataset.coord_index().dim(), 2);
        assert!(dataset.separation() >= 10.0);
    }

    #[test]
    fn test_each_prepare_gets_a_new_id() {
        let config = EstimatorConfig::default();
        let a = PreparedDataset::prepare(&samples(), &config).unwrap();
        let b = PreparedDataset::prepare(&samples(), &config).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_empty_sample_is_no_data() {
        let empty: Vec<Observation<u32>> = Vec::new();
        assert!(matches!(
            PreparedDataset::prepare(&empty, &EstimatorConfig::default()),
            Err(CapacityError::NoDataLoaded)
        ));
    }

    #[test]
    fn test_mismatched_dimensions_rejected() {
        let mut data = samples();
        data.push(("b", vec![0.5]).into());
        assert!(matches!(
            PreparedDataset::prepare(&data, &EstimatorConfig::default()),
            Err(CapacityError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut data = samples();
        data[0].value[1] = f64::NAN;
        assert!(matches!(
            check_dimensions(&data),
            Err(CapacityError::ValidationError(_))
        ));
    }

    #[test]
    fn test_neighbor_count_bounded_by_smallest_label() {
        let dataset = PreparedDataset::prepare(&samples(), &EstimatorConfig::default()).unwrap();
        assert!(dataset.check_neighbor_count(NeighborCount::new(1).unwrap()).is_ok());
        match dataset.check_neighbor_count(NeighborCount::new(2).unwrap()) {
            Err(CapacityError::NeighborhoodTooLarge { k, label, population }) => {
                assert_eq!(k, 2);
                assert_eq!(label, "\"b\"");
                assert_eq!(population, 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
