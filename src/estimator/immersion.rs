//! Immersion of labelled points into a single Euclidean space
//!
//! Every label gets its own hyperplane, offset along an extra leading axis by
//! `label_index * separation`. Points of different labels are then at least
//! `separation` apart, while same-label distances equal their coordinate-space
//! distances. One k-d tree over the immersed points can therefore answer
//! "k-th neighbor with the same label" queries when bounded by `separation`.

use ndarray::{s, Array2, ArrayView2};
use tracing::debug;

use super::config::SeparationPolicy;
use crate::error::{CapacityError, Result};

/// Diagonal of the axis-aligned bounding box of `coords`.
///
/// Upper bound on any distance between two rows.
pub fn extent(coords: ArrayView2<'_, f64>) -> f64 {
    coords
        .columns()
        .into_iter()
        .map(|col| {
            let (lo, hi) = col
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                });
            if lo.is_finite() && hi.is_finite() {
                (hi - lo).powi(2)
            } else {
                0.0
            }
        })
        .sum::<f64>()
        .sqrt()
}

/// Resolve the separation for data of the given extent
pub fn resolve_separation(policy: SeparationPolicy, extent: f64) -> Result<f64> {
    policy.validate()?;
    let separation = match policy {
        SeparationPolicy::Derived { factor } => {
            let separation = factor * extent.max(1.0);
            if !separation.is_finite() {
                return Err(CapacityError::ValidationError(format!(
                    "data extent {} is too large to separate labels",
                    extent
                )));
            }
            separation
        }
        SeparationPolicy::Fixed(value) => {
            if value <= extent {
                return Err(CapacityError::ValidationError(format!(
                    "separation {} does not exceed the data extent {}; \
                     points of different labels could be mistaken for neighbors",
                    value, extent
                )));
            }
            value
        }
    };
    debug!(extent, separation, "Resolved label separation");
    Ok(separation)
}

/// Build the `(n, 1 + d)` immersed array
pub fn immerse(coords: ArrayView2<'_, f64>, labels: &[usize], separation: f64) -> Array2<f64> {
    let (n, dim) = coords.dim();
    let mut immersed = Array2::zeros((n, dim + 1));
    for (i, &label) in labels.iter().enumerate() {
        immersed[[i, 0]] = label as f64 * separation;
    }
    immersed.slice_mut(s![.., 1..]).assign(&coords);
    immersed
}
