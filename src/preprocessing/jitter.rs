//! Duplicate detection and perturbation
//!
//! The estimator assumes no two points coincide. Samples with repeated values
//! are perturbed with shrinking uniform noise until every point is distinct.

use rand::Rng;
use std::collections::HashSet;
use tracing::warn;

use crate::error::{CapacityError, Result};
use crate::estimator::Observation;

fn point_key(value: &[f64]) -> Vec<u64> {
    // +0.0 folds -0.0 into 0.0
    value.iter().map(|&v| (v + 0.0).to_bits()).collect()
}

/// True if no two coordinate vectors are identical
pub fn all_unique<'a, I>(points: I) -> bool
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut seen = HashSet::new();
    points.into_iter().all(|p| seen.insert(point_key(p)))
}

fn samples_unique<L>(samples: &[Observation<L>]) -> bool {
    all_unique(samples.iter().map(|s| s.value.as_slice()))
}

/// Perturb every coordinate with `eps * U[0, 1)` noise if the sample has
/// duplicate points, halving `eps` and perturbing again until all are distinct.
///
/// `eps` starts at half the smallest positive coordinate magnitude. Returns the
/// last `eps` used, or `None` when the sample was already duplicate free.
pub fn add_noise_if_duplicates<L, R>(samples: &mut [Observation<L>], rng: &mut R) -> Result<Option<f64>>
where
    R: Rng + ?Sized,
{
    if samples_unique(samples) {
        return Ok(None);
    }

    let smallest = samples
        .iter()
        .flat_map(|s| s.value.iter())
        .map(|v| v.abs())
        .filter(|&v| v > 0.0 && v.is_finite())
        .fold(f64::INFINITY, f64::min);
    if !smallest.is_finite() {
        return Err(CapacityError::PreprocessingError(
            "cannot add noise: sample has no non-zero coordinate".to_string(),
        ));
    }

    let mut eps = smallest / 2.0;
    perturb(samples, eps, rng);
    while !samples_unique(samples) {
        eps /= 2.0;
        if eps == 0.0 {
            return Err(CapacityError::PreprocessingError(
                "cannot add noise: perturbation vanished before points became distinct".to_string(),
            ));
        }
        perturb(samples, eps, rng);
    }

    warn!(eps, n_points = samples.len(), "Sample contained duplicate points, perturbed them apart");
    Ok(Some(eps))
}

fn perturb<L, R: Rng + ?Sized>(samples: &mut [Observation<L>], eps: f64, rng: &mut R) {
    for sample in samples.iter_mut() {
        for v in sample.value.iter_mut() {
            *v += eps * rng.gen::<f64>();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn test_all_unique() {
        let a = [0.0, 1.0];
        let b = [0.0, 1.5];
        let c = [-0.0, 1.0];
        assert!(all_unique([&a[..], &b[..]]));
        assert!(!all_unique([&a[..], &b[..], &c[..]]));
        assert!(all_unique(Vec::<&[f64]>::new()));
    }

    #[test]
    fn test_unique_sample_untouched() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let mut samples = vec![Observation::new('a', vec![0.1]), Observation::new('b', vec![0.2])];
        let original = samples.clone();
        assert_eq!(add_noise_if_duplicates(&mut samples, &mut rng).unwrap(), None);
        assert_eq!(samples, original);
    }

    #[test]
    fn test_duplicates_are_separated() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let mut samples: Vec<Observation<u8>> =
            (0..50).map(|i| Observation::new((i % 2) as u8, vec![0.25, 0.5])).collect();

        let eps = add_noise_if_duplicates(&mut samples, &mut rng).unwrap().unwrap();
        assert!(eps > 0.0 && eps <= 0.125);
        assert!(samples_unique(&samples));
        for s in &samples {
            assert!(s.value[0] >= 0.25 && s.value[0] < 0.5);
        }
    }

    #[test]
    fn test_all_zero_sample_fails() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let mut samples = vec![Observation::new(0, vec![0.0]), Observation::new(1, vec![0.0])];
        assert!(matches!(
            add_noise_if_duplicates(&mut samples, &mut rng),
            Err(CapacityError::PreprocessingError(_))
        ));
    }
}
