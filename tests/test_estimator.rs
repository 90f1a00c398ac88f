//! Integration test: MI and weighted MI on channels with known information

use channel_capacity::estimator::{
    compute_neighborhoods, estimate_mi, EstimatorConfig, NeighborCount, Observation,
    PreparedDataset, WeightedKraskovEstimator,
};
use channel_capacity::synthetic::NoisyChannel;
use channel_capacity::CapacityError;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::HashMap;

fn entropy_bits(p: &[f64]) -> f64 {
    -p.iter().filter(|&&x| x > 0.0).map(|&x| x * x.log2()).sum::<f64>()
}

fn two_peaks(a: usize, b: usize, seed: u64) -> Vec<Observation<String>> {
    NoisyChannel::new(1e-4)
        .with_input("A".to_string(), a, vec![0.0])
        .with_input("B".to_string(), b, vec![1.0])
        .with_seed(seed)
        .transmit()
        .unwrap()
}

fn estimator_for(samples: &[Observation<String>]) -> WeightedKraskovEstimator<String> {
    let mut estimator = WeightedKraskovEstimator::new();
    estimator.load(samples).unwrap();
    estimator
}

#[test]
fn test_disjoint_groups_give_one_bit() {
    let mut estimator = estimator_for(&two_peaks(1000, 1000, 1));
    let mi = estimator.calculate_mi(10).unwrap();
    assert!((mi - 1.0).abs() < 0.01, "mi = {}", mi);
}

#[test]
fn test_identical_distributions_give_zero() {
    let samples = NoisyChannel::new(1e-4)
        .with_input("A".to_string(), 2000, vec![0.0])
        .with_input("B".to_string(), 2000, vec![0.0])
        .with_seed(2)
        .transmit()
        .unwrap();
    let mi = estimator_for(&samples).calculate_mi(15).unwrap();
    assert!(mi.abs() < 0.05, "mi = {}", mi);
}

#[test]
fn test_merged_groups() {
    let samples = NoisyChannel::new(1e-4)
        .with_input("A".to_string(), 1000, vec![0.0])
        .with_input("B".to_string(), 1000, vec![0.0])
        .with_input("C".to_string(), 1000, vec![1.0])
        .with_seed(3)
        .transmit()
        .unwrap();
    let mi = estimator_for(&samples).calculate_mi(15).unwrap();
    let exact = entropy_bits(&[2.0 / 3.0, 1.0 / 3.0]);
    assert!((mi - exact).abs() < 0.05, "mi = {}, exact = {}", mi, exact);
}

#[test]
fn test_two_dimensional_outputs() {
    let samples = NoisyChannel::new(1e-3)
        .with_input("left".to_string(), 600, vec![0.0, 0.0])
        .with_input("right".to_string(), 600, vec![1.0, 0.0])
        .with_input("up".to_string(), 600, vec![0.0, 1.0])
        .with_input("diag".to_string(), 600, vec![1.0, 1.0])
        .with_seed(4)
        .transmit()
        .unwrap();
    let mi = estimator_for(&samples).calculate_mi(10).unwrap();
    assert!((mi - 2.0).abs() < 0.02, "mi = {}", mi);
}

#[test]
fn test_permutation_invariance() {
    let samples = NoisyChannel::new(0.3)
        .with_input("A".to_string(), 300, vec![0.0])
        .with_input("B".to_string(), 400, vec![0.5])
        .with_seed(5)
        .transmit()
        .unwrap();
    let mut shuffled = samples.clone();
    shuffled.shuffle(&mut Xoshiro256PlusPlus::seed_from_u64(6));

    let original = estimator_for(&samples).calculate_mi(8).unwrap();
    let permuted = estimator_for(&shuffled).calculate_mi(8).unwrap();
    assert!((original - permuted).abs() < 1e-9);
}

#[test]
fn test_relabel_invariance() {
    let samples = NoisyChannel::new(0.3)
        .with_input("A".to_string(), 300, vec![0.0])
        .with_input("B".to_string(), 400, vec![0.5])
        .with_seed(7)
        .transmit()
        .unwrap();
    let relabeled: Vec<Observation<u32>> = samples
        .iter()
        .map(|s| Observation::new(if s.label == "A" { 42 } else { 7 }, s.value.clone()))
        .collect();

    let original = estimator_for(&samples).calculate_mi(8).unwrap();
    let mut estimator = WeightedKraskovEstimator::new();
    estimator.load(&relabeled).unwrap();
    let renamed = estimator.calculate_mi(8).unwrap();
    assert!((original - renamed).abs() < 1e-9);
}

#[test]
fn test_wide_dynamic_range_without_normalization() {
    let samples = NoisyChannel::new(1e5)
        .with_input("low".to_string(), 800, vec![0.0])
        .with_input("high".to_string(), 800, vec![1e9])
        .with_seed(8)
        .transmit()
        .unwrap();
    let mi = estimator_for(&samples).calculate_mi(10).unwrap();
    assert!((mi - 1.0).abs() < 0.01, "mi = {}", mi);
}

#[test]
fn test_neighborhoods_are_cached() {
    let mut estimator = estimator_for(&two_peaks(200, 300, 9));
    let first = estimator.calculate_mi(5).unwrap();
    let dataset = estimator.dataset().unwrap();
    let full_queries = dataset.full_index().query_count();
    let coord_queries = dataset.coord_index().query_count();
    assert_eq!(full_queries, 500);
    assert_eq!(coord_queries, 500);

    let second = estimator.calculate_mi(5).unwrap();
    let weights: HashMap<String, f64> =
        [("A".to_string(), 0.4), ("B".to_string(), 0.6)].into_iter().collect();
    estimator.calculate_weighted_mi(&weights, 5).unwrap();
    let dataset = estimator.dataset().unwrap();
    assert_eq!(first, second);
    assert_eq!(dataset.full_index().query_count(), full_queries);
    assert_eq!(dataset.coord_index().query_count(), coord_queries);

    estimator.calculate_mi(6).unwrap();
    let dataset = estimator.dataset().unwrap();
    assert_eq!(dataset.full_index().query_count(), 2 * full_queries);
}

#[test]
fn test_reload_invalidates_cache() {
    let mut estimator = estimator_for(&two_peaks(200, 200, 10));
    estimator.calculate_mi(5).unwrap();
    estimator.load(&two_peaks(200, 200, 11)).unwrap();
    assert!(estimator.neighborhoods().is_none());
    assert!(matches!(
        estimator.optimize_weights(),
        Err(CapacityError::StaleNeighborhoods)
    ));
}

#[test]
fn test_empty_sample() {
    let mut estimator = WeightedKraskovEstimator::<String>::new();
    estimator.load(&[]).unwrap();
    let err = estimator.calculate_mi(3).unwrap_err();
    assert!(matches!(err, CapacityError::NoDataLoaded));
    assert!(err.is_precondition());

    let config = EstimatorConfig::default();
    assert!(matches!(
        PreparedDataset::<String>::prepare(&[], &config),
        Err(CapacityError::NoDataLoaded)
    ));
}

#[test]
fn test_neighbor_count_too_large() {
    let mut samples = two_peaks(50, 5, 12);
    samples.push(Observation::new("C".to_string(), vec![0.5]));
    let mut estimator = estimator_for(&samples);
    match estimator.calculate_mi(5) {
        Err(CapacityError::NeighborhoodTooLarge { k, population, .. }) => {
            assert_eq!(k, 5);
            assert_eq!(population, 1);
        }
        other => panic!("expected NeighborhoodTooLarge, got {:?}", other.map(|_| ())),
    }
    assert!(estimator_for(&two_peaks(50, 5, 12)).calculate_mi(5).is_err());
    assert!(estimator_for(&two_peaks(50, 6, 12)).calculate_mi(5).is_ok());
}

#[test]
fn test_value_pipeline_matches_facade() {
    let samples = two_peaks(300, 500, 13);
    let config = EstimatorConfig::default().with_parallel(false);
    let dataset = PreparedDataset::prepare(&samples, &config).unwrap();
    let hoods = compute_neighborhoods(&dataset, NeighborCount::new(7).unwrap(), false).unwrap();
    let direct = estimate_mi(&dataset, &hoods).unwrap();

    let facade = estimator_for(&samples).calculate_mi(7).unwrap();
    assert!((direct - facade).abs() < 1e-12);
}

#[test]
fn test_weighted_at_natural_proportions_equals_plain() {
    let samples = NoisyChannel::new(0.2)
        .with_input("A".to_string(), 400, vec![0.0])
        .with_input("B".to_string(), 800, vec![0.4])
        .with_seed(14)
        .transmit()
        .unwrap();
    let mut estimator = estimator_for(&samples);
    let plain = estimator.calculate_mi(10).unwrap();
    let weights: HashMap<String, f64> =
        [("A".to_string(), 1.0 / 3.0), ("B".to_string(), 2.0 / 3.0)].into_iter().collect();
    let weighted = estimator.calculate_weighted_mi(&weights, 10).unwrap();
    assert!((plain - weighted).abs() < 1e-9, "{} vs {}", plain, weighted);
}

#[test]
fn test_weighted_equal_sizes() {
    let mut estimator = estimator_for(&two_peaks(2000, 2000, 15));
    let weights: HashMap<String, f64> =
        [("A".to_string(), 1.0 / 3.0), ("B".to_string(), 2.0 / 3.0)].into_iter().collect();
    let mi = estimator.calculate_weighted_mi(&weights, 15).unwrap();
    let exact = entropy_bits(&[1.0 / 3.0, 2.0 / 3.0]);
    assert!(((mi - exact) / exact).abs() < 0.04, "mi = {}, exact = {}", mi, exact);
}

#[test]
fn test_weighted_unequal_sizes() {
    let mut estimator = estimator_for(&two_peaks(1000, 2000, 16));
    let weights: HashMap<String, f64> =
        [("A".to_string(), 0.5), ("B".to_string(), 0.5)].into_iter().collect();
    let mi = estimator.calculate_weighted_mi(&weights, 15).unwrap();
    assert!((mi - 1.0).abs() < 0.04, "mi = {}", mi);
}

#[test]
fn test_weight_validation() {
    let mut estimator = estimator_for(&two_peaks(100, 100, 17));
    let map = |pairs: &[(&str, f64)]| -> HashMap<String, f64> {
        pairs.iter().map(|(l, w)| (l.to_string(), *w)).collect()
    };

    assert!(matches!(
        estimator.calculate_weighted_mi(&map(&[("A", 0.5), ("B", 0.6)]), 5),
        Err(CapacityError::ValidationError(_))
    ));
    assert!(matches!(
        estimator.calculate_weighted_mi(&map(&[("A", 1.2), ("B", -0.2)]), 5),
        Err(CapacityError::ValidationError(_))
    ));
    assert!(matches!(
        estimator.calculate_weighted_mi(&map(&[("A", 1.0)]), 5),
        Err(CapacityError::ValidationError(_))
    ));
    assert!(matches!(
        estimator.calculate_weighted_mi(&map(&[("A", 0.5), ("B", 0.25), ("Z", 0.25)]), 5),
        Err(CapacityError::UnknownLabel(_))
    ));
    assert!(matches!(
        estimator.calculate_weighted_mi(&map(&[("A", 1.0), ("B", 0.0)]), 5),
        Err(CapacityError::NumericalDegeneracy(_))
    ));
    assert!(estimator
        .calculate_weighted_mi(&map(&[("A", 0.5), ("B", 0.505)]), 5)
        .is_ok());
}

#[test]
fn test_unseparable_extent_rejected_on_load() {
    let samples = vec![
        Observation::new("A".to_string(), vec![-1e160]),
        Observation::new("A".to_string(), vec![0.0]),
        Observation::new("B".to_string(), vec![1e160]),
        Observation::new("B".to_string(), vec![5e159]),
    ];
    let mut estimator = WeightedKraskovEstimator::new();
    assert!(matches!(
        estimator.load(&samples),
        Err(CapacityError::ValidationError(_))
    ));
    assert!(estimator.dataset().is_none());
}
