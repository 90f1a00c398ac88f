//! Dense label indexing

use ndarray::Array1;
use std::collections::HashMap;
use std::hash::Hash;

/// Bijection between observed labels and `0..n_labels`, in first-seen order,
/// together with the population of each label.
#[derive(Debug, Clone)]
pub struct LabelIndex<L> {
    forward: HashMap<L, usize>,
    reverse: Vec<L>,
    populations: Vec<usize>,
}

impl<L> Default for LabelIndex<L> {
    fn default() -> Self {
        Self {
            forward: HashMap::new(),
            reverse: Vec::new(),
            populations: Vec::new(),
        }
    }
}

impl<L: Clone + Eq + Hash> LabelIndex<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every label of `labels` in a single pass, returning the per-point indices
    pub fn build<'a, I>(labels: I) -> (Self, Vec<usize>)
    where
        I: IntoIterator<Item = &'a L>,
        L: 'a,
    {
        let mut index = Self::new();
        let assigned = labels.into_iter().map(|l| index.assign(l)).collect();
        (index, assigned)
    }

    /// Index of `label`, allocating the next one if it was not seen yet.
    /// Every call counts one point towards the label's population.
    pub fn assign(&mut self, label: &L) -> usize {
        if let Some(&idx) = self.forward.get(label) {
            self.populations[idx] += 1;
            return idx;
        }
        let idx = self.reverse.len();
        self.forward.insert(label.clone(), idx);
        self.reverse.push(label.clone());
        self.populations.push(1);
        idx
    }

    pub fn index_of(&self, label: &L) -> Option<usize> {
        self.forward.get(label).copied()
    }

    /// Map a per-index vector back to a label dictionary
    pub fn to_map(&self, values: &Array1<f64>) -> HashMap<L, f64> {
        self.reverse
            .iter()
            .cloned()
            .zip(values.iter().copied())
            .collect()
    }
}

impl<L> LabelIndex<L> {
    pub fn label(&self, index: usize) -> Option<&L> {
        self.reverse.get(index)
    }

    pub fn labels(&self) -> &[L] {
        &self.reverse
    }

    pub fn population(&self, index: usize) -> usize {
        self.populations.get(index).copied().unwrap_or(0)
    }

    pub fn populations(&self) -> Array1<f64> {
        self.populations.iter().map(|&c| c as f64).collect()
    }

    /// Smallest label population together with its index
    pub fn smallest_population(&self) -> Option<(usize, usize)> {
        self.populations
            .iter()
            .copied()
            .enumerate()
            .min_by_key(|&(_, c)| c)
    }

    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }
}
