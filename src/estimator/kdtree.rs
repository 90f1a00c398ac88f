//! Bucketed k-d tree
//!
//! Supports the two queries the estimator needs:
//! - distance to the k-th nearest neighbor of an indexed point, bounded above;
//! - every point within a radius of a query (inclusive ball query).
//!
//! Points are copied into a flat buffer on construction and never change.

use ndarray::ArrayView2;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use super::config::LeafSize;

/// Euclidean distance between two points.
///
/// Both trees go through this function so that a same-label distance in the
/// immersed space and the matching coordinate-space distance are bit-identical.
#[inline]
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Max-heap entry (largest distance on top)
#[derive(Debug, Clone, Copy)]
struct HeapDist(f64);

impl PartialEq for HeapDist {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for HeapDist {}

impl PartialOrd for HeapDist {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapDist {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        start: usize,
        end: usize,
    },
    /// Left subtree holds points with `coord[axis] <= value`, right `>= value`
    Split {
        axis: usize,
        value: f64,
        left: usize,
        right: usize,
    },
}

/// Static k-d tree with leaf buckets
#[derive(Debug)]
pub struct KdTree {
    data: Vec<f64>,
    dim: usize,
    order: Vec<usize>,
    nodes: Vec<Node>,
    root: usize,
    leaf_size: usize,
    queries: AtomicUsize,
}

impl KdTree {
    /// Build a tree over the rows of `points`
    pub fn new(points: ArrayView2<'_, f64>, leaf_size: LeafSize) -> Self {
        let (n, dim) = points.dim();
        let data: Vec<f64> = points.iter().copied().collect();
        let mut tree = Self {
            data,
            dim,
            order: (0..n).collect(),
            nodes: Vec::new(),
            root: 0,
            leaf_size: leaf_size.get(),
            queries: AtomicUsize::new(0),
        };
        tree.root = tree.build(0, n);
        tree
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    /// Number of queries served since construction
    pub fn query_count(&self) -> usize {
        self.queries.load(AtomicOrdering::Relaxed)
    }

    /// Coordinates of the indexed point `index`
    pub fn point(&self, index: usize) -> &[f64] {
        &self.data[index * self.dim..(index + 1) * self.dim]
    }

    fn build(&mut self, start: usize, end: usize) -> usize {
        if end - start <= self.leaf_size {
            return self.push(Node::Leaf { start, end });
        }

        let axis = match self.widest_axis(start, end) {
            Some(axis) => axis,
            // every point in the range coincides
            None => return self.push(Node::Leaf { start, end }),
        };

        let mid = (end - start) / 2;
        {
            let data = &self.data;
            let dim = self.dim;
            self.order[start..end].select_nth_unstable_by(mid, |&a, &b| {
                data[a * dim + axis]
                    .partial_cmp(&data[b * dim + axis])
                    .unwrap_or(Ordering::Equal)
            });
        }
        let value = self.data[self.order[start + mid] * self.dim + axis];

        let left = self.build(start, start + mid);
        let right = self.build(start + mid, end);
        self.push(Node::Split {
            axis,
            value,
            left,
            right,
        })
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Axis with the largest spread, or `None` if the range is a single location
    fn widest_axis(&self, start: usize, end: usize) -> Option<usize> {
        let mut best = None;
        let mut best_spread = 0.0;
        for axis in 0..self.dim {
            let (lo, hi) = self.order[start..end].iter().fold(
                (f64::INFINITY, f64::NEG_INFINITY),
                |(lo, hi), &i| {
                    let v = self.data[i * self.dim + axis];
                    (lo.min(v), hi.max(v))
                },
            );
            let spread = hi - lo;
            if spread > best_spread {
                best_spread = spread;
                best = Some(axis);
            }
        }
        best
    }

    /// Distance from indexed point `index` to its k-th nearest other point,
    /// considering only points strictly closer than `upper_bound`.
    ///
    /// Returns `None` when fewer than k points lie within the bound.
    pub fn kth_neighbor_distance(&self, index: usize, k: usize, upper_bound: f64) -> Option<f64> {
        self.queries.fetch_add(1, AtomicOrdering::Relaxed);
        if k == 0 {
            return None;
        }

        let query = self.point(index);
        let mut heap: BinaryHeap<HeapDist> = BinaryHeap::with_capacity(k + 1);
        self.knn_recursive(self.root, query, index, k, upper_bound, &mut heap);

        if heap.len() == k {
            heap.peek().map(|d| d.0)
        } else {
            None
        }
    }

    fn knn_recursive(
        &self,
        node: usize,
        query: &[f64],
        skip: usize,
        k: usize,
        upper_bound: f64,
        heap: &mut BinaryHeap<HeapDist>,
    ) {
        match self.nodes[node] {
            Node::Leaf { start, end } => {
                for &i in &self.order[start..end] {
                    if i == skip {
                        continue;
                    }
                    let dist = euclidean_distance(query, self.point(i));
                    if dist >= upper_bound {
                        continue;
                    }
                    if heap.len() < k {
                        heap.push(HeapDist(dist));
                    } else if let Some(&HeapDist(worst)) = heap.peek() {
                        if dist < worst {
                            heap.pop();
                            heap.push(HeapDist(dist));
                        }
                    }
                }
            }
            Node::Split {
                axis,
                value,
                left,
                right,
            } => {
                let diff = query[axis] - value;
                let (near, far) = if diff < 0.0 { (left, right) } else { (right, left) };
                self.knn_recursive(near, query, skip, k, upper_bound, heap);

                let radius = if heap.len() < k {
                    upper_bound
                } else {
                    heap.peek().map_or(upper_bound, |d| d.0)
                };
                if diff.abs() <= radius {
                    self.knn_recursive(far, query, skip, k, upper_bound, heap);
                }
            }
        }
    }

    /// Call `f` with the index of every point at distance `<= radius` from `query`
    pub fn for_each_within<F: FnMut(usize)>(&self, query: &[f64], radius: f64, mut f: F) {
        self.queries.fetch_add(1, AtomicOrdering::Relaxed);
        self.ball_recursive(self.root, query, radius, &mut f);
    }

    /// Indices of every point at distance `<= radius` from `query`, boundary included
    pub fn within_radius(&self, query: &[f64], radius: f64) -> Vec<usize> {
        let mut found = Vec::new();
        self.for_each_within(query, radius, |i| found.push(i));
        found
    }

    fn ball_recursive<F: FnMut(usize)>(&self, node: usize, query: &[f64], radius: f64, f: &mut F) {
        match self.nodes[node] {
            Node::Leaf { start, end } => {
                for &i in &self.order[start..end] {
                    if euclidean_distance(query, self.point(i)) <= radius {
                        f(i);
                    }
                }
            }
            Node::Split {
                axis,
                value,
                left,
                right,
            } => {
                let diff = query[axis] - value;
                if diff <= radius {
                    self.ball_recursive(left, query, radius, f);
                }
                if -diff <= radius {
                    self.ball_recursive(right, query, radius, f);
                }
            }
        }
    }
}
