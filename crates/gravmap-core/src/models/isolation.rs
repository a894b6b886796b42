//! Isolation-forest anomaly scoring.
//!
//! Trees isolate points by recursive random axis-aligned splits; points
//! with short average path lengths are easier to isolate and score higher.
//! All randomness comes from a seeded LCG, so scores are reproducible.

use super::{Lcg, FEATURE_DIM};

/// Number of trees in the forest.
const NUM_TREES: usize = 100;

/// Per-tree subsample ceiling.
const MAX_SUBSAMPLE: usize = 256;

enum Node {
    Leaf {
        size: usize,
    },
    Split {
        dim: usize,
        value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Anomaly score per row in `(0, 1)`; higher means more anomalous.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn anomaly_scores(data: &[[f64; FEATURE_DIM]], seed: u64) -> Vec<f64> {
    let n = data.len();
    if n == 0 {
        return Vec::new();
    }

    let subsample = n.min(MAX_SUBSAMPLE);
    let max_depth = (subsample as f64).log2().ceil().max(1.0) as usize;
    let mut rng = Lcg::new(seed);

    let mut path_sums = vec![0.0f64; n];
    for _ in 0..NUM_TREES {
        let sample = sample_without_replacement(n, subsample, &mut rng);
        let tree = build_tree(data, &sample, 0, max_depth, &mut rng);
        for (i, row) in data.iter().enumerate() {
            path_sums[i] += path_length(&tree, row, 0.0);
        }
    }

    let norm = average_path_length(subsample);
    path_sums
        .into_iter()
        .map(|sum| {
            let avg = sum / NUM_TREES as f64;
            2f64.powf(-avg / norm)
        })
        .collect()
}

/// Partial Fisher-Yates draw of `count` distinct indices from `0..n`.
fn sample_without_replacement(n: usize, count: usize, rng: &mut Lcg) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    for i in 0..count {
        let j = i + rng.next_index(n - i);
        indices.swap(i, j);
    }
    indices.truncate(count);
    indices
}

fn build_tree(
    data: &[[f64; FEATURE_DIM]],
    indices: &[usize],
    depth: usize,
    max_depth: usize,
    rng: &mut Lcg,
) -> Node {
    if indices.len() <= 1 || depth >= max_depth {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    // Pick a splittable dimension, starting at a random one.
    let start = rng.next_index(FEATURE_DIM);
    let mut split = None;
    for offset in 0..FEATURE_DIM {
        let dim = (start + offset) % FEATURE_DIM;
        let mut min = f64::MAX;
        let mut max = f64::MIN;
        for &i in indices {
            min = min.min(data[i][dim]);
            max = max.max(data[i][dim]);
        }
        if max > min {
            split = Some((dim, min, max));
            break;
        }
    }
    // All remaining points are identical; nothing left to isolate.
    let Some((dim, min, max)) = split else {
        return Node::Leaf {
            size: indices.len(),
        };
    };

    let value = min + rng.next_f64() * (max - min);
    let (left, right): (Vec<usize>, Vec<usize>) =
        indices.iter().partition(|&&i| data[i][dim] < value);

    Node::Split {
        dim,
        value,
        left: Box::new(build_tree(data, &left, depth + 1, max_depth, rng)),
        right: Box::new(build_tree(data, &right, depth + 1, max_depth, rng)),
    }
}

fn path_length(node: &Node, row: &[f64; FEATURE_DIM], depth: f64) -> f64 {
    match node {
        Node::Leaf { size } => depth + average_path_length(*size),
        Node::Split {
            dim,
            value,
            left,
            right,
        } => {
            if row[*dim] < *value {
                path_length(left, row, depth + 1.0)
            } else {
                path_length(right, row, depth + 1.0)
            }
        }
    }
}

/// Expected path length of an unsuccessful BST search over `n` points,
/// the standard isolation-forest normaliser.
#[allow(clippy::cast_precision_loss)]
fn average_path_length(n: usize) -> f64 {
    const EULER_MASCHERONI: f64 = 0.577_215_664_901_532_9;
    if n <= 1 {
        return 0.0;
    }
    let n = n as f64;
    2.0 * ((n - 1.0).ln() + EULER_MASCHERONI) - 2.0 * (n - 1.0) / n
}
