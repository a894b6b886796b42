//! Lloyd-iteration k-means over the survey feature matrix.
//!
//! Initialisation picks evenly-spaced data points perturbed by a seeded
//! LCG, so the partition is reproducible for a given seed.

use super::{Lcg, FEATURE_DIM};

const MAX_ITERATIONS: usize = 300;

/// Assign each row to one of `k` clusters. Returns one label per row in
/// `0..k`. `k` is clamped to the number of rows.
pub(crate) fn lloyd(data: &[[f64; FEATURE_DIM]], k: usize, seed: u64) -> Vec<usize> {
    if data.is_empty() {
        return Vec::new();
    }
    let k = k.min(data.len());

    // Deterministic init: evenly-spaced points with an LCG offset.
    let mut rng = Lcg::new(seed);
    let mut centroids: Vec<[f64; FEATURE_DIM]> = Vec::with_capacity(k);
    for i in 0..k {
        let idx = (rng.next_index(data.len()) + i * data.len() / k) % data.len();
        centroids.push(data[idx]);
    }

    let mut assignments = vec![0usize; data.len()];

    for _ in 0..MAX_ITERATIONS {
        // Assign each point to the nearest centroid.
        let mut changed = false;
        for (i, point) in data.iter().enumerate() {
            let mut best = 0;
            let mut best_dist = f64::MAX;
            for (j, centroid) in centroids.iter().enumerate() {
                let dist = squared_distance(point, centroid);
                if dist < best_dist {
                    best_dist = dist;
                    best = j;
                }
            }
            if assignments[i] != best {
                assignments[i] = best;
                changed = true;
            }
        }

        if !changed {
            break;
        }

        // Move each centroid to the mean of its members.
        let mut sums = vec![[0.0; FEATURE_DIM]; k];
        let mut counts = vec![0usize; k];
        for (i, point) in data.iter().enumerate() {
            let c = assignments[i];
            counts[c] += 1;
            for (d, v) in point.iter().enumerate() {
                sums[c][d] += v;
            }
        }
        #[allow(clippy::cast_precision_loss)]
        for j in 0..k {
            if counts[j] > 0 {
                for d in 0..FEATURE_DIM {
                    centroids[j][d] = sums[j][d] / counts[j] as f64;
                }
            }
        }
    }

    assignments
}

fn squared_distance(a: &[f64; FEATURE_DIM], b: &[f64; FEATURE_DIM]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_cluster_gets_label_zero() {
        let data = vec![[0.0, 0.0, 0.0, 0.0], [1.0, 1.0, 1.0, 1.0]];
        let labels = lloyd(&data, 1, 42);
        assert_eq!(labels, vec![0, 0]);
    }

    #[test]
    fn k_is_clamped_to_dataset_size() {
        let data = vec![[0.0, 0.0, 0.0, 0.0], [5.0, 5.0, 5.0, 5.0]];
        let labels = lloyd(&data, 10, 42);
        assert!(labels.iter().all(|&l| l < 2));
    }

    #[test]
    fn identical_seeds_reproduce_the_partition() {
        let data: Vec<[f64; 4]> = (0..30)
            .map(|i| {
                let x = f64::from(i);
                [x, x * 2.0, x.sin(), x.cos()]
            })
            .collect();
        assert_eq!(lloyd(&data, 4, 42), lloyd(&data, 4, 42));
    }
}
