//! Model invocation adapters.
//!
//! Clustering, anomaly detection and grid interpolation are deterministic
//! numeric subroutines behind narrow feature-in/labels-out functions. The
//! adapters here validate parameters ([`CoreError::InvalidParameter`]) and
//! translate numeric failures ([`CoreError::ModelExecution`]); the
//! subroutines themselves live one file per block.

mod isolation;
mod kmeans;
mod interpolate;

pub use interpolate::GravityGrid;

use crate::error::{CoreError, Result};
use crate::gravity::GravityRecord;

/// Fixed seed shared by every model invocation, so repeated calls over the
/// same dataset reproduce the same labels.
pub const MODEL_SEED: u64 = 42;

/// Number of feature columns fed to the models.
pub(crate) const FEATURE_DIM: usize = 4;

/// Deterministic linear congruential generator (Knuth multiplier).
///
/// The models use this instead of an OS RNG so labels are reproducible
/// across repeated calls with the same seed.
pub(crate) struct Lcg(u64);

impl Lcg {
    pub(crate) fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0
    }

    /// Uniform value in `[0, 1)`.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform index in `[0, n)`. `n` must be non-zero.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn next_index(&mut self, n: usize) -> usize {
        (self.next_u64() >> 33) as usize % n
    }
}

/// Extract the feature matrix [latitude, longitude, elevation, gravity].
fn feature_matrix(records: &[GravityRecord], model: &'static str) -> Result<Vec<[f64; FEATURE_DIM]>> {
    records
        .iter()
        .map(|r| {
            let row = [
                r.point.latitude,
                r.point.longitude,
                r.point.elevation,
                r.point.gravity,
            ];
            if row.iter().all(|v| v.is_finite()) {
                Ok(row)
            } else {
                Err(CoreError::ModelExecution {
                    model,
                    message: "non-finite feature value in dataset".into(),
                })
            }
        })
        .collect()
}

/// Partition the dataset into `n_clusters` groups.
///
/// Returns one label per row in `0..n_clusters`, deterministically
/// reproducible across repeated calls.
///
/// # Errors
///
/// `InvalidParameter` if `n_clusters < 1`; `ModelExecution` if the feature
/// matrix contains non-finite values.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn run_clustering(records: &[GravityRecord], n_clusters: usize) -> Result<Vec<i32>> {
    if n_clusters < 1 {
        return Err(CoreError::InvalidParameter(
            "n_clusters must be at least 1".into(),
        ));
    }

    let features = feature_matrix(records, "kmeans")?;
    let labels = kmeans::lloyd(&features, n_clusters, MODEL_SEED);
    Ok(labels.into_iter().map(|l| l as i32).collect())
}

/// Flag the expected `contamination` fraction of rows as anomalies.
///
/// Returns one label per row: -1 for anomaly, 1 for normal.
///
/// # Errors
///
/// `InvalidParameter` unless `0 < contamination < 0.5`; `ModelExecution` if
/// the feature matrix contains non-finite values.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn run_anomaly_detection(records: &[GravityRecord], contamination: f64) -> Result<Vec<i32>> {
    if !(contamination > 0.0 && contamination < 0.5) {
        return Err(CoreError::InvalidParameter(
            "contamination must be between 0 and 0.5 (exclusive)".into(),
        ));
    }

    let features = feature_matrix(records, "isolation_forest")?;
    let scores = isolation::anomaly_scores(&features, MODEL_SEED);

    let n = scores.len();
    let flagged = ((contamination * n as f64).round() as usize).min(n);

    // Rank by score, most anomalous first; index tie-break keeps the
    // ordering total and reproducible.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut labels = vec![1i32; n];
    for &i in &order[..flagged] {
        labels[i] = -1;
    }
    Ok(labels)
}

/// Interpolate gravity values onto a regular grid spanning the data's
/// bounding box, for contour rendering.
///
/// # Errors
///
/// `InvalidParameter` if `grid_resolution < 2`; `ModelExecution` if there
/// are fewer points than cubic interpolation needs (four) or the bounding
/// box is degenerate, or if the feature matrix contains non-finite values.
pub fn interpolate_gravity(
    records: &[GravityRecord],
    grid_resolution: usize,
) -> Result<GravityGrid> {
    if grid_resolution < 2 {
        return Err(CoreError::InvalidParameter(
            "grid_resolution must be at least 2".into(),
        ));
    }

    // Reuse the finiteness check; interpolation only needs three of the
    // four columns.
    feature_matrix(records, "interpolation")?;

    let points: Vec<(f64, f64)> = records
        .iter()
        .map(|r| (r.point.latitude, r.point.longitude))
        .collect();
    let values: Vec<f64> = records.iter().map(|r| r.point.gravity).collect();

    interpolate::cubic_idw_grid(&points, &values, grid_resolution)
}
