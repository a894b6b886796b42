//! Scattered-data interpolation onto a regular lat/lon grid.
//!
//! Cubic-power inverse-distance weighting: smooth away from the samples and
//! exact at them, deterministic, and defined everywhere inside the bounding
//! box. Datasets too small for a cubic-family interpolant are rejected.

use serde::Serialize;

use crate::error::{CoreError, Result};

/// Minimum point count for a cubic-family interpolant.
const MIN_POINTS: usize = 4;

/// Inverse-distance exponent.
const POWER: i32 = 3;

/// Points closer than this (in degrees) are treated as coincident with a
/// grid node and copied through exactly.
const EXACT_EPS: f64 = 1e-9;

/// A regular grid of interpolated values spanning the data's bounding box.
#[derive(Debug, Clone, Serialize)]
pub struct GravityGrid {
    /// Grid latitudes, ascending.
    pub lats: Vec<f64>,
    /// Grid longitudes, ascending.
    pub lons: Vec<f64>,
    /// `values[i][j]` is the interpolated value at `(lats[i], lons[j])`.
    pub values: Vec<Vec<f64>>,
}

/// Interpolate `values` sampled at `points` onto a `resolution`-squared
/// grid over the bounding box.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn cubic_idw_grid(
    points: &[(f64, f64)],
    values: &[f64],
    resolution: usize,
) -> Result<GravityGrid> {
    if points.len() < MIN_POINTS {
        return Err(CoreError::ModelExecution {
            model: "interpolation",
            message: format!(
                "cubic interpolation requires at least {MIN_POINTS} points, got {}",
                points.len()
            ),
        });
    }

    let (mut lat_min, mut lat_max) = (f64::MAX, f64::MIN);
    let (mut lon_min, mut lon_max) = (f64::MAX, f64::MIN);
    for &(lat, lon) in points {
        lat_min = lat_min.min(lat);
        lat_max = lat_max.max(lat);
        lon_min = lon_min.min(lon);
        lon_max = lon_max.max(lon);
    }
    if lat_max - lat_min < EXACT_EPS || lon_max - lon_min < EXACT_EPS {
        return Err(CoreError::ModelExecution {
            model: "interpolation",
            message: "degenerate bounding box: points are collinear along an axis".into(),
        });
    }

    let steps = (resolution - 1) as f64;
    let lats: Vec<f64> = (0..resolution)
        .map(|i| lat_min + (lat_max - lat_min) * i as f64 / steps)
        .collect();
    let lons: Vec<f64> = (0..resolution)
        .map(|j| lon_min + (lon_max - lon_min) * j as f64 / steps)
        .collect();

    let mut grid = Vec::with_capacity(resolution);
    for &lat in &lats {
        let mut row = Vec::with_capacity(resolution);
        for &lon in &lons {
            row.push(interpolate_at(points, values, lat, lon));
        }
        grid.push(row);
    }

    Ok(GravityGrid {
        lats,
        lons,
        values: grid,
    })
}

fn interpolate_at(points: &[(f64, f64)], values: &[f64], lat: f64, lon: f64) -> f64 {
    let mut weight_sum = 0.0;
    let mut value_sum = 0.0;
    for (&(p_lat, p_lon), &v) in points.iter().zip(values) {
        let d2 = (lat - p_lat) * (lat - p_lat) + (lon - p_lon) * (lon - p_lon);
        if d2 < EXACT_EPS * EXACT_EPS {
            return v;
        }
        let w = d2.sqrt().powi(-POWER);
        weight_sum += w;
        value_sum += w * v;
    }
    value_sum / weight_sum
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> (Vec<(f64, f64)>, Vec<f64>) {
        (
            vec![(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)],
            vec![10.0, 20.0, 30.0, 40.0],
        )
    }

    #[test]
    fn grid_is_exact_at_sample_points() {
        let (points, values) = square();
        let grid = cubic_idw_grid(&points, &values, 2).unwrap();
        assert!((grid.values[0][0] - 10.0).abs() < 1e-9);
        assert!((grid.values[0][1] - 20.0).abs() < 1e-9);
        assert!((grid.values[1][0] - 30.0).abs() < 1e-9);
        assert!((grid.values[1][1] - 40.0).abs() < 1e-9);
    }

    #[test]
    fn interior_values_are_bounded_by_samples() {
        let (points, values) = square();
        let grid = cubic_idw_grid(&points, &values, 11).unwrap();
        for row in &grid.values {
            for &v in row {
                assert!((10.0..=40.0).contains(&v), "got {v}");
            }
        }
    }

    #[test]
    fn collinear_points_are_rejected() {
        let points = vec![(0.0, 0.0), (0.0, 1.0), (0.0, 2.0), (0.0, 3.0)];
        let values = vec![1.0, 2.0, 3.0, 4.0];
        let err = cubic_idw_grid(&points, &values, 10).unwrap_err();
        assert!(matches!(err, CoreError::ModelExecution { .. }));
    }

    #[test]
    fn axes_are_ascending() {
        let (points, values) = square();
        let grid = cubic_idw_grid(&points, &values, 5).unwrap();
        assert!(grid.lats.windows(2).all(|w| w[0] < w[1]));
        assert!(grid.lons.windows(2).all(|w| w[0] < w[1]));
    }
}
