//! Gravity dataset handlers: upload, retrieval, derivations and maps.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use gravmap_core::{AnomalyResult, ClusteringResult, Figure, GravityRecord};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::pipeline;
use crate::state::AppState;

/// Upload response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Human-readable outcome.
    pub message: String,
    /// Rows inserted, equal to the rows parsed from the CSV.
    pub row_count: usize,
}

/// Clustering query parameters.
#[derive(Debug, Deserialize)]
pub struct ClusterParams {
    /// Number of clusters to fit.
    #[serde(default = "default_n_clusters")]
    pub n_clusters: usize,
}

fn default_n_clusters() -> usize {
    3
}

/// Anomaly-detection query parameters.
#[derive(Debug, Deserialize)]
pub struct AnomalyParams {
    /// Expected fraction of outliers, exclusive (0, 0.5).
    #[serde(default = "default_contamination")]
    pub contamination: f64,
}

fn default_contamination() -> f64 {
    0.05
}

/// Distance query parameters.
#[derive(Debug, Deserialize)]
pub struct DistanceParams {
    /// Reference latitude in decimal degrees.
    pub ref_lat: f64,
    /// Reference longitude in decimal degrees.
    pub ref_lon: f64,
}

/// Interpolation query parameters.
#[derive(Debug, Deserialize)]
pub struct InterpolationParams {
    /// Grid edge length for the interpolated surface.
    #[serde(default = "default_grid_resolution")]
    pub grid_resolution: usize,
}

fn default_grid_resolution() -> usize {
    100
}

/// Upload a gravity survey CSV, replacing the stored dataset.
pub async fn upload_data(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    body: Bytes,
) -> Result<Json<UploadResponse>, ApiError> {
    let row_count = pipeline::ingest_csv(state.store.as_ref(), &body).await?;
    Ok(Json(UploadResponse {
        message: format!("Successfully uploaded {row_count} rows"),
        row_count,
    }))
}

/// Retrieve the full dataset, including derived columns.
pub async fn get_data(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> Result<Json<Vec<GravityRecord>>, ApiError> {
    let records = pipeline::load_dataset(state.store.as_ref()).await?;
    Ok(Json(records))
}

/// Clear all loaded gravity data.
pub async fn clear_data(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    pipeline::clear_dataset(state.store.as_ref()).await?;
    Ok(Json(serde_json::json!({
        "message": "All gravity data cleared"
    })))
}

/// Calculate the Bouguer anomaly for every row.
pub async fn bouguer_anomaly(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> Result<Json<Vec<GravityRecord>>, ApiError> {
    let records = pipeline::derive_bouguer(state.store.as_ref()).await?;
    Ok(Json(records))
}

/// Partition the dataset with k-means.
pub async fn kmeans_clusters(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Query(params): Query<ClusterParams>,
) -> Result<Json<Vec<ClusteringResult>>, ApiError> {
    let results = pipeline::derive_clusters(state.store.as_ref(), params.n_clusters).await?;
    Ok(Json(results))
}

/// Run isolation-forest anomaly detection over the dataset.
pub async fn anomaly_detection(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Query(params): Query<AnomalyParams>,
) -> Result<Json<Vec<AnomalyResult>>, ApiError> {
    let results = pipeline::derive_anomalies(state.store.as_ref(), params.contamination).await?;
    Ok(Json(results))
}

/// Calculate per-row distance from a reference point.
pub async fn distance_from_point(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Query(params): Query<DistanceParams>,
) -> Result<Json<Vec<GravityRecord>>, ApiError> {
    let records =
        pipeline::derive_distance(state.store.as_ref(), params.ref_lat, params.ref_lon).await?;
    Ok(Json(records))
}

/// Bouguer anomaly scatter map.
pub async fn plot_map_bouguer(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> Result<Json<Figure>, ApiError> {
    let figure = pipeline::bouguer_figure(state.store.as_ref()).await?;
    Ok(Json(figure))
}

/// Anomaly-detection scatter map.
pub async fn plot_map_anomaly(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> Result<Json<Figure>, ApiError> {
    let figure = pipeline::anomaly_figure(state.store.as_ref()).await?;
    Ok(Json(figure))
}

/// Cluster scatter map.
pub async fn plot_map_clusters(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> Result<Json<Figure>, ApiError> {
    let figure = pipeline::cluster_figure(state.store.as_ref()).await?;
    Ok(Json(figure))
}

/// Interpolated-gravity contour map.
pub async fn interpolate_gravity(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Query(params): Query<InterpolationParams>,
) -> Result<Json<Figure>, ApiError> {
    let figure =
        pipeline::interpolation_figure(state.store.as_ref(), params.grid_resolution).await?;
    Ok(Json(figure))
}
