//! The gravity dataset pipeline.
//!
//! Orchestrates ingest → validate → persist → derive → model-invoke for the
//! tabular dataset held in the store. Each derivation writes back only the
//! column it computed, addressed by row id; rows without ids fall into a
//! documented degraded path that clears and re-inserts the dataset.

use gravmap_core::{
    geodesy, interpolate_gravity, models, parse_csv, plot, AnomalyResult, ClusteringResult,
    CoreError, Figure, GravityRecord, GravityUpdate,
};
use gravmap_store::Store;

use crate::error::ApiError;

/// Parse uploaded CSV bytes and replace the stored dataset.
///
/// Validation happens entirely before the first store write, so a rejected
/// upload leaves prior data untouched. Returns the number of rows inserted.
pub async fn ingest_csv(store: &dyn Store, bytes: &[u8]) -> Result<usize, ApiError> {
    let points = parse_csv(bytes)?;
    let count = store.replace_gravity_data(&points).await?;
    tracing::info!(rows = count, "gravity dataset replaced");
    Ok(count)
}

/// Fetch the full dataset, failing when nothing is loaded.
pub async fn load_dataset(store: &dyn Store) -> Result<Vec<GravityRecord>, ApiError> {
    let records = store.get_gravity_data().await?;
    if records.is_empty() {
        return Err(CoreError::EmptyDataset.into());
    }
    Ok(records)
}

/// Delete every gravity row.
pub async fn clear_dataset(store: &dyn Store) -> Result<(), ApiError> {
    store.clear_gravity_data().await?;
    tracing::info!("gravity dataset cleared");
    Ok(())
}

/// Write one derived column per row back to the store.
///
/// `updates` is aligned with `records`. When every row has an id, each
/// update is issued as its own statement (no batching, no spanning
/// transaction — a mid-loop failure leaves earlier rows updated). When any
/// row lacks an id, the dataset is cleared and re-inserted carrying only
/// the raw points and the newly computed column; every other derived
/// column is dropped. That path is lossy and logged as degraded.
async fn write_back(
    store: &dyn Store,
    records: &mut [GravityRecord],
    updates: &[GravityUpdate],
) -> Result<(), ApiError> {
    for (record, update) in records.iter_mut().zip(updates) {
        update.apply(record);
    }

    if records.iter().all(|r| r.id.is_some()) {
        for (record, update) in records.iter().zip(updates) {
            if let Some(id) = record.id {
                store.update_gravity_column(id, *update).await?;
            }
        }
    } else {
        tracing::warn!(
            column = updates.first().map_or("?", GravityUpdate::column),
            "rows without ids in write-back; clearing and re-inserting the dataset"
        );
        let reinserted: Vec<GravityRecord> = records
            .iter()
            .zip(updates)
            .map(|(r, update)| {
                let mut fresh = GravityRecord::from_point(r.point);
                update.apply(&mut fresh);
                fresh
            })
            .collect();
        store.clear_gravity_data().await?;
        store.insert_gravity_records(&reinserted).await?;
    }

    Ok(())
}

/// Compute the Bouguer anomaly for every row and persist the column.
pub async fn derive_bouguer(store: &dyn Store) -> Result<Vec<GravityRecord>, ApiError> {
    let mut records = load_dataset(store).await?;
    let updates: Vec<GravityUpdate> = records
        .iter()
        .map(|r| GravityUpdate::Bouguer(geodesy::bouguer_anomaly(r.point.gravity, r.point.elevation)))
        .collect();
    write_back(store, &mut records, &updates).await?;
    Ok(records)
}

/// Compute the haversine distance from a reference point for every row and
/// persist the column.
pub async fn derive_distance(
    store: &dyn Store,
    ref_lat: f64,
    ref_lon: f64,
) -> Result<Vec<GravityRecord>, ApiError> {
    let mut records = load_dataset(store).await?;
    let updates: Vec<GravityUpdate> = records
        .iter()
        .map(|r| {
            GravityUpdate::DistanceKm(geodesy::haversine(
                ref_lat,
                ref_lon,
                r.point.latitude,
                r.point.longitude,
            ))
        })
        .collect();
    write_back(store, &mut records, &updates).await?;
    Ok(records)
}

/// Cluster the dataset and persist the labels.
pub async fn derive_clusters(
    store: &dyn Store,
    n_clusters: usize,
) -> Result<Vec<ClusteringResult>, ApiError> {
    let mut records = load_dataset(store).await?;
    let labels = models::run_clustering(&records, n_clusters)?;
    let updates: Vec<GravityUpdate> = labels.iter().map(|&l| GravityUpdate::Cluster(l)).collect();
    write_back(store, &mut records, &updates).await?;

    Ok(records
        .iter()
        .zip(labels)
        .map(|(r, cluster)| ClusteringResult {
            point: r.point,
            cluster,
        })
        .collect())
}

/// Run anomaly detection over the dataset and persist the flags.
pub async fn derive_anomalies(
    store: &dyn Store,
    contamination: f64,
) -> Result<Vec<AnomalyResult>, ApiError> {
    let mut records = load_dataset(store).await?;
    let labels = models::run_anomaly_detection(&records, contamination)?;
    let updates: Vec<GravityUpdate> = labels.iter().map(|&l| GravityUpdate::Anomaly(l)).collect();
    write_back(store, &mut records, &updates).await?;

    Ok(records
        .iter()
        .zip(labels)
        .map(|(r, anomaly)| AnomalyResult {
            point: r.point,
            anomaly,
        })
        .collect())
}

/// Bouguer anomaly scatter map over the current dataset.
pub async fn bouguer_figure(store: &dyn Store) -> Result<Figure, ApiError> {
    let records = load_dataset(store).await?;
    Ok(plot::bouguer_map(&records)?)
}

/// Anomaly-detection scatter map over the current dataset.
pub async fn anomaly_figure(store: &dyn Store) -> Result<Figure, ApiError> {
    let records = load_dataset(store).await?;
    Ok(plot::anomaly_map(&records)?)
}

/// Cluster scatter map over the current dataset.
pub async fn cluster_figure(store: &dyn Store) -> Result<Figure, ApiError> {
    let records = load_dataset(store).await?;
    Ok(plot::cluster_map(&records)?)
}

/// Interpolated-gravity contour figure over the current dataset.
pub async fn interpolation_figure(
    store: &dyn Store,
    grid_resolution: usize,
) -> Result<Figure, ApiError> {
    let records = load_dataset(store).await?;
    let grid = interpolate_gravity(&records, grid_resolution)?;
    Ok(plot::interpolation_map(grid))
}
