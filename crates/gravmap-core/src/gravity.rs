//! Gravity survey records and CSV ingest.
//!
//! A survey row carries four raw fields (latitude, longitude, elevation,
//! gravity) plus independently-nullable derived columns, each of which is
//! written by exactly one pipeline stage. The raw fields are defined once in
//! [`GravityPoint`] and flattened into every shape that includes them.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// The CSV columns every uploaded dataset must provide.
pub const REQUIRED_COLUMNS: [&str; 4] = ["latitude", "longitude", "elevation", "gravity"];

/// A raw survey measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GravityPoint {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Elevation above the reference ellipsoid in metres.
    pub elevation: f64,
    /// Observed gravity in mGal.
    pub gravity: f64,
}

/// A stored survey row: the raw point plus derived columns.
///
/// `id` is assigned by the store on insert and stable afterwards. Derived
/// columns start out null and are populated by their derivation endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GravityRecord {
    /// Store-assigned row id. `None` only before first insert.
    pub id: Option<i64>,
    /// The raw measurement.
    #[serde(flatten)]
    pub point: GravityPoint,
    /// Bouguer anomaly in mGal, written by the Bouguer stage.
    pub bouguer: Option<f64>,
    /// Cluster label, written by the clustering stage.
    pub cluster: Option<i32>,
    /// Anomaly flag (-1 anomaly, 1 normal), written by the detection stage.
    pub anomaly: Option<i32>,
    /// Great-circle distance from a reference point in km.
    pub distance_km: Option<f64>,
}

impl GravityRecord {
    /// Create an unstored record from a raw point.
    #[must_use]
    pub fn from_point(point: GravityPoint) -> Self {
        Self {
            id: None,
            point,
            bouguer: None,
            cluster: None,
            anomaly: None,
            distance_km: None,
        }
    }
}

/// A single-column write against one row.
///
/// Derivation stages address rows by id and write back only the column they
/// computed; the variants make it impossible to clobber a sibling column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GravityUpdate {
    /// Set the `bouguer` column.
    Bouguer(f64),
    /// Set the `cluster` column.
    Cluster(i32),
    /// Set the `anomaly` column.
    Anomaly(i32),
    /// Set the `distance_km` column.
    DistanceKm(f64),
}

impl GravityUpdate {
    /// Name of the column this update writes.
    #[must_use]
    pub fn column(&self) -> &'static str {
        match self {
            Self::Bouguer(_) => "bouguer",
            Self::Cluster(_) => "cluster",
            Self::Anomaly(_) => "anomaly",
            Self::DistanceKm(_) => "distance_km",
        }
    }

    /// Apply this update to a record in place.
    pub fn apply(&self, record: &mut GravityRecord) {
        match *self {
            Self::Bouguer(v) => record.bouguer = Some(v),
            Self::Cluster(v) => record.cluster = Some(v),
            Self::Anomaly(v) => record.anomaly = Some(v),
            Self::DistanceKm(v) => record.distance_km = Some(v),
        }
    }
}

/// Clustering output shape: the raw point plus its cluster label.
#[derive(Debug, Clone, Serialize)]
pub struct ClusteringResult {
    /// The raw measurement.
    #[serde(flatten)]
    pub point: GravityPoint,
    /// Assigned cluster label.
    pub cluster: i32,
}

/// Anomaly-detection output shape: the raw point plus its anomaly flag.
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyResult {
    /// The raw measurement.
    #[serde(flatten)]
    pub point: GravityPoint,
    /// -1 for anomaly, 1 for normal.
    pub anomaly: i32,
}

/// Parse uploaded CSV bytes into raw survey points.
///
/// Column names are matched case-insensitively and may appear in any order;
/// columns beyond the required four are ignored.
///
/// # Errors
///
/// Returns `CoreError::Validation` if the CSV is unreadable, any required
/// column is absent, or a value fails to parse as a number.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<GravityPoint>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| CoreError::Validation(format!("unreadable CSV header: {e}")))?
        .clone();

    // Map each required column to its position, case-insensitively.
    let mut positions = [0usize; REQUIRED_COLUMNS.len()];
    let mut missing = Vec::new();
    for (slot, name) in REQUIRED_COLUMNS.iter().enumerate() {
        match headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
        {
            Some(pos) => positions[slot] = pos,
            None => missing.push(*name),
        }
    }
    if !missing.is_empty() {
        return Err(CoreError::Validation(format!(
            "CSV must contain the following columns: {}",
            missing.join(", ")
        )));
    }

    let mut points = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row.map_err(|e| CoreError::Validation(format!("unreadable CSV row: {e}")))?;
        let mut values = [0f64; REQUIRED_COLUMNS.len()];
        for (slot, name) in REQUIRED_COLUMNS.iter().enumerate() {
            let raw = row.get(positions[slot]).unwrap_or("");
            values[slot] = raw.parse().map_err(|_| {
                CoreError::Validation(format!(
                    "row {}: column '{}' value '{}' is not a number",
                    line + 1,
                    name,
                    raw
                ))
            })?;
        }
        points.push(GravityPoint {
            latitude: values[0],
            longitude: values[1],
            elevation: values[2],
            gravity: values[3],
        });
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lowercase_headers() {
        let csv = b"latitude,longitude,elevation,gravity\n10.0,20.0,100.0,980000.0\n";
        let points = parse_csv(csv).unwrap();
        assert_eq!(points.len(), 1);
        assert!((points[0].latitude - 10.0).abs() < f64::EPSILON);
        assert!((points[0].gravity - 980_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn headers_are_case_insensitive_and_order_free() {
        let csv = b"Gravity,ELEVATION,Longitude,latitude\n980000.0,100.0,20.0,10.0\n";
        let points = parse_csv(csv).unwrap();
        assert_eq!(points.len(), 1);
        assert!((points[0].latitude - 10.0).abs() < f64::EPSILON);
        assert!((points[0].longitude - 20.0).abs() < f64::EPSILON);
        assert!((points[0].elevation - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn extra_columns_are_ignored() {
        let csv = b"station,latitude,longitude,elevation,gravity\nA1,1.0,2.0,3.0,4.0\n";
        let points = parse_csv(csv).unwrap();
        assert_eq!(points.len(), 1);
        assert!((points[0].elevation - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_column_is_a_validation_error() {
        let csv = b"latitude,longitude,elevation\n1.0,2.0,3.0\n";
        let err = parse_csv(csv).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(err.to_string().contains("gravity"));
    }

    #[test]
    fn non_numeric_value_is_a_validation_error() {
        let csv = b"latitude,longitude,elevation,gravity\n1.0,2.0,high,4.0\n";
        let err = parse_csv(csv).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(err.to_string().contains("elevation"));
    }

    #[test]
    fn update_writes_only_its_column() {
        let mut record = GravityRecord::from_point(GravityPoint {
            latitude: 0.0,
            longitude: 0.0,
            elevation: 0.0,
            gravity: 0.0,
        });
        record.cluster = Some(2);

        GravityUpdate::Bouguer(12.5).apply(&mut record);

        assert_eq!(record.bouguer, Some(12.5));
        assert_eq!(record.cluster, Some(2));
        assert_eq!(record.anomaly, None);
    }
}
