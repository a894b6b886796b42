//! Renderable map figures.
//!
//! A [`Figure`] is a set of trace descriptors plus a layout descriptor,
//! serializable to the JSON document an external rendering client consumes.
//! Each map constructor checks that its source column holds at least one
//! value and fails with a precondition error otherwise.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::gravity::GravityRecord;
use crate::models::GravityGrid;

/// Continuous colour scale for bouguer and interpolation maps.
const CONTINUOUS_SCALE: &str = "Viridis";

/// Default map zoom level.
const MAP_ZOOM: u8 = 6;

/// A renderable graph: traces plus layout.
#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    /// Trace descriptors.
    pub data: Vec<Trace>,
    /// Layout descriptor.
    pub layout: Layout,
}

/// One trace: geometry plus per-point styling.
#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    /// Trace kind: "scattermap" or "contour".
    #[serde(rename = "type")]
    pub trace_type: &'static str,
    /// Point latitudes (scatter maps).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<Vec<f64>>,
    /// Point longitudes (scatter maps).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<Vec<f64>>,
    /// Drawing mode (scatter maps).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
    /// Legend name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Marker styling (scatter maps).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    /// Grid x axis (contour).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Vec<f64>>,
    /// Grid y axis (contour).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Vec<f64>>,
    /// Grid values (contour).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<Vec<Vec<f64>>>,
    /// Colour scale name (contour).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorscale: Option<&'static str>,
    /// Colour bar title (contour).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorbar_title: Option<&'static str>,
}

impl Trace {
    fn scatter() -> Self {
        Self {
            trace_type: "scattermap",
            lat: None,
            lon: None,
            mode: Some("markers"),
            name: None,
            marker: None,
            x: None,
            y: None,
            z: None,
            colorscale: None,
            colorbar_title: None,
        }
    }
}

/// Marker styling for a scatter trace.
#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    /// Per-point values bound to a colour scale, or one fixed colour.
    pub color: MarkerColor,
    /// Continuous colour scale, when `color` carries values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorscale: Option<&'static str>,
    /// Whether to render the colour bar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showscale: Option<bool>,
}

/// Either a value-per-point colour binding or a single named colour.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MarkerColor {
    /// Values mapped through the trace's colour scale.
    Values(Vec<f64>),
    /// A fixed CSS colour name.
    Fixed(&'static str),
}

/// Figure layout: title plus map or axis configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    /// Figure title.
    pub title: String,
    /// Base-map configuration (scatter maps).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<MapLayout>,
    /// X axis title (contour).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis_title: Option<&'static str>,
    /// Y axis title (contour).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis_title: Option<&'static str>,
}

/// Base-map style, zoom and centre.
#[derive(Debug, Clone, Serialize)]
pub struct MapLayout {
    /// Tile style.
    pub style: &'static str,
    /// Zoom level.
    pub zoom: u8,
    /// Map centre.
    pub center: MapCenter,
}

/// Centre coordinates for a base map.
#[derive(Debug, Clone, Serialize)]
pub struct MapCenter {
    /// Centre latitude.
    pub lat: f64,
    /// Centre longitude.
    pub lon: f64,
}

#[allow(clippy::cast_precision_loss)]
fn map_layout(title: &str, records: &[GravityRecord]) -> Layout {
    let n = records.len().max(1) as f64;
    let lat = records.iter().map(|r| r.point.latitude).sum::<f64>() / n;
    let lon = records.iter().map(|r| r.point.longitude).sum::<f64>() / n;
    Layout {
        title: title.to_string(),
        map: Some(MapLayout {
            style: "open-street-map",
            zoom: MAP_ZOOM,
            center: MapCenter { lat, lon },
        }),
        xaxis_title: None,
        yaxis_title: None,
    }
}

/// Scatter map coloured by the Bouguer anomaly, continuous Viridis scale.
///
/// # Errors
///
/// `CoreError::Precondition` unless at least one row carries a bouguer
/// value.
pub fn bouguer_map(records: &[GravityRecord]) -> Result<Figure> {
    let rows: Vec<&GravityRecord> = records.iter().filter(|r| r.bouguer.is_some()).collect();
    if rows.is_empty() {
        return Err(CoreError::Precondition(
            "bouguer anomaly has not been calculated; run the Bouguer derivation first".into(),
        ));
    }

    let mut trace = Trace::scatter();
    trace.lat = Some(rows.iter().map(|r| r.point.latitude).collect());
    trace.lon = Some(rows.iter().map(|r| r.point.longitude).collect());
    trace.name = Some("bouguer".into());
    trace.marker = Some(Marker {
        color: MarkerColor::Values(rows.iter().filter_map(|r| r.bouguer).collect()),
        colorscale: Some(CONTINUOUS_SCALE),
        showscale: Some(true),
    });

    Ok(Figure {
        data: vec![trace],
        layout: map_layout("Bouguer Anomaly Map", records),
    })
}

/// Scatter map of anomaly flags: -1 rendered red, 1 rendered blue.
///
/// # Errors
///
/// `CoreError::Precondition` unless at least one row carries an anomaly
/// flag.
pub fn anomaly_map(records: &[GravityRecord]) -> Result<Figure> {
    let flagged: Vec<&GravityRecord> = records.iter().filter(|r| r.anomaly.is_some()).collect();
    if flagged.is_empty() {
        return Err(CoreError::Precondition(
            "anomaly detection has not been performed; run the detection stage first".into(),
        ));
    }

    let mut data = Vec::new();
    for (label, color) in [(-1, "red"), (1, "blue")] {
        let rows: Vec<&&GravityRecord> =
            flagged.iter().filter(|r| r.anomaly == Some(label)).collect();
        if rows.is_empty() {
            continue;
        }
        let mut trace = Trace::scatter();
        trace.lat = Some(rows.iter().map(|r| r.point.latitude).collect());
        trace.lon = Some(rows.iter().map(|r| r.point.longitude).collect());
        trace.name = Some(label.to_string());
        trace.marker = Some(Marker {
            color: MarkerColor::Fixed(color),
            colorscale: None,
            showscale: None,
        });
        data.push(trace);
    }

    Ok(Figure {
        data,
        layout: map_layout("Gravity Anomaly Detection", records),
    })
}

/// Scatter map of cluster labels, one trace per cluster with the
/// renderer's default categorical colours.
///
/// # Errors
///
/// `CoreError::Precondition` unless at least one row carries a cluster
/// label.
pub fn cluster_map(records: &[GravityRecord]) -> Result<Figure> {
    let mut clusters: BTreeMap<i32, Vec<&GravityRecord>> = BTreeMap::new();
    for record in records {
        if let Some(label) = record.cluster {
            clusters.entry(label).or_default().push(record);
        }
    }
    if clusters.is_empty() {
        return Err(CoreError::Precondition(
            "clustering has not been performed; run the clustering stage first".into(),
        ));
    }

    let data = clusters
        .into_iter()
        .map(|(label, rows)| {
            let mut trace = Trace::scatter();
            trace.lat = Some(rows.iter().map(|r| r.point.latitude).collect());
            trace.lon = Some(rows.iter().map(|r| r.point.longitude).collect());
            trace.name = Some(label.to_string());
            trace
        })
        .collect();

    Ok(Figure {
        data,
        layout: map_layout("Gravity Data K-Means Clusters", records),
    })
}

/// Contour figure over an interpolated gravity grid.
#[must_use]
pub fn interpolation_map(grid: GravityGrid) -> Figure {
    let trace = Trace {
        trace_type: "contour",
        lat: None,
        lon: None,
        mode: None,
        name: None,
        marker: None,
        x: Some(grid.lons),
        y: Some(grid.lats),
        z: Some(grid.values),
        colorscale: Some(CONTINUOUS_SCALE),
        colorbar_title: Some("Gravity (mGal)"),
    };

    Figure {
        data: vec![trace],
        layout: Layout {
            title: "Interpolated Gravity Map".into(),
            map: None,
            xaxis_title: Some("Longitude"),
            yaxis_title: Some("Latitude"),
        },
    }
}
