//! Earthquake query handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use gravmap_core::{Earthquake, EarthquakeQuery};
use gravmap_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Earthquake row as returned by the API.
#[derive(Debug, Serialize)]
pub struct EarthquakeResponse {
    /// External catalogue id.
    pub id: String,
    /// Origin time.
    pub time: DateTime<Utc>,
    /// Magnitude.
    pub mag: f64,
    /// Hypocentre depth in km.
    pub depth: f64,
    /// Human-readable location.
    pub place: Option<String>,
    /// Epicentre latitude.
    pub latitude: f64,
    /// Epicentre longitude.
    pub longitude: f64,
}

impl From<Earthquake> for EarthquakeResponse {
    fn from(quake: Earthquake) -> Self {
        Self {
            id: quake.id,
            time: quake.time,
            mag: quake.mag,
            depth: quake.depth,
            place: quake.place,
            latitude: quake.latitude,
            longitude: quake.longitude,
        }
    }
}

/// Fetch earthquakes matching the query filters.
pub async fn query_earthquakes(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Json(query): Json<EarthquakeQuery>,
) -> Result<Json<Vec<EarthquakeResponse>>, ApiError> {
    let rows = state.store.query_earthquakes(&query).await?;
    Ok(Json(rows.into_iter().map(EarthquakeResponse::from).collect()))
}
