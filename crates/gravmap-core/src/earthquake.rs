//! Earthquake records and query filters.
//!
//! Earthquake rows are read-only from the core's perspective; an external
//! ingestion process populates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalogued earthquake event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Earthquake {
    /// External catalogue id (primary key).
    pub id: String,
    /// Origin time.
    pub time: DateTime<Utc>,
    /// Epicentre latitude in decimal degrees.
    pub latitude: f64,
    /// Epicentre longitude in decimal degrees.
    pub longitude: f64,
    /// Hypocentre depth in km.
    pub depth: f64,
    /// Magnitude.
    pub mag: f64,
    /// Magnitude type (e.g. "mb", "mww").
    pub magtype: Option<String>,
    /// Reporting network code.
    pub net: Option<String>,
    /// Human-readable location description.
    pub place: Option<String>,
    /// Review status (e.g. "reviewed", "automatic").
    pub status: Option<String>,
}

/// Filter parameters for an earthquake query.
#[derive(Debug, Clone, Deserialize)]
pub struct EarthquakeQuery {
    /// Inclusive lower bound on origin time.
    pub start_date: DateTime<Utc>,
    /// Inclusive upper bound on origin time.
    pub end_date: DateTime<Utc>,
    /// Minimum magnitude, if bounded.
    #[serde(default)]
    pub min_mag: Option<f64>,
    /// Maximum magnitude, if bounded.
    #[serde(default)]
    pub max_mag: Option<f64>,
    /// Minimum depth in km, if bounded.
    #[serde(default)]
    pub min_depth: Option<f64>,
    /// Maximum depth in km, if bounded.
    #[serde(default)]
    pub max_depth: Option<f64>,
}

impl EarthquakeQuery {
    /// Whether an event satisfies every bound in this query.
    #[must_use]
    pub fn matches(&self, quake: &Earthquake) -> bool {
        if quake.time < self.start_date || quake.time > self.end_date {
            return false;
        }
        if self.min_mag.is_some_and(|m| quake.mag < m) {
            return false;
        }
        if self.max_mag.is_some_and(|m| quake.mag > m) {
            return false;
        }
        if self.min_depth.is_some_and(|d| quake.depth < d) {
            return false;
        }
        if self.max_depth.is_some_and(|d| quake.depth > d) {
            return false;
        }
        true
    }
}
