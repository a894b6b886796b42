//! Core types and numeric routines for the gravmap platform.
//!
//! This crate provides the foundational pieces used throughout gravmap:
//!
//! - **Gravity data**: `GravityPoint`, `GravityRecord`, `GravityUpdate`,
//!   CSV ingest parsing
//! - **Users**: `User`, `UserProfile`, single-use `OneTimeToken`s
//! - **Earthquakes**: `Earthquake`, `EarthquakeQuery`
//! - **Geodesy**: Bouguer correction, haversine distance
//! - **Models**: deterministic clustering, anomaly detection and grid
//!   interpolation adapters
//! - **Figures**: map/contour documents for the rendering client
//!
//! Everything here is pure: persistence and HTTP live in the sibling
//! `gravmap-store` and `gravmap-service` crates.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod earthquake;
pub mod error;
pub mod geodesy;
pub mod gravity;
pub mod models;
pub mod plot;
pub mod user;

pub use earthquake::{Earthquake, EarthquakeQuery};
pub use error::{CoreError, Result};
pub use gravity::{
    parse_csv, AnomalyResult, ClusteringResult, GravityPoint, GravityRecord, GravityUpdate,
    REQUIRED_COLUMNS,
};
pub use models::{interpolate_gravity, run_anomaly_detection, run_clustering, GravityGrid};
pub use plot::{anomaly_map, bouguer_map, cluster_map, interpolation_map, Figure};
pub use user::{NewUser, OneTimeToken, TokenKind, User, UserProfile};
