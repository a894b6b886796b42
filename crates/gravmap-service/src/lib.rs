//! Gravmap HTTP API service.
//!
//! This crate provides the HTTP surface for the gravmap platform:
//!
//! - Gravity dataset upload, derivation and map endpoints
//! - Earthquake catalogue queries
//! - User accounts: signup, login/logout, password reset, email
//!   verification, profile management
//!
//! # Authentication
//!
//! Protected endpoints carry a `Bearer` access token issued at login. The
//! token is an HMAC-signed JWT whose subject is the user's email; explicit
//! logout places the token on a process-wide revocation list honoured until
//! the token's natural expiry.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers must be async for routing
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod pipeline;
pub mod routes;
pub mod state;

pub use config::{ConfigError, ServiceConfig};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
