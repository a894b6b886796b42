//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{earthquakes, gravity, health, users};
use crate::state::AppState;

/// Maximum concurrent requests for the gravity endpoints; derivations and
/// interpolation are CPU-heavy, so they are protected from overload.
const GRAVITY_MAX_CONCURRENT_REQUESTS: usize = 16;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Users
/// - `POST /users/signup` - Register
/// - `POST /users/token` - Login, returns an access token
/// - `POST /users/logout` - Revoke the presented token
/// - `POST /users/password-reset-request` - Issue a reset token
/// - `POST /users/password-reset` - Complete a reset
/// - `POST /users/request-email-verification` - Issue a verification token
/// - `POST /users/verify-email` - Complete verification
/// - `GET|PUT /users/me` - Read/update the current profile
/// - `GET /users/` - List profiles
///
/// ## Gravity (Bearer auth, concurrency-limited)
/// - `POST /gravity/upload-data` - Replace the dataset from CSV bytes
/// - `GET /gravity/data` - Full dataset
/// - `POST /gravity/clear-data` - Delete the dataset
/// - `GET /gravity/bouguer-anomaly` - Derive the Bouguer column
/// - `GET /gravity/kmeans-clusters` - Derive cluster labels
/// - `GET /gravity/anomaly-detection` - Derive anomaly flags
/// - `GET /gravity/distance-from-point` - Derive distances
/// - `GET /gravity/plot-map-{bouguer,anomaly,clusters}` - Map figures
/// - `GET /gravity/interpolate-gravity` - Contour figure
/// - `POST /gravity/earthquakes` - Filtered earthquake records
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let users_routes = Router::new()
        .route("/signup", post(users::signup))
        .route("/token", post(users::login))
        .route("/logout", post(users::logout))
        .route("/password-reset-request", post(users::password_reset_request))
        .route("/password-reset", post(users::password_reset))
        .route(
            "/request-email-verification",
            post(users::request_email_verification),
        )
        .route("/verify-email", post(users::verify_email))
        .route("/me", get(users::me).put(users::update_me))
        .route("/", get(users::list_users));

    let gravity_routes = Router::new()
        .route("/upload-data", post(gravity::upload_data))
        .route("/data", get(gravity::get_data))
        .route("/clear-data", post(gravity::clear_data))
        .route("/bouguer-anomaly", get(gravity::bouguer_anomaly))
        .route("/kmeans-clusters", get(gravity::kmeans_clusters))
        .route("/anomaly-detection", get(gravity::anomaly_detection))
        .route("/distance-from-point", get(gravity::distance_from_point))
        .route("/plot-map-bouguer", get(gravity::plot_map_bouguer))
        .route("/plot-map-anomaly", get(gravity::plot_map_anomaly))
        .route("/plot-map-clusters", get(gravity::plot_map_clusters))
        .route("/interpolate-gravity", get(gravity::interpolate_gravity))
        .route("/earthquakes", post(earthquakes::query_earthquakes))
        .layer(ConcurrencyLimitLayer::new(GRAVITY_MAX_CONCURRENT_REQUESTS));

    Router::new()
        .route("/health", get(health::health))
        // Axum 0.7 serves a nested `/` route at the prefix without a trailing
        // slash (`/users`); register the documented `/users/` path explicitly
        // so list-profiles is reachable there too.
        .route("/users/", get(users::list_users))
        .nest("/users", users_routes)
        .nest("/gravity", gravity_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
