//! Gravity pipeline integration tests.

mod common;

use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use common::TestHarness;
use serde_json::json;

use gravmap_core::Earthquake;
use gravmap_store::Store;

const CSV: &str = "latitude,longitude,elevation,gravity\n\
    10.0,20.0,100.0,980000.0\n\
    10.5,20.5,150.0,980010.0\n\
    11.0,21.0,200.0,980020.0\n\
    11.5,21.5,250.0,980030.0\n\
    12.0,20.2,300.0,980040.0\n\
    10.2,21.8,350.0,980050.0\n";

async fn harness_with_data() -> (TestHarness, String) {
    let harness = TestHarness::new();
    let token = harness.signup_and_login("geo@example.com", "s3cret-pw").await;

    harness
        .server
        .post("/gravity/upload-data")
        .add_header("authorization", TestHarness::bearer(&token))
        .text(CSV)
        .await
        .assert_status_ok();

    (harness, token)
}

// ============================================================================
// Upload, retrieve, clear
// ============================================================================

#[tokio::test]
async fn gravity_endpoints_require_auth() {
    let harness = TestHarness::new();
    harness
        .server
        .post("/gravity/upload-data")
        .text(CSV)
        .await
        .assert_status_unauthorized();
    harness.server.get("/gravity/data").await.assert_status_unauthorized();
}

#[tokio::test]
async fn upload_reports_the_inserted_row_count() {
    let (harness, token) = harness_with_data().await;

    let response = harness
        .server
        .get("/gravity/data")
        .add_header("authorization", TestHarness::bearer(&token))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 6);
    assert_eq!(body[0]["latitude"], 10.0);
    assert!(body[0]["bouguer"].is_null());
}

#[tokio::test]
async fn upload_accepts_case_insensitive_headers_in_any_order() {
    let harness = TestHarness::new();
    let token = harness.signup_and_login("geo@example.com", "s3cret-pw").await;

    let response = harness
        .server
        .post("/gravity/upload-data")
        .add_header("authorization", TestHarness::bearer(&token))
        .text("Gravity,ELEVATION,Longitude,Latitude\n980000.0,100.0,20.0,10.0\n")
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["row_count"], 1);
}

#[tokio::test]
async fn upload_replaces_prior_data_entirely() {
    let (harness, token) = harness_with_data().await;

    harness
        .server
        .post("/gravity/upload-data")
        .add_header("authorization", TestHarness::bearer(&token))
        .text("latitude,longitude,elevation,gravity\n0.0,0.0,0.0,979000.0\n")
        .await
        .assert_status_ok();

    let body: serde_json::Value = harness
        .server
        .get("/gravity/data")
        .add_header("authorization", TestHarness::bearer(&token))
        .await
        .json();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["gravity"], 979_000.0);
}

#[tokio::test]
async fn upload_missing_a_required_column_leaves_prior_data_untouched() {
    let (harness, token) = harness_with_data().await;

    harness
        .server
        .post("/gravity/upload-data")
        .add_header("authorization", TestHarness::bearer(&token))
        .text("latitude,longitude,elevation\n1.0,2.0,3.0\n")
        .await
        .assert_status_bad_request();

    let body: serde_json::Value = harness
        .server
        .get("/gravity/data")
        .add_header("authorization", TestHarness::bearer(&token))
        .await
        .json();
    assert_eq!(body.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn retrieval_with_no_data_loaded_is_a_bad_request() {
    let harness = TestHarness::new();
    let token = harness.signup_and_login("geo@example.com", "s3cret-pw").await;

    harness
        .server
        .get("/gravity/data")
        .add_header("authorization", TestHarness::bearer(&token))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn clear_empties_the_dataset() {
    let (harness, token) = harness_with_data().await;

    harness
        .server
        .post("/gravity/clear-data")
        .add_header("authorization", TestHarness::bearer(&token))
        .await
        .assert_status_ok();

    harness
        .server
        .get("/gravity/data")
        .add_header("authorization", TestHarness::bearer(&token))
        .await
        .assert_status_bad_request();
}

// ============================================================================
// Derivations
// ============================================================================

#[tokio::test]
async fn bouguer_derivation_matches_the_reference_formula() {
    let (harness, token) = harness_with_data().await;

    let response = harness
        .server
        .get("/gravity/bouguer-anomaly")
        .add_header("authorization", TestHarness::bearer(&token))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    // gravity=980000, elevation=100: 980000 - 30.86 + 0.0419*2.67*100
    let expected = 980_000.0 - 30.86 + 0.0419 * 2.67 * 100.0;
    let got = body[0]["bouguer"].as_f64().unwrap();
    assert!((got - expected).abs() < 1e-6, "got {got}");
}

#[tokio::test]
async fn distance_derivation_uses_haversine_with_r_6371() {
    let harness = TestHarness::new();
    let token = harness.signup_and_login("geo@example.com", "s3cret-pw").await;
    harness
        .server
        .post("/gravity/upload-data")
        .add_header("authorization", TestHarness::bearer(&token))
        .text("latitude,longitude,elevation,gravity\n0.0,1.0,0.0,980000.0\n")
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get("/gravity/distance-from-point?ref_lat=0.0&ref_lon=0.0")
        .add_header("authorization", TestHarness::bearer(&token))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let got = body[0]["distance_km"].as_f64().unwrap();
    assert!((got - 111.19).abs() < 0.1, "got {got}");
}

#[tokio::test]
async fn derivations_do_not_clobber_each_other() {
    let (harness, token) = harness_with_data().await;

    harness
        .server
        .get("/gravity/bouguer-anomaly")
        .add_header("authorization", TestHarness::bearer(&token))
        .await
        .assert_status_ok();
    harness
        .server
        .get("/gravity/kmeans-clusters?n_clusters=2")
        .add_header("authorization", TestHarness::bearer(&token))
        .await
        .assert_status_ok();

    let body: serde_json::Value = harness
        .server
        .get("/gravity/data")
        .add_header("authorization", TestHarness::bearer(&token))
        .await
        .json();
    for row in body.as_array().unwrap() {
        assert!(row["bouguer"].as_f64().is_some());
        assert!(row["cluster"].as_i64().is_some());
    }
}

#[tokio::test]
async fn clustering_with_zero_clusters_is_rejected() {
    let (harness, token) = harness_with_data().await;

    harness
        .server
        .get("/gravity/kmeans-clusters?n_clusters=0")
        .add_header("authorization", TestHarness::bearer(&token))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn clustering_labels_are_in_range_and_reproducible() {
    let (harness, token) = harness_with_data().await;

    let first: serde_json::Value = harness
        .server
        .get("/gravity/kmeans-clusters?n_clusters=3")
        .add_header("authorization", TestHarness::bearer(&token))
        .await
        .json();
    let second: serde_json::Value = harness
        .server
        .get("/gravity/kmeans-clusters?n_clusters=3")
        .add_header("authorization", TestHarness::bearer(&token))
        .await
        .json();

    assert_eq!(first, second);
    for row in first.as_array().unwrap() {
        let label = row["cluster"].as_i64().unwrap();
        assert!((0..3).contains(&label));
    }
}

#[tokio::test]
async fn anomaly_detection_validates_the_contamination_range() {
    let (harness, token) = harness_with_data().await;

    for contamination in ["0.0", "0.5"] {
        harness
            .server
            .get(&format!(
                "/gravity/anomaly-detection?contamination={contamination}"
            ))
            .add_header("authorization", TestHarness::bearer(&token))
            .await
            .assert_status_bad_request();
    }
}

#[tokio::test]
async fn anomaly_labels_are_plus_or_minus_one() {
    let (harness, token) = harness_with_data().await;

    let body: serde_json::Value = harness
        .server
        .get("/gravity/anomaly-detection?contamination=0.05")
        .add_header("authorization", TestHarness::bearer(&token))
        .await
        .json();

    for row in body.as_array().unwrap() {
        let label = row["anomaly"].as_i64().unwrap();
        assert!(label == -1 || label == 1);
    }
}

// ============================================================================
// Maps
// ============================================================================

#[tokio::test]
async fn maps_require_their_derivation_to_have_run() {
    let (harness, token) = harness_with_data().await;

    for path in [
        "/gravity/plot-map-bouguer",
        "/gravity/plot-map-anomaly",
        "/gravity/plot-map-clusters",
    ] {
        harness
            .server
            .get(path)
            .add_header("authorization", TestHarness::bearer(&token))
            .await
            .assert_status_bad_request();
    }
}

#[tokio::test]
async fn bouguer_map_renders_after_the_derivation() {
    let (harness, token) = harness_with_data().await;

    harness
        .server
        .get("/gravity/bouguer-anomaly")
        .add_header("authorization", TestHarness::bearer(&token))
        .await
        .assert_status_ok();

    let body: serde_json::Value = harness
        .server
        .get("/gravity/plot-map-bouguer")
        .add_header("authorization", TestHarness::bearer(&token))
        .await
        .json();

    assert_eq!(body["data"][0]["type"], "scattermap");
    assert_eq!(body["data"][0]["marker"]["colorscale"], "Viridis");
    assert_eq!(body["layout"]["map"]["style"], "open-street-map");
}

#[tokio::test]
async fn anomaly_map_uses_the_fixed_two_colour_encoding() {
    let (harness, token) = harness_with_data().await;

    harness
        .server
        .get("/gravity/anomaly-detection?contamination=0.2")
        .add_header("authorization", TestHarness::bearer(&token))
        .await
        .assert_status_ok();

    let body: serde_json::Value = harness
        .server
        .get("/gravity/plot-map-anomaly")
        .add_header("authorization", TestHarness::bearer(&token))
        .await
        .json();

    let traces = body["data"].as_array().unwrap();
    assert_eq!(traces.len(), 2);
    assert_eq!(traces[0]["name"], "-1");
    assert_eq!(traces[0]["marker"]["color"], "red");
    assert_eq!(traces[1]["name"], "1");
    assert_eq!(traces[1]["marker"]["color"], "blue");
}

#[tokio::test]
async fn interpolation_returns_a_contour_of_the_requested_resolution() {
    let (harness, token) = harness_with_data().await;

    let body: serde_json::Value = harness
        .server
        .get("/gravity/interpolate-gravity?grid_resolution=25")
        .add_header("authorization", TestHarness::bearer(&token))
        .await
        .json();

    assert_eq!(body["data"][0]["type"], "contour");
    assert_eq!(body["data"][0]["z"].as_array().unwrap().len(), 25);
    assert_eq!(body["layout"]["xaxis_title"], "Longitude");
}

#[tokio::test]
async fn interpolation_with_too_few_points_fails_as_a_model_error() {
    let harness = TestHarness::new();
    let token = harness.signup_and_login("geo@example.com", "s3cret-pw").await;
    harness
        .server
        .post("/gravity/upload-data")
        .add_header("authorization", TestHarness::bearer(&token))
        .text("latitude,longitude,elevation,gravity\n0.0,0.0,0.0,980000.0\n1.0,1.0,0.0,980001.0\n")
        .await
        .assert_status_ok();

    harness
        .server
        .get("/gravity/interpolate-gravity")
        .add_header("authorization", TestHarness::bearer(&token))
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

// ============================================================================
// Earthquakes
// ============================================================================

fn quake(id: &str, year: i32, mag: f64, depth: f64) -> Earthquake {
    Earthquake {
        id: id.to_string(),
        time: Utc.with_ymd_and_hms(year, 6, 15, 12, 0, 0).unwrap(),
        latitude: 35.0,
        longitude: -118.0,
        depth,
        mag,
        magtype: Some("mww".into()),
        net: Some("us".into()),
        place: Some("Southern California".into()),
        status: Some("reviewed".into()),
    }
}

#[tokio::test]
async fn earthquake_queries_filter_by_window_and_magnitude() {
    let harness = TestHarness::new();
    let token = harness.signup_and_login("geo@example.com", "s3cret-pw").await;

    harness
        .store
        .insert_earthquakes(&[
            quake("us1000aaaa", 2023, 4.5, 10.0),
            quake("us1000bbbb", 2024, 6.1, 25.0),
            quake("us1000cccc", 2024, 3.0, 5.0),
        ])
        .await
        .unwrap();

    let response = harness
        .server
        .post("/gravity/earthquakes")
        .add_header("authorization", TestHarness::bearer(&token))
        .json(&json!({
            "start_date": "2024-01-01T00:00:00Z",
            "end_date": "2024-12-31T00:00:00Z",
            "min_mag": 5.0,
        }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], "us1000bbbb");
    assert_eq!(rows[0]["place"], "Southern California");
}
