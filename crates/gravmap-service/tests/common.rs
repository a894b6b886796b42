//! Common test utilities for gravmap integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use jsonwebtoken::Algorithm;
use serde_json::json;

use gravmap_service::{create_router, AppState, ServiceConfig};
use gravmap_store::{MemStore, Store};

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct handle on the in-memory store, for seeding and inspection.
    pub store: Arc<MemStore>,
}

impl TestHarness {
    /// Create a new test harness with a fresh in-memory store.
    pub fn new() -> Self {
        let store = Arc::new(MemStore::new());

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            database_url: None,
            jwt_secret: "test-secret".into(),
            jwt_algorithm: Algorithm::HS256,
            access_token_ttl_minutes: 30,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        };

        let state = AppState::new(store.clone() as Arc<dyn Store>, config);
        let router: Router = create_router(state);
        let server = TestServer::new(router).expect("Failed to create test server");

        Self { server, store }
    }

    /// Register a user and log in, returning the access token.
    pub async fn signup_and_login(&self, email: &str, password: &str) -> String {
        self.server
            .post("/users/signup")
            .json(&json!({
                "first_name": "Test",
                "last_name": "User",
                "email": email,
                "password": password,
            }))
            .await
            .assert_status_ok();

        self.login(email, password).await
    }

    /// Log in with existing credentials, returning the access token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .server
            .post("/users/token")
            .json(&json!({ "email": email, "password": password }))
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        body["access_token"]
            .as_str()
            .expect("login response carries an access token")
            .to_string()
    }

    /// Authorization header value for a token.
    pub fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
