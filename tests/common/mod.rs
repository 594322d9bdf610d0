// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{Request, Response};
use music_dashboard::config::{Config, WeatherLocation};
use music_dashboard::models::CredentialRecord;
use music_dashboard::routes::create_router;
use music_dashboard::time_utils::now_millis;
use music_dashboard::AppState;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::MockServer;

/// Router, state and upstream stub for one test.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub server: MockServer,
    /// Holds the token file; dropped with the app.
    pub dir: TempDir,
}

#[allow(dead_code)]
impl TestApp {
    /// Send one request through a clone of the router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Store a credential record directly.
    pub async fn seed_token(&self, record: &CredentialRecord) {
        music_dashboard::db::TokenStore::new(&self.state.config.token_path)
            .save(record)
            .await
            .unwrap();
    }

    pub async fn stored_token(&self) -> Option<CredentialRecord> {
        music_dashboard::db::TokenStore::new(&self.state.config.token_path)
            .load()
            .await
            .unwrap()
    }
}

/// Config with every upstream pointed at the mock server.
#[allow(dead_code)]
pub fn test_config(server: &MockServer, dir: &TempDir) -> Config {
    let uri = server.uri();
    Config {
        token_path: dir.path().join("token.json"),
        spotify_api_url: format!("{}/v1", uri),
        spotify_auth_url: format!("{}/authorize", uri),
        spotify_token_url: format!("{}/api/token", uri),
        geocoding_api_url: format!("{}/geo", uri),
        forecast_api_url: format!("{}/wx", uri),
        location: WeatherLocation::Coordinates {
            latitude: 43.65,
            longitude: -79.38,
        },
        ..Config::test_default()
    }
}

/// Create a test app backed by a fresh mock server and token directory.
#[allow(dead_code)]
pub async fn spawn_test_app() -> TestApp {
    spawn_test_app_with(|config| config).await
}

/// Same as `spawn_test_app`, with a config tweak.
#[allow(dead_code)]
pub async fn spawn_test_app_with(tweak: impl FnOnce(Config) -> Config) -> TestApp {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = tweak(test_config(&server, &dir));

    let state = Arc::new(AppState::new(config));
    TestApp {
        router: create_router(state.clone()),
        state,
        server,
        dir,
    }
}

/// A record whose access token stays valid for an hour.
#[allow(dead_code)]
pub fn fresh_record() -> CredentialRecord {
    CredentialRecord {
        access_token: "fresh-access".to_string(),
        refresh_token: "stored-refresh".to_string(),
        expires_at: now_millis() + 3_600_000,
    }
}

/// A record that expired a minute ago.
#[allow(dead_code)]
pub fn expired_record() -> CredentialRecord {
    CredentialRecord {
        access_token: "stale-access".to_string(),
        refresh_token: "stored-refresh".to_string(),
        expires_at: now_millis() - 60_000,
    }
}

/// Expected HTTP Basic header for the test client credentials.
#[allow(dead_code)]
pub fn basic_auth_header() -> String {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    format!("Basic {}", STANDARD.encode("test_client_id:test_secret"))
}

#[allow(dead_code)]
pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Request with a JSON body.
#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Read a response body as JSON (`Null` when empty).
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}
