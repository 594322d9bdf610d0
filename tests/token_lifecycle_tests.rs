// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token lifecycle tests: expiry margin, refresh, rotation and locking.

use music_dashboard::error::AppError;
use music_dashboard::models::CredentialRecord;
use music_dashboard::time_utils::now_millis;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

mod common;

fn refresh_mock() -> wiremock::MockBuilder {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(header("authorization", common::basic_auth_header().as_str()))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=stored-refresh"))
}

#[tokio::test]
async fn test_no_record_returns_none_without_network() {
    let app = common::spawn_test_app().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.server)
        .await;

    let token = app.state.spotify.ensure_access_token().await.unwrap();
    assert_eq!(token, None);
}

#[tokio::test]
async fn test_fresh_token_is_served_from_store() {
    let app = common::spawn_test_app().await;
    app.seed_token(&CredentialRecord {
        expires_at: now_millis() + 120_000,
        ..common::fresh_record()
    })
    .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.server)
        .await;

    let token = app.state.spotify.ensure_access_token().await.unwrap();
    assert_eq!(token.as_deref(), Some("fresh-access"));
}

#[tokio::test]
async fn test_token_inside_margin_is_refreshed_once() {
    let app = common::spawn_test_app().await;
    // Still technically valid, but within the one-minute margin
    app.seed_token(&CredentialRecord {
        expires_at: now_millis() + 60_000,
        ..common::fresh_record()
    })
    .await;

    refresh_mock()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new-access",
            "refresh_token": "rotated-refresh",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let before = now_millis();
    let token = app.state.spotify.ensure_access_token().await.unwrap();
    assert_eq!(token.as_deref(), Some("new-access"));

    let stored = app.stored_token().await.unwrap();
    assert_eq!(stored.access_token, "new-access");
    assert_eq!(stored.refresh_token, "rotated-refresh");
    assert!(stored.expires_at >= before + 3_600_000);

    app.server.verify().await;
}

#[tokio::test]
async fn test_refresh_without_rotation_keeps_refresh_token() {
    let app = common::spawn_test_app().await;
    app.seed_token(&common::expired_record()).await;

    refresh_mock()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new-access",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let token = app.state.spotify.ensure_access_token().await.unwrap();
    assert_eq!(token.as_deref(), Some("new-access"));

    let stored = app.stored_token().await.unwrap();
    assert_eq!(stored.refresh_token, "stored-refresh");

    // The refreshed token is now used without another refresh
    let again = app.state.spotify.ensure_access_token().await.unwrap();
    assert_eq!(again.as_deref(), Some("new-access"));
    app.server.verify().await;
}

#[tokio::test]
async fn test_refresh_failure_leaves_record_untouched() {
    let app = common::spawn_test_app().await;
    let original = common::expired_record();
    app.seed_token(&original).await;

    refresh_mock()
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string(r#"{"error":"invalid_grant","error_description":"Refresh token revoked"}"#),
        )
        .expect(1)
        .mount(&app.server)
        .await;

    let result = app.state.spotify.ensure_access_token().await;
    match result {
        Err(AppError::RefreshFailed { status, body }) => {
            assert_eq!(status, 400);
            assert!(body.contains("invalid_grant"));
        }
        other => panic!("expected RefreshFailed, got {:?}", other),
    }

    assert_eq!(app.stored_token().await, Some(original));
}

#[tokio::test]
async fn test_concurrent_expiry_collapses_to_one_refresh() {
    let app = common::spawn_test_app().await;
    app.seed_token(&common::expired_record()).await;

    refresh_mock()
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "access_token": "new-access",
                    "refresh_token": "rotated-refresh",
                    "expires_in": 3600
                }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&app.server)
        .await;

    let spotify = &app.state.spotify;
    let (first, second) = tokio::join!(spotify.ensure_access_token(), spotify.ensure_access_token());

    assert_eq!(first.unwrap().as_deref(), Some("new-access"));
    assert_eq!(second.unwrap().as_deref(), Some("new-access"));
    assert_eq!(
        app.stored_token().await.unwrap().refresh_token,
        "rotated-refresh"
    );
    app.server.verify().await;
}

#[tokio::test]
async fn test_proxy_call_uses_refreshed_token() {
    let app = common::spawn_test_app().await;
    app.seed_token(&common::expired_record()).await;

    refresh_mock()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new-access",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/me/player"))
        .and(header("authorization", "Bearer new-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"is_playing": true})))
        .expect(1)
        .mount(&app.server)
        .await;

    let response = app.state.spotify.get("/me/player").await.unwrap();
    assert!(response.is_success());
    assert_eq!(response.data.as_json(), Some(&json!({"is_playing": true})));
}

#[tokio::test]
async fn test_corrupt_expiry_is_refreshed() {
    let app = common::spawn_test_app().await;
    app.seed_token(&CredentialRecord {
        expires_at: i64::MIN,
        ..common::fresh_record()
    })
    .await;

    refresh_mock()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new-access",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let token = app.state.spotify.ensure_access_token().await.unwrap();
    assert_eq!(token.as_deref(), Some("new-access"));
}

#[tokio::test]
async fn test_far_future_expiry_is_not_refreshed() {
    let app = common::spawn_test_app().await;
    app.seed_token(&CredentialRecord {
        expires_at: i64::MAX,
        ..common::fresh_record()
    })
    .await;

    refresh_mock()
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.server)
        .await;

    let token = app.state.spotify.ensure_access_token().await.unwrap();
    assert_eq!(token.as_deref(), Some("fresh-access"));
}
