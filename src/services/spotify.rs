// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spotify Web API client and token lifecycle.
//!
//! Handles:
//! - Authorization-code exchange and token refresh
//! - Refresh-on-demand with a one-minute safety margin
//! - Proxying API calls with uniform response decoding

use crate::config::Config;
use crate::db::TokenStore;
use crate::error::AppError;
use crate::models::CredentialRecord;
use crate::time_utils::now_millis;
use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// OAuth scopes requested at login.
pub const SCOPES: &[&str] = &[
    "streaming",
    "user-read-email",
    "user-read-private",
    "user-read-playback-state",
    "user-modify-playback-state",
    "user-read-currently-playing",
    "user-read-recently-played",
    "user-library-read",
    "user-library-modify",
    "playlist-read-private",
];

// ─────────────────────────────────────────────────────────────────────────────
// Upstream responses
// ─────────────────────────────────────────────────────────────────────────────

/// Decoded body of an upstream response.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    /// 204 or an empty body
    Empty,
    Json(Value),
    /// Body that was not valid JSON, passed through as text
    Raw(String),
}

impl UpstreamBody {
    /// Decode a response body, falling back to raw text.
    pub fn decode(text: &str) -> Self {
        if text.is_empty() {
            return Self::Empty;
        }
        match serde_json::from_str(text) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Raw(text.to_string()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// JSON form relayed to clients: `null`, the value, or `{"raw": text}`.
    pub fn into_value(self) -> Value {
        match self {
            Self::Empty => Value::Null,
            Self::Json(value) => value,
            Self::Raw(text) => serde_json::json!({ "raw": text }),
        }
    }
}

impl Serialize for UpstreamBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Empty => serializer.serialize_none(),
            Self::Json(value) => value.serialize(serializer),
            Self::Raw(text) => serde_json::json!({ "raw": text }).serialize(serializer),
        }
    }
}

/// Status and body of a proxied call, relayed to the client as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub data: UpstreamBody,
}

impl UpstreamResponse {
    /// Answer synthesized locally when no credential is stored.
    pub fn not_authenticated() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            data: UpstreamBody::Json(serde_json::json!({
                "error": "not_authenticated",
                "details": "Not authenticated"
            })),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        if self.status == StatusCode::NO_CONTENT {
            return self.status.into_response();
        }
        (self.status, Json(self.data)).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SpotifyClient - raw HTTP calls
// ─────────────────────────────────────────────────────────────────────────────

/// Token endpoint response for both grant types.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Omitted when the refresh token is not rotated
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Spotify API client.
#[derive(Clone)]
pub struct SpotifyClient {
    http: reqwest::Client,
    api_url: String,
    auth_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl SpotifyClient {
    /// Create a new Spotify client with OAuth credentials.
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            api_url: config.spotify_api_url.clone(),
            auth_url: config.spotify_auth_url.clone(),
            token_url: config.spotify_token_url.clone(),
            client_id: config.spotify_client_id.clone(),
            client_secret: config.spotify_client_secret.clone(),
            redirect_uri: config.spotify_redirect_uri.clone(),
        }
    }

    /// Consent page URL for the authorization-code flow.
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?response_type=code&client_id={}&scope={}&redirect_uri={}&state={}",
            self.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&SCOPES.join(" ")),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant, AppError> {
        let (status, body) = self
            .token_request(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .await
            .map_err(|e| AppError::AuthorizationFailed(format!("Token exchange failed: {}", e)))?;

        if !status.is_success() {
            return Err(AppError::AuthorizationFailed(format!(
                "Token exchange failed: HTTP {}: {}",
                status, body
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            AppError::AuthorizationFailed(format!("Failed to parse token response: {}", e))
        })
    }

    /// Refresh an expired access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, AppError> {
        let (status, body) = self
            .token_request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await
            .map_err(|e| AppError::Upstream(format!("Token refresh request failed: {}", e)))?;

        if !status.is_success() {
            return Err(AppError::RefreshFailed {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| AppError::RefreshFailed {
            status: status.as_u16(),
            body: format!("Invalid token response: {}", e),
        })
    }

    /// POST a form to the token endpoint with HTTP Basic client auth.
    async fn token_request(
        &self,
        form: &[(&str, &str)],
    ) -> Result<(StatusCode, String), reqwest::Error> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    /// Issue an API request with a bearer token and decode the answer.
    pub async fn request(
        &self,
        access_token: &str,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<UpstreamResponse, AppError> {
        let url = format!("{}{}", self.api_url, endpoint);

        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(access_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(UpstreamResponse {
                status,
                data: UpstreamBody::Empty,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to read body: {}", e)))?;
        let data = UpstreamBody::decode(&text);

        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                endpoint = %endpoint,
                body = %serde_json::to_string(&data).unwrap_or_default(),
                "Spotify API error"
            );
        }

        Ok(UpstreamResponse { status, data })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SpotifyService - token lifecycle + proxy
// ─────────────────────────────────────────────────────────────────────────────

/// High-level Spotify service that owns the credential lifecycle.
///
/// Every API call obtains its token through `ensure_access_token`; nothing
/// else reads or rewrites the stored access token.
#[derive(Clone)]
pub struct SpotifyService {
    client: SpotifyClient,
    store: TokenStore,
    /// Serializes check-expiry/refresh/persist.
    refresh_lock: Arc<Mutex<()>>,
}

impl SpotifyService {
    pub fn new(config: &Config, http: reqwest::Client, store: TokenStore) -> Self {
        Self {
            client: SpotifyClient::new(config, http),
            store,
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn client(&self) -> &SpotifyClient {
        &self.client
    }

    // ─── Token Management ────────────────────────────────────────────────────

    /// Get a usable access token, refreshing it if it is about to expire.
    ///
    /// Returns `None` when no credential is stored.
    pub async fn ensure_access_token(&self) -> Result<Option<String>, AppError> {
        // Fast path: no lock while the stored token is fresh
        let record = match self.store.load().await? {
            Some(record) => record,
            None => return Ok(None),
        };
        if !record.is_expired_at(now_millis()) {
            return Ok(Some(record.access_token));
        }

        let _guard = self.refresh_lock.lock().await;

        // Re-read: a concurrent caller may have refreshed while we waited
        let record = match self.store.load().await? {
            Some(record) => record,
            None => return Ok(None),
        };
        if !record.is_expired_at(now_millis()) {
            return Ok(Some(record.access_token));
        }

        tracing::info!("Access token expired, refreshing");

        let grant = self.client.refresh_token(&record.refresh_token).await?;
        let refreshed = CredentialRecord::from_grant(
            grant.access_token,
            grant.refresh_token.unwrap_or(record.refresh_token),
            grant.expires_in,
            now_millis(),
        );
        self.store.save(&refreshed).await?;

        tracing::info!(expires_at = refreshed.expires_at, "Token refreshed and stored");
        Ok(Some(refreshed.access_token))
    }

    /// Expiry of the stored credential, without refreshing.
    pub async fn token_expiry(&self) -> Result<Option<i64>, AppError> {
        Ok(self.store.load().await?.map(|record| record.expires_at))
    }

    /// Delete the stored credential. Returns whether one existed.
    pub async fn clear_tokens(&self) -> bool {
        let _guard = self.refresh_lock.lock().await;
        let cleared = self.store.clear().await;
        tracing::info!(cleared, "Stored Spotify token cleared");
        cleared
    }

    // ─── OAuth Callback Handling ─────────────────────────────────────────────

    /// Exchange the authorization code and store the resulting credential.
    pub async fn handle_oauth_callback(&self, code: &str) -> Result<(), AppError> {
        let grant = self.client.exchange_code(code).await?;
        let refresh_token = grant.refresh_token.ok_or_else(|| {
            AppError::AuthorizationFailed("Token response without refresh_token".to_string())
        })?;

        let record = CredentialRecord::from_grant(
            grant.access_token,
            refresh_token,
            grant.expires_in,
            now_millis(),
        );

        let _guard = self.refresh_lock.lock().await;
        self.store.save(&record).await?;

        tracing::info!(expires_at = record.expires_at, "Spotify token stored");
        Ok(())
    }

    // ─── API Proxy ───────────────────────────────────────────────────────────

    /// Call the Spotify API with the current token.
    ///
    /// Without a stored credential a 401 is synthesized locally.
    pub async fn call(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<UpstreamResponse, AppError> {
        let Some(access_token) = self.ensure_access_token().await? else {
            return Ok(UpstreamResponse::not_authenticated());
        };

        self.client
            .request(&access_token, method, endpoint, body.as_ref())
            .await
    }

    pub async fn get(&self, endpoint: &str) -> Result<UpstreamResponse, AppError> {
        self.call(Method::GET, endpoint, None).await
    }
}
