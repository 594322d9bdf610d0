// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spotify OAuth routes and token status.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::time_utils::now_millis;
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// How long a login `state` stays valid (10 minutes).
pub const STATE_MAX_AGE_MS: i64 = 10 * 60 * 1000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login))
        .route("/callback", get(callback))
        .route("/status", get(status))
        .route("/token", get(get_token).delete(clear_token))
}

// ─── OAuth state ─────────────────────────────────────────────

/// Sign a login `state`: "nonce_hex|issued_at_hex|signature_hex", base64url.
pub fn sign_state(nonce: &[u8], issued_at_ms: i64, key: &[u8]) -> Result<String> {
    let payload = format!("{}|{:x}", hex::encode(nonce), issued_at_ms);

    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Check the signature and age of a `state` returned by the callback.
pub fn verify_state(state: &str, key: &[u8], now_ms: i64) -> bool {
    let Some(decoded) = URL_SAFE_NO_PAD
        .decode(state)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    else {
        return false;
    };

    let parts: Vec<&str> = decoded.splitn(3, '|').collect();
    let [nonce_hex, issued_hex, signature_hex] = parts[..] else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(format!("{}|{}", nonce_hex, issued_hex).as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    if !bool::from(expected.as_bytes().ct_eq(signature_hex.as_bytes())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return false;
    }

    match i64::from_str_radix(issued_hex, 16) {
        Ok(issued_at) => issued_at <= now_ms && now_ms - issued_at <= STATE_MAX_AGE_MS,
        Err(_) => false,
    }
}

/// Start OAuth flow - redirect to the Spotify consent page.
async fn login(State(state): State<Arc<AppState>>) -> Result<Redirect> {
    let mut nonce = [0u8; 16];
    SystemRandom::new()
        .fill(&mut nonce)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Random nonce generation failed")))?;

    let oauth_state = sign_state(&nonce, now_millis(), &state.config.oauth_state_key)?;
    let auth_url = state.spotify.client().authorize_url(&oauth_state);

    tracing::info!(
        client_id = %state.config.spotify_client_id,
        "Starting OAuth flow, redirecting to Spotify"
    );

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code for tokens, then return to the dashboard.
async fn callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect> {
    if let Some(error) = &params.error {
        tracing::warn!(error = %error, "OAuth error from Spotify");
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing Spotify code.".to_string()))?;

    if let Some(oauth_state) = &params.state {
        if !verify_state(oauth_state, &state.config.oauth_state_key, now_millis()) {
            return Err(AppError::BadRequest("Invalid OAuth state.".to_string()));
        }
    }

    tracing::info!("Exchanging authorization code for tokens");
    state.spotify.handle_oauth_callback(&code).await?;

    Ok(Redirect::temporary(&state.config.client_url))
}

/// Authentication status response.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StatusResponse {
    pub authenticated: bool,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub expires_at: Option<i64>,
}

/// Report whether a credential is stored. Never refreshes.
async fn status(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>> {
    let expires_at = state.spotify.token_expiry().await?;
    Ok(Json(StatusResponse {
        authenticated: expires_at.is_some(),
        expires_at,
    }))
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Hand the current access token to the web playback SDK.
async fn get_token(State(state): State<Arc<AppState>>) -> Result<Json<TokenResponse>> {
    let access_token = state
        .spotify
        .ensure_access_token()
        .await?
        .ok_or(AppError::NotAuthenticated)?;

    Ok(Json(TokenResponse { access_token }))
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ClearResponse {
    pub cleared: bool,
}

/// Log out by deleting the stored credential.
async fn clear_token(State(state): State<Arc<AppState>>) -> Json<ClearResponse> {
    Json(ClearResponse {
        cleared: state.spotify.clear_tokens().await,
    })
}
