// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Playback state and control routes (pass-through to the Spotify player API).

use crate::error::Result;
use crate::models::DeviceList;
use crate::routes::parse_body;
use crate::services::{transfer_playback, wake_device, UpstreamResponse};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/now-playing", get(now_playing))
        .route("/player", get(player))
        .route("/queue", get(queue))
        .route("/recently-played", get(recently_played))
        .route("/devices", get(devices))
        .route("/transfer", put(transfer))
        .route("/play", put(play))
        .route("/pause", put(pause))
        .route("/wake", put(wake))
        .route("/next", post(next))
        .route("/previous", post(previous))
        .route("/seek", put(seek))
        .route("/shuffle", put(shuffle))
        .route("/repeat", put(repeat))
        .route("/volume", put(volume))
}

/// Append `device_id` to an endpoint when the client named a device.
fn with_device(endpoint: &str, device_id: Option<&str>) -> String {
    match device_id.filter(|id| !id.is_empty()) {
        Some(id) => {
            let sep = if endpoint.contains('?') { '&' } else { '?' };
            format!("{}{}device_id={}", endpoint, sep, urlencoding::encode(id))
        }
        None => endpoint.to_string(),
    }
}

// ─── Request bodies ──────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DeviceBody {
    device_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TransferBody {
    device_id: Option<String>,
    device_name: Option<String>,
}

/// Numeric body field that some clients send as a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

/// Accept `1500`, `"1500"` or `null`; a blank string counts as absent.
fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(NumberOrString::Text(text)) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("not a number: {:?}", text))),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SeekBody {
    #[serde(deserialize_with = "lenient_number")]
    position_ms: Option<f64>,
    device_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ShuffleBody {
    state: Option<bool>,
    device_id: Option<String>,
}

/// Spotify repeat modes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RepeatMode {
    Track,
    Context,
    #[default]
    Off,
}

impl RepeatMode {
    fn as_str(self) -> &'static str {
        match self {
            RepeatMode::Track => "track",
            RepeatMode::Context => "context",
            RepeatMode::Off => "off",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RepeatBody {
    state: Option<RepeatMode>,
    device_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VolumeBody {
    #[serde(deserialize_with = "lenient_number")]
    volume: Option<f64>,
    device_id: Option<String>,
}

// ─── Playback state ──────────────────────────────────────────

/// Currently playing track; nothing playing is reported as `is_playing: false`.
async fn now_playing(State(state): State<Arc<AppState>>) -> Result<Response> {
    let response = state.spotify.get("/me/player/currently-playing").await?;
    if response.status == StatusCode::NO_CONTENT {
        return Ok(Json(serde_json::json!({ "is_playing": false })).into_response());
    }
    Ok(response.into_response())
}

async fn player(State(state): State<Arc<AppState>>) -> Result<UpstreamResponse> {
    state.spotify.get("/me/player").await
}

async fn queue(State(state): State<Arc<AppState>>) -> Result<UpstreamResponse> {
    state.spotify.get("/me/player/queue").await
}

async fn recently_played(State(state): State<Arc<AppState>>) -> Result<UpstreamResponse> {
    state.spotify.get("/me/player/recently-played?limit=1").await
}

async fn devices(State(state): State<Arc<AppState>>) -> Result<UpstreamResponse> {
    let response = state.spotify.get("/me/player/devices").await?;

    if response.status == StatusCode::OK {
        if let Some(value) = response.data.as_json() {
            let list = DeviceList::from_value(value);
            let summary: Vec<_> = list
                .devices
                .iter()
                .map(|d| (d.id.as_deref().unwrap_or("-"), d.name.as_str(), d.is_active))
                .collect();
            tracing::debug!(devices = ?summary, "Devices");
        }
    }

    Ok(response)
}

// ─── Device targeting ────────────────────────────────────────

/// Move playback to a device chosen by id, name, or current activity.
async fn transfer(State(state): State<Arc<AppState>>, body: Bytes) -> Result<UpstreamResponse> {
    let body: TransferBody = parse_body(&body)?;
    let name = body
        .device_name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| state.config.spotify_device_name.clone());

    transfer_playback(&state.spotify, body.device_id.as_deref(), Some(name.as_str())).await
}

/// Transfer to a specific device, then start playback on it.
async fn wake(State(state): State<Arc<AppState>>, body: Bytes) -> Result<UpstreamResponse> {
    let body: DeviceBody = parse_body(&body)?;
    wake_device(&state.spotify, body.device_id.as_deref().unwrap_or_default()).await
}

// ─── Transport controls ──────────────────────────────────────

async fn play(State(state): State<Arc<AppState>>, body: Bytes) -> Result<UpstreamResponse> {
    let body: DeviceBody = parse_body(&body)?;
    let endpoint = with_device("/me/player/play", body.device_id.as_deref());
    state.spotify.call(Method::PUT, &endpoint, None).await
}

async fn pause(State(state): State<Arc<AppState>>, body: Bytes) -> Result<UpstreamResponse> {
    let body: DeviceBody = parse_body(&body)?;
    let endpoint = with_device("/me/player/pause", body.device_id.as_deref());
    state.spotify.call(Method::PUT, &endpoint, None).await
}

async fn next(State(state): State<Arc<AppState>>, body: Bytes) -> Result<UpstreamResponse> {
    let body: DeviceBody = parse_body(&body)?;
    let endpoint = with_device("/me/player/next", body.device_id.as_deref());
    state.spotify.call(Method::POST, &endpoint, None).await
}

async fn previous(State(state): State<Arc<AppState>>, body: Bytes) -> Result<UpstreamResponse> {
    let body: DeviceBody = parse_body(&body)?;
    let endpoint = with_device("/me/player/previous", body.device_id.as_deref());
    state.spotify.call(Method::POST, &endpoint, None).await
}

/// Seek within the current track; negative positions clamp to 0.
async fn seek(State(state): State<Arc<AppState>>, body: Bytes) -> Result<UpstreamResponse> {
    let body: SeekBody = parse_body(&body)?;
    let position = body.position_ms.unwrap_or(0.0).max(0.0) as u64;
    let endpoint = with_device(
        &format!("/me/player/seek?position_ms={}", position),
        body.device_id.as_deref(),
    );
    state.spotify.call(Method::PUT, &endpoint, None).await
}

async fn shuffle(State(state): State<Arc<AppState>>, body: Bytes) -> Result<UpstreamResponse> {
    let body: ShuffleBody = parse_body(&body)?;
    let endpoint = with_device(
        &format!("/me/player/shuffle?state={}", body.state.unwrap_or(false)),
        body.device_id.as_deref(),
    );
    state.spotify.call(Method::PUT, &endpoint, None).await
}

async fn repeat(State(state): State<Arc<AppState>>, body: Bytes) -> Result<UpstreamResponse> {
    let body: RepeatBody = parse_body(&body)?;
    let mode = body.state.unwrap_or_default();
    let endpoint = with_device(
        &format!("/me/player/repeat?state={}", mode.as_str()),
        body.device_id.as_deref(),
    );
    state.spotify.call(Method::PUT, &endpoint, None).await
}

/// Set volume, clamped to 0..=100 (default 50).
async fn volume(State(state): State<Arc<AppState>>, body: Bytes) -> Result<UpstreamResponse> {
    let body: VolumeBody = parse_body(&body)?;
    let percent = body.volume.unwrap_or(50.0).clamp(0.0, 100.0).round() as u8;
    let endpoint = with_device(
        &format!("/me/player/volume?volume_percent={}", percent),
        body.device_id.as_deref(),
    );
    state.spotify.call(Method::PUT, &endpoint, None).await
}
