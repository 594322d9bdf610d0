// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Artist lookup and saved-tracks ("liked songs") routes.

use crate::error::{AppError, Result};
use crate::routes::parse_body;
use crate::services::UpstreamResponse;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::Method,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/artist/{id}", get(get_artist))
        .route("/me/tracks/contains", get(tracks_contain))
        .route("/me/tracks", axum::routing::put(save_tracks).delete(remove_tracks))
}

/// Comma-separated Spotify track ids, from a query string or a JSON body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TrackIds {
    ids: Option<String>,
}

impl TrackIds {
    fn require(self) -> Result<String> {
        self.ids
            .filter(|ids| !ids.is_empty())
            .ok_or_else(|| AppError::BadRequest("ids required".to_string()))
    }
}

async fn get_artist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<UpstreamResponse> {
    let endpoint = format!("/artists/{}", urlencoding::encode(&id));
    state.spotify.get(&endpoint).await
}

/// Whether each of the given tracks is in the user's library.
async fn tracks_contain(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrackIds>,
) -> Result<UpstreamResponse> {
    let ids = params.require()?;
    let endpoint = format!("/me/tracks/contains?ids={}", urlencoding::encode(&ids));
    state.spotify.get(&endpoint).await
}

async fn save_tracks(State(state): State<Arc<AppState>>, body: Bytes) -> Result<UpstreamResponse> {
    let ids = parse_body::<TrackIds>(&body)?.require()?;
    let endpoint = format!("/me/tracks?ids={}", urlencoding::encode(&ids));
    state.spotify.call(Method::PUT, &endpoint, None).await
}

async fn remove_tracks(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<UpstreamResponse> {
    let ids = parse_body::<TrackIds>(&body)?.require()?;
    let endpoint = format!("/me/tracks?ids={}", urlencoding::encode(&ids));
    state.spotify.call(Method::DELETE, &endpoint, None).await
}
