// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weather route for the idle screen.

use crate::error::Result;
use crate::models::WeatherPayload;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/weather", get(get_weather))
}

/// Current conditions (cached for 30 minutes).
async fn get_weather(State(state): State<Arc<AppState>>) -> Result<Json<WeatherPayload>> {
    Ok(Json(state.weather.get_weather().await?))
}
