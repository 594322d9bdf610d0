// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Music Dashboard API Server
//!
//! Serves now-playing, playback control and weather data to the kiosk
//! front-end, authenticating once against Spotify via OAuth.

use music_dashboard::{config::Config, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");

    // Initialize structured JSON logging
    init_logging(config.logs_enabled);
    tracing::info!(port = config.port, "Starting Music Dashboard API");

    match &config.location {
        music_dashboard::config::WeatherLocation::Coordinates {
            latitude,
            longitude,
        } => tracing::info!(latitude, longitude, "Weather location from coordinates"),
        music_dashboard::config::WeatherLocation::PostalCode {
            postal_code,
            country,
        } => tracing::info!(
            postal_code = %postal_code,
            country = %country,
            "Weather location from postal code"
        ),
    }

    let state = Arc::new(AppState::new(config.clone()));
    tracing::info!(path = %config.token_path.display(), "Token store initialized");

    // Build router
    let app = music_dashboard::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
///
/// With logging disabled the default filter is `off`; `RUST_LOG` still wins.
fn init_logging(enabled: bool) {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else if enabled {
        tracing_subscriber::EnvFilter::new("music_dashboard=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("off")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
