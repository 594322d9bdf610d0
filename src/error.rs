// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
///
/// Non-2xx answers from the Spotify API are not errors here; they are
/// relayed as data (see `services::spotify::UpstreamResponse`).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Token refresh failed: HTTP {status}: {body}")]
    RefreshFailed { status: u16, body: String },

    #[error("Spotify authorization failed: {0}")]
    AuthorizationFailed(String),

    #[error("No device available to transfer.")]
    NoDeviceAvailable,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Location not found")]
    LocationNotFound,

    #[error("Weather lookup failed: {0}")]
    WeatherLookup(String),

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Token store error: {0}")]
    TokenStore(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    /// Status code and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotAuthenticated => (StatusCode::UNAUTHORIZED, "not_authenticated"),
            AppError::RefreshFailed { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "refresh_failed")
            }
            AppError::AuthorizationFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "authorization_failed")
            }
            AppError::NoDeviceAvailable => (StatusCode::NOT_FOUND, "no_device"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::LocationNotFound => (StatusCode::NOT_FOUND, "not_found"),
            AppError::WeatherLookup(_) => (StatusCode::INTERNAL_SERVER_ERROR, "weather_error"),
            AppError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            AppError::TokenStore(_) => (StatusCode::INTERNAL_SERVER_ERROR, "token_store_error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_code();

        // Server-side failures are logged; their internals stay out of the body
        let details = match &self {
            AppError::NotAuthenticated => Some("Not authenticated".to_string()),
            AppError::NoDeviceAvailable | AppError::LocationNotFound => Some(self.to_string()),
            AppError::BadRequest(msg) => Some(msg.clone()),
            AppError::Upstream(msg) => {
                tracing::warn!(error = %msg, "Upstream transport error");
                Some(msg.clone())
            }
            AppError::RefreshFailed { status, body } => {
                tracing::error!(status, body = %body, "Spotify token refresh failed");
                None
            }
            AppError::AuthorizationFailed(msg) => {
                tracing::error!(error = %msg, "Spotify authorization failed");
                Some("Spotify authentication failed.".to_string())
            }
            AppError::WeatherLookup(msg) => {
                tracing::error!(error = %msg, "Weather lookup failed");
                Some("Weather lookup failed.".to_string())
            }
            AppError::TokenStore(msg) => {
                tracing::error!(error = %msg, "Token store error");
                None
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                None
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
