// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local setups.

use ring::rand::{SecureRandom, SystemRandom};
use std::env;
use std::path::PathBuf;

const DEFAULT_SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_GEOCODING_API_URL: &str = "https://geocoding-api.open-meteo.com/v1";
const DEFAULT_FORECAST_API_URL: &str = "https://api.open-meteo.com/v1";

/// Where the weather lookup should be centered.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherLocation {
    /// Explicit coordinates, no geocoding needed.
    Coordinates { latitude: f64, longitude: f64 },
    /// Postal code resolved through the geocoding service.
    PostalCode { postal_code: String, country: String },
}

impl WeatherLocation {
    /// Prefer coordinates when both parse as finite numbers.
    pub fn from_parts(
        latitude: Option<&str>,
        longitude: Option<&str>,
        postal_code: String,
        country: String,
    ) -> Self {
        let parse = |v: Option<&str>| {
            v.and_then(|s| s.trim().parse::<f64>().ok())
                .filter(|f| f.is_finite())
        };

        match (parse(latitude), parse(longitude)) {
            (Some(latitude), Some(longitude)) => Self::Coordinates {
                latitude,
                longitude,
            },
            _ => Self::PostalCode {
                postal_code,
                country,
            },
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Spotify OAuth ---
    /// Spotify OAuth client ID
    pub spotify_client_id: String,
    /// Spotify OAuth client secret
    pub spotify_client_secret: String,
    /// Redirect URI registered with Spotify (points at `/callback`)
    pub spotify_redirect_uri: String,
    /// Preferred playback device name for transfers (may be empty)
    pub spotify_device_name: String,

    // --- Server ---
    /// Front-end URL for CORS and post-login redirects
    pub client_url: String,
    /// Server port
    pub port: u16,
    /// Whether service logging is enabled
    pub logs_enabled: bool,
    /// File holding the stored credential record
    pub token_path: PathBuf,
    /// HMAC key for signing the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,

    // --- Weather ---
    pub location: WeatherLocation,
    /// Display label for the weather location
    pub location_label: Option<String>,

    // --- Upstream endpoints ---
    pub spotify_api_url: String,
    pub spotify_auth_url: String,
    pub spotify_token_url: String,
    pub geocoding_api_url: String,
    pub forecast_api_url: String,
}

impl Config {
    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        Self {
            spotify_client_id: "test_client_id".to_string(),
            spotify_client_secret: "test_secret".to_string(),
            spotify_redirect_uri: "http://127.0.0.1:3001/callback".to_string(),
            spotify_device_name: String::new(),
            client_url: "http://localhost:5173".to_string(),
            port: 3001,
            logs_enabled: true,
            token_path: PathBuf::from("token.json"),
            oauth_state_key: b"test_state_key_32_bytes_minimum!".to_vec(),
            location: WeatherLocation::Coordinates {
                latitude: 43.65,
                longitude: -79.38,
            },
            location_label: Some("Toronto".to_string()),
            spotify_api_url: DEFAULT_SPOTIFY_API_URL.to_string(),
            spotify_auth_url: DEFAULT_SPOTIFY_AUTH_URL.to_string(),
            spotify_token_url: DEFAULT_SPOTIFY_TOKEN_URL.to_string(),
            geocoding_api_url: DEFAULT_GEOCODING_API_URL.to_string(),
            forecast_api_url: DEFAULT_FORECAST_API_URL.to_string(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let optional = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());
        let or_default = |name: &str, default: &str| {
            optional(name)
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| default.to_string())
        };

        let oauth_state_key = match optional("OAUTH_STATE_KEY") {
            Some(key) => key.into_bytes(),
            None => random_key()?,
        };

        let location = WeatherLocation::from_parts(
            optional("OPEN_METEO_LAT").as_deref(),
            optional("OPEN_METEO_LON").as_deref(),
            env::var("OPEN_METEO_POSTAL_CODE").unwrap_or_default(),
            optional("OPEN_METEO_COUNTRY").unwrap_or_else(|| "CA".to_string()),
        );

        Ok(Self {
            spotify_client_id: env::var("SPOTIFY_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("SPOTIFY_CLIENT_ID"))?,
            spotify_client_secret: env::var("SPOTIFY_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("SPOTIFY_CLIENT_SECRET"))?,
            spotify_redirect_uri: env::var("SPOTIFY_REDIRECT_URI")
                .map_err(|_| ConfigError::Missing("SPOTIFY_REDIRECT_URI"))?,
            spotify_device_name: env::var("SPOTIFY_DEVICE_NAME").unwrap_or_default(),

            client_url: env::var("CLIENT_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .unwrap_or(3001),
            logs_enabled: env::var("LOGS_ENABLED")
                .map(|v| v == "true")
                .unwrap_or(true),
            token_path: optional("TOKEN_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("token.json")),
            oauth_state_key,

            location,
            location_label: optional("OPEN_METEO_CITY"),

            spotify_api_url: or_default("SPOTIFY_API_URL", DEFAULT_SPOTIFY_API_URL),
            spotify_auth_url: or_default("SPOTIFY_AUTH_URL", DEFAULT_SPOTIFY_AUTH_URL),
            spotify_token_url: or_default("SPOTIFY_TOKEN_URL", DEFAULT_SPOTIFY_TOKEN_URL),
            geocoding_api_url: or_default("GEOCODING_API_URL", DEFAULT_GEOCODING_API_URL),
            forecast_api_url: or_default("FORECAST_API_URL", DEFAULT_FORECAST_API_URL),
        })
    }
}

/// Per-process signing key, used when none is configured.
fn random_key() -> Result<Vec<u8>, ConfigError> {
    let mut key = vec![0u8; 32];
    SystemRandom::new()
        .fill(&mut key)
        .map_err(|_| ConfigError::KeyGeneration)?;
    Ok(key)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Failed to generate OAuth state key")]
    KeyGeneration,
}
