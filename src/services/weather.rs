// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Open-Meteo weather lookup with a 30-minute cache.

use crate::config::{Config, WeatherLocation};
use crate::error::AppError;
use crate::models::{ConditionClass, WeatherPayload};
use crate::time_utils::epoch_millis;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

/// How long a fetched forecast is served from cache.
pub const WEATHER_CACHE_TTL_MINUTES: i64 = 30;

/// Label used when neither config nor geocoder names the place.
const FALLBACK_LOCATION_LABEL: &str = "Local";

/// Last successful fetch.
#[derive(Debug, Clone)]
struct CacheEntry {
    payload: WeatherPayload,
    fetched_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<CurrentConditions>,
}

#[derive(Debug, Default, Deserialize)]
struct CurrentConditions {
    temperature_2m: Option<f64>,
    weather_code: Option<i64>,
    is_day: Option<i64>,
}

/// Weather service with an in-memory cache.
pub struct WeatherService {
    http: reqwest::Client,
    geocoding_url: String,
    forecast_url: String,
    location: WeatherLocation,
    location_label: Option<String>,
    cache: Mutex<Option<CacheEntry>>,
}

impl WeatherService {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            geocoding_url: config.geocoding_api_url.clone(),
            forecast_url: config.forecast_api_url.clone(),
            location: config.location.clone(),
            location_label: config.location_label.clone(),
            cache: Mutex::new(None),
        }
    }

    /// Current conditions, served from cache when fresh.
    pub async fn get_weather(&self) -> Result<WeatherPayload, AppError> {
        self.get_weather_at(Utc::now()).await
    }

    /// Same as `get_weather`, evaluated at an explicit instant.
    ///
    /// The cache lock is held across the refetch so concurrent misses
    /// share one lookup. A failed refetch leaves the previous entry as-is.
    pub async fn get_weather_at(&self, now: DateTime<Utc>) -> Result<WeatherPayload, AppError> {
        let mut cache = self.cache.lock().await;

        if let Some(entry) = cache.as_ref() {
            if now - entry.fetched_at < Duration::minutes(WEATHER_CACHE_TTL_MINUTES) {
                return Ok(entry.payload.clone());
            }
        }

        let payload = self.fetch(now).await?;
        *cache = Some(CacheEntry {
            payload: payload.clone(),
            fetched_at: now,
        });

        tracing::debug!(
            location = %payload.location,
            label = %payload.label,
            "Weather refreshed"
        );
        Ok(payload)
    }

    async fn fetch(&self, now: DateTime<Utc>) -> Result<WeatherPayload, AppError> {
        let (latitude, longitude, geocoded_name) = match &self.location {
            WeatherLocation::Coordinates {
                latitude,
                longitude,
            } => (*latitude, *longitude, None),
            WeatherLocation::PostalCode {
                postal_code,
                country,
            } => {
                let place = self.geocode(postal_code, country).await?;
                (place.latitude, place.longitude, place.name)
            }
        };

        let current = self.forecast(latitude, longitude).await?;
        let is_day = current.is_day == Some(1);
        let class = ConditionClass::from_code(current.weather_code);

        let location = self
            .location_label
            .clone()
            .or(geocoded_name)
            .unwrap_or_else(|| FALLBACK_LOCATION_LABEL.to_string());

        Ok(WeatherPayload {
            temperature: current.temperature_2m,
            weather_code: current.weather_code,
            is_day: current.is_day,
            label: class.label().to_string(),
            icon: class.icon(is_day).to_string(),
            location,
            last_updated: epoch_millis(now),
        })
    }

    /// Resolve a postal code to coordinates.
    async fn geocode(&self, postal_code: &str, country: &str) -> Result<GeocodeResult, AppError> {
        let url = format!("{}/search", self.geocoding_url);
        let response: GeocodeResponse = self
            .get_json(
                &url,
                &[
                    ("name", postal_code),
                    ("count", "1"),
                    ("language", "en"),
                    ("format", "json"),
                    ("country", country),
                ],
            )
            .await?;

        response.results.into_iter().next().ok_or_else(|| {
            tracing::warn!(postal_code = %postal_code, country = %country, "Postal code not found");
            AppError::LocationNotFound
        })
    }

    async fn forecast(&self, latitude: f64, longitude: f64) -> Result<CurrentConditions, AppError> {
        let url = format!("{}/forecast", self.forecast_url);
        let latitude = latitude.to_string();
        let longitude = longitude.to_string();
        let response: ForecastResponse = self
            .get_json(
                &url,
                &[
                    ("latitude", latitude.as_str()),
                    ("longitude", longitude.as_str()),
                    ("current", "temperature_2m,weather_code,is_day"),
                    ("temperature_unit", "celsius"),
                ],
            )
            .await?;

        Ok(response.current.unwrap_or_default())
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::WeatherLookup(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::WeatherLookup(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::WeatherLookup(format!("JSON parse error: {}", e)))
    }
}
