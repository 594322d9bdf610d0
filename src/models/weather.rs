// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weather payload served to the idle screen.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Coarse condition class for a WMO weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionClass {
    Clear,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    FreezingRain,
    Snow,
    Thunderstorm,
    Unknown,
}

impl ConditionClass {
    /// Classify a WMO weather code as reported by Open-Meteo.
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(0) => Self::Clear,
            Some(1..=3) => Self::Cloudy,
            Some(45 | 48) => Self::Fog,
            Some(51 | 53 | 55 | 56 | 57) => Self::Drizzle,
            Some(61 | 63 | 65 | 80 | 81 | 82) => Self::Rain,
            Some(66 | 67) => Self::FreezingRain,
            Some(71 | 73 | 75 | 77 | 85 | 86) => Self::Snow,
            Some(95 | 96 | 99) => Self::Thunderstorm,
            _ => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::FreezingRain => "Freezing Rain",
            Self::Snow => "Snow",
            Self::Thunderstorm => "Thunder",
            Self::Unknown => "Unknown",
        }
    }

    /// Icon name; only clear skies differ between day and night.
    pub fn icon(self, is_day: bool) -> &'static str {
        match self {
            Self::Clear if is_day => "sun",
            Self::Clear => "moon",
            Self::Cloudy | Self::Unknown => "cloud",
            Self::Fog => "cloud-fog",
            Self::Drizzle => "cloud-drizzle",
            Self::Rain | Self::FreezingRain => "cloud-rain",
            Self::Snow => "cloud-snow",
            Self::Thunderstorm => "cloud-lightning",
        }
    }
}

/// Current conditions summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WeatherPayload {
    /// Degrees Celsius
    pub temperature: Option<f64>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub weather_code: Option<i64>,
    /// 1 for day, 0 for night
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub is_day: Option<i64>,
    pub label: String,
    pub icon: String,
    pub location: String,
    /// Fetch time (epoch milliseconds)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub last_updated: i64,
}
