// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Music Dashboard: backend for a kiosk-style now-playing display.
//!
//! This crate proxies the Spotify Web API (with a single stored OAuth
//! credential) and the Open-Meteo weather API for the dashboard front-end.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::TokenStore;
use services::{SpotifyService, WeatherService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub spotify: SpotifyService,
    pub weather: WeatherService,
}

impl AppState {
    /// Build the services for a loaded configuration.
    pub fn new(config: Config) -> Self {
        let http = reqwest::Client::new();
        let store = TokenStore::new(&config.token_path);
        let spotify = SpotifyService::new(&config, http.clone(), store);
        let weather = WeatherService::new(&config, http);

        Self {
            config,
            spotify,
            weather,
        }
    }
}
