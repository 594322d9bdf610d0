// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod devices;
pub mod spotify;
pub mod weather;

pub use devices::{resolve_device, transfer_playback, wake_device};
pub use spotify::{SpotifyClient, SpotifyService, UpstreamBody, UpstreamResponse};
pub use weather::WeatherService;
