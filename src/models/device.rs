// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spotify playback device descriptors.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Read an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A playback device as reported by `GET /me/player/devices`.
///
/// Only the fields used for device resolution are typed; everything else
/// Spotify sends is kept so the descriptor can be relayed unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Spotify may report `null` for restricted devices
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Device {
    pub fn new(id: &str, name: &str, is_active: bool) -> Self {
        Self {
            id: Some(id.to_string()),
            name: name.to_string(),
            is_active,
            extra: Map::new(),
        }
    }
}

/// Body of the devices endpoint.
#[derive(Debug, Clone, Default)]
pub struct DeviceList {
    pub devices: Vec<Device>,
}

impl DeviceList {
    /// Decode leniently, one device at a time.
    ///
    /// Entries that are not device objects are dropped; a body without a
    /// `devices` array yields an empty list.
    pub fn from_value(value: &Value) -> Self {
        let Some(entries) = value.get("devices").and_then(Value::as_array) else {
            return Self::default();
        };

        let devices = entries
            .iter()
            .filter_map(|entry| match Device::deserialize(entry) {
                Ok(device) => Some(device),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping undecodable device");
                    None
                }
            })
            .collect();

        Self { devices }
    }
}
