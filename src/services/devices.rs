// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Playback device resolution, transfer and wake.

use crate::error::AppError;
use crate::models::{Device, DeviceList};
use crate::services::spotify::{SpotifyService, UpstreamBody, UpstreamResponse};
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

/// Pick the device a playback operation should target.
///
/// Precedence, first match wins:
/// 1. exact `id` match
/// 2. case-insensitive `name` match (only for a non-empty name)
/// 3. the active device (first one if several claim to be active)
///
/// Devices without an id cannot be targeted and are never picked.
pub fn resolve_device<'a>(
    devices: &'a [Device],
    requested_id: Option<&str>,
    requested_name: Option<&str>,
) -> Result<&'a Device, AppError> {
    let targetable = || devices.iter().filter(|d| d.id.is_some());

    let by_id = requested_id
        .filter(|id| !id.is_empty())
        .and_then(|id| targetable().find(|d| d.id.as_deref() == Some(id)));

    let by_name = || {
        let name = requested_name.filter(|n| !n.is_empty())?.to_lowercase();
        targetable().find(|d| d.name.to_lowercase() == name)
    };

    by_id
        .or_else(by_name)
        .or_else(|| targetable().find(|d| d.is_active))
        .ok_or(AppError::NoDeviceAvailable)
}

/// Request body that moves playback without starting it.
fn transfer_body(device_id: &str) -> Value {
    json!({
        "device_ids": [device_id],
        "play": false,
    })
}

/// Transfer playback to the resolved device without autoplay.
///
/// The upstream answer is relayed with the chosen descriptor merged in
/// under `"device"`. A failed device listing is relayed unchanged.
pub async fn transfer_playback(
    spotify: &SpotifyService,
    requested_id: Option<&str>,
    requested_name: Option<&str>,
) -> Result<UpstreamResponse, AppError> {
    let listing = spotify.get("/me/player/devices").await?;
    if listing.status != StatusCode::OK {
        return Ok(listing);
    }

    let list = listing
        .data
        .as_json()
        .map(DeviceList::from_value)
        .unwrap_or_default();
    let device = resolve_device(&list.devices, requested_id, requested_name)?;
    let Some(device_id) = device.id.as_deref() else {
        return Err(AppError::NoDeviceAvailable);
    };

    tracing::info!(device_id = %device_id, name = %device.name, "Transferring playback");

    let response = spotify
        .call(Method::PUT, "/me/player", Some(transfer_body(device_id)))
        .await?;

    let mut merged = match response.data.into_value() {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        other => {
            let mut map = serde_json::Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };
    merged.insert(
        "device".to_string(),
        serde_json::to_value(device).map_err(|e| AppError::Internal(e.into()))?,
    );

    Ok(UpstreamResponse {
        status: response.status,
        data: UpstreamBody::Json(Value::Object(merged)),
    })
}

/// Wake a dormant device: transfer without autoplay, then start playback.
///
/// Some targets reject a play command until playback was transferred to
/// them, hence the two steps. A failed transfer is returned as-is and no
/// play command is sent.
pub async fn wake_device(
    spotify: &SpotifyService,
    device_id: &str,
) -> Result<UpstreamResponse, AppError> {
    if device_id.is_empty() {
        return Err(AppError::BadRequest("deviceId required".to_string()));
    }

    let transfer = spotify
        .call(Method::PUT, "/me/player", Some(transfer_body(device_id)))
        .await?;
    if transfer.status.is_client_error() || transfer.status.is_server_error() {
        tracing::warn!(
            device_id = %device_id,
            status = transfer.status.as_u16(),
            "Wake transfer failed, not starting playback"
        );
        return Ok(transfer);
    }

    let endpoint = format!(
        "/me/player/play?device_id={}",
        urlencoding::encode(device_id)
    );
    spotify.call(Method::PUT, &endpoint, None).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices() -> Vec<Device> {
        vec![
            Device::new("A", "Kitchen", false),
            Device::new("B", "Phone", true),
        ]
    }

    #[test]
    fn test_resolve_by_id() {
        let devices = devices();
        let device = resolve_device(&devices, Some("B"), None).unwrap();
        assert_eq!(device.id.as_deref(), Some("B"));
    }

    #[test]
    fn test_id_wins_over_name() {
        let devices = devices();
        let device = resolve_device(&devices, Some("B"), Some("Kitchen")).unwrap();
        assert_eq!(device.id.as_deref(), Some("B"));
    }

    #[test]
    fn test_resolve_by_name_any_case() {
        let devices = devices();
        for name in ["kitchen", "KITCHEN", "Kitchen"] {
            let device = resolve_device(&devices, None, Some(name)).unwrap();
            assert_eq!(device.id.as_deref(), Some("A"), "name {}", name);
        }
    }

    #[test]
    fn test_unknown_id_falls_through_to_name() {
        let devices = devices();
        let device = resolve_device(&devices, Some("Z"), Some("kitchen")).unwrap();
        assert_eq!(device.id.as_deref(), Some("A"));
    }

    #[test]
    fn test_falls_back_to_active() {
        let devices = devices();
        let device = resolve_device(&devices, None, None).unwrap();
        assert_eq!(device.id.as_deref(), Some("B"));

        let device = resolve_device(&devices, Some(""), Some("Living Room")).unwrap();
        assert_eq!(device.id.as_deref(), Some("B"));
    }

    #[test]
    fn test_first_active_wins() {
        let devices = vec![
            Device::new("A", "One", true),
            Device::new("B", "Two", true),
        ];
        let device = resolve_device(&devices, None, None).unwrap();
        assert_eq!(device.id.as_deref(), Some("A"));
    }

    #[test]
    fn test_empty_list_has_no_device() {
        let result = resolve_device(&[], Some("B"), Some("kitchen"));
        assert!(matches!(result, Err(AppError::NoDeviceAvailable)));
    }

    #[test]
    fn test_no_active_and_no_match() {
        let devices = vec![Device::new("A", "Kitchen", false)];
        let result = resolve_device(&devices, None, Some("Phone"));
        assert!(matches!(result, Err(AppError::NoDeviceAvailable)));
    }

    #[test]
    fn test_device_without_id_is_skipped() {
        let mut restricted = Device::new("X", "Kitchen", true);
        restricted.id = None;
        let devices = vec![restricted, Device::new("A", "kitchen", false)];

        let device = resolve_device(&devices, None, Some("Kitchen")).unwrap();
        assert_eq!(device.id.as_deref(), Some("A"));

        let result = resolve_device(&devices[..1], None, None);
        assert!(matches!(result, Err(AppError::NoDeviceAvailable)));
    }
}
