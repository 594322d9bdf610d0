// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod device;
pub mod token;
pub mod weather;

pub use device::{Device, DeviceList};
pub use token::CredentialRecord;
pub use weather::{ConditionClass, WeatherPayload};
