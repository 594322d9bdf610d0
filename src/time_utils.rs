// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for epoch-millisecond timestamps.

use chrono::{DateTime, Utc};

/// Milliseconds since the Unix epoch for a UTC instant.
pub fn epoch_millis(date: DateTime<Utc>) -> i64 {
    date.timestamp_millis()
}

/// Current time in epoch milliseconds.
pub fn now_millis() -> i64 {
    epoch_millis(Utc::now())
}
