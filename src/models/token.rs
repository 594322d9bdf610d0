// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stored Spotify OAuth credential.

use serde::{Deserialize, Serialize};

/// Refresh this long before the recorded expiry (1 minute).
pub const TOKEN_REFRESH_MARGIN_MS: i64 = 60_000;

/// The single OAuth credential record, persisted as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Short-lived bearer token for API calls
    pub access_token: String,
    /// Long-lived token used to mint new access tokens
    pub refresh_token: String,
    /// Access token expiry (epoch milliseconds)
    pub expires_at: i64,
}

impl CredentialRecord {
    /// Build a record from a token grant issued at `now_ms`.
    pub fn from_grant(
        access_token: String,
        refresh_token: String,
        expires_in_secs: i64,
        now_ms: i64,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: now_ms.saturating_add(expires_in_secs.saturating_mul(1000)),
        }
    }

    /// Whether the access token must be refreshed before use at `now_ms`.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at.saturating_sub(TOKEN_REFRESH_MARGIN_MS)
    }
}
