// ABOUTME: Data structures for provider credentials, flow results, and status
// ABOUTME: Includes the wire-level token endpoint response shapes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Fitness Connect

//! Core data model for the credential lifecycle.

use crate::constants::oauth::{DEFAULT_TOKEN_EXPIRY_SECONDS, EXPIRY_MARGIN_SECONDS};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Immutable per-provider OAuth configuration, validated at startup
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Unique provider identifier (e.g. `strava`)
    pub id: String,
    /// Authorization endpoint the user's browser is redirected to
    pub auth_url: String,
    /// Token endpoint for code exchange and refresh
    pub token_url: String,
    /// OAuth client identifier
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Redirect URI registered with the provider
    pub redirect_uri: String,
    /// Scopes requested during authorization
    pub scopes: Vec<String>,
}

/// Durable credential record, one per connected provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Provider this record belongs to
    pub provider: String,
    /// Opaque access token presented to the provider's data API
    pub access_token: String,
    /// Refresh token, absent when the provider issues none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Absolute expiry of the access token
    pub expires_at: DateTime<Utc>,
    /// Scopes the provider actually granted
    #[serde(default)]
    pub scopes: Vec<String>,
    /// When the record was last replaced by a refresh
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

impl TokenRecord {
    /// Whether the access token is still usable at `now`, leaving the
    /// configured safety margin before the real expiry.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECONDS) < self.expires_at
    }
}

/// Result of `begin_authorization`: where to send the user's browser
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationRequest {
    /// Provider being connected
    pub provider: String,
    /// Fully composed authorization URL
    pub url: String,
    /// CSRF state token embedded in the URL
    pub state: String,
    /// Minutes the state token stays redeemable
    pub expires_in_minutes: u32,
}

/// Result of a successful `complete_authorization`
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionResult {
    /// Provider that was connected
    pub provider: String,
    /// Always true on success; failures are errors, not results
    pub connected: bool,
    /// Expiry of the freshly issued access token
    pub expires_at: DateTime<Utc>,
    /// Scopes the provider granted
    pub scopes: Vec<String>,
    /// Human-readable confirmation
    pub message: String,
}

/// Read-only connection status for one provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    /// Whether a credential record exists
    pub connected: bool,
    /// Granted scopes, empty when disconnected
    pub scopes: Vec<String>,
    /// Access token expiry, absent when disconnected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Last refresh time, absent when never refreshed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

impl ProviderStatus {
    /// Status for a provider with no stored credential
    #[must_use]
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            scopes: Vec::new(),
            expires_at: None,
            last_refreshed_at: None,
        }
    }
}

impl From<&TokenRecord> for ProviderStatus {
    fn from(record: &TokenRecord) -> Self {
        Self {
            connected: true,
            scopes: record.scopes.clone(),
            expires_at: Some(record.expires_at),
            last_refreshed_at: record.last_refreshed_at,
        }
    }
}

/// Token endpoint response, normalized across providers.
///
/// Strava reports an absolute `expires_at` alongside `expires_in`; most
/// providers report only `expires_in`. Refresh responses may omit the
/// refresh token and scope entirely.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenEndpointResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenEndpointResponse {
    /// Absolute expiry for this response, computed the way the issuer
    /// reported it: absolute timestamp first, then relative lifetime, then
    /// the default lifetime.
    pub(crate) fn expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.expires_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)))
            .unwrap_or_else(|| now + Duration::seconds(DEFAULT_TOKEN_EXPIRY_SECONDS))
    }
}

/// OAuth error body returned by token endpoints on 4xx responses
#[derive(Debug, Deserialize)]
pub(crate) struct OAuthErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
}
