// ABOUTME: Application constants for providers, OAuth timing, and HTTP clients
// ABOUTME: Includes provider identifiers and per-provider endpoint defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Fitness Connect

//! Centralized constants used across the credential core

/// Supported provider identifiers and their endpoint defaults
pub mod providers {
    /// Strava activity-tracking provider
    pub const STRAVA: &str = "strava";

    /// WHOOP biometrics provider
    pub const WHOOP: &str = "whoop";

    /// All provider identifiers this build knows about
    #[must_use]
    pub const fn all() -> &'static [&'static str] {
        &[STRAVA, WHOOP]
    }

    /// Strava authorization endpoint
    pub const STRAVA_AUTH_URL: &str = "https://www.strava.com/oauth/authorize";

    /// Strava token endpoint
    pub const STRAVA_TOKEN_URL: &str = "https://www.strava.com/oauth/token";

    /// Default Strava scopes (comma-separated, per Strava convention)
    pub const STRAVA_DEFAULT_SCOPES: &str = "read,activity:read_all";

    /// WHOOP authorization endpoint
    pub const WHOOP_AUTH_URL: &str = "https://api.prod.whoop.com/oauth/oauth2/auth";

    /// WHOOP token endpoint
    pub const WHOOP_TOKEN_URL: &str = "https://api.prod.whoop.com/oauth/oauth2/token";

    /// Default WHOOP scopes (space-separated, per WHOOP convention)
    pub const WHOOP_DEFAULT_SCOPES: &str =
        "read:recovery read:sleep read:workout read:profile read:body_measurement";
}

/// OAuth protocol timing and sizing
pub mod oauth {
    /// Length of the random CSRF state token
    pub const STATE_LENGTH: usize = 32;

    /// Minutes an issued state token stays redeemable
    pub const STATE_TTL_MINUTES: u32 = 10;

    /// Safety margin subtracted from token expiry; absorbs clock skew and
    /// in-flight request latency so a token is never handed out on the edge
    /// of expiring
    pub const EXPIRY_MARGIN_SECONDS: i64 = 60;

    /// Fallback token lifetime when a provider omits both `expires_in` and
    /// `expires_at`
    pub const DEFAULT_TOKEN_EXPIRY_SECONDS: i64 = 3600;
}

/// HTTP client timeouts
pub mod http {
    /// Request timeout for OAuth token endpoints
    pub const OAUTH_TIMEOUT_SECS: u64 = 15;

    /// Connect timeout for OAuth token endpoints
    pub const OAUTH_CONNECT_TIMEOUT_SECS: u64 = 5;
}

/// Application-level defaults
pub mod defaults {
    /// Base URL used to derive redirect URIs when none is configured
    pub const BASE_URL: &str = "http://localhost:8000";

    /// Directory name for the on-disk token store under the platform data dir
    pub const DATA_DIR_NAME: &str = "fitness-connect";
}
