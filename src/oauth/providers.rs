// ABOUTME: Per-provider OAuth protocol quirks behind a small capability trait
// ABOUTME: Scope separator and refresh-token rotation differ across providers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Fitness Connect

//! Provider quirks.
//!
//! The OAuth flows are provider-agnostic; the differences that remain are
//! pure protocol quirks. They live here, selected by provider identifier,
//! instead of as conditionals scattered through the shared flow logic.

use crate::constants::providers;

/// Protocol quirks for one provider.
pub trait ProviderQuirks: Send + Sync {
    /// Provider identifier these quirks belong to
    fn id(&self) -> &'static str;

    /// Separator used when joining scopes into a single query parameter
    fn scope_separator(&self) -> char;

    /// Whether the provider rotates the refresh token on every refresh
    fn rotates_refresh_token(&self) -> bool;

    /// Join scopes into the provider's preferred wire format
    fn join_scopes(&self, scopes: &[String]) -> String {
        scopes.join(&self.scope_separator().to_string())
    }

    /// Split a granted-scope string back into a scope set
    fn split_scopes(&self, raw: &str) -> Vec<String> {
        raw.split(self.scope_separator())
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

/// Strava: comma-separated scopes, rotating refresh tokens
struct StravaQuirks;

impl ProviderQuirks for StravaQuirks {
    fn id(&self) -> &'static str {
        providers::STRAVA
    }

    fn scope_separator(&self) -> char {
        ','
    }

    fn rotates_refresh_token(&self) -> bool {
        true
    }
}

/// WHOOP: space-separated scopes, stable refresh tokens
struct WhoopQuirks;

impl ProviderQuirks for WhoopQuirks {
    fn id(&self) -> &'static str {
        providers::WHOOP
    }

    fn scope_separator(&self) -> char {
        ' '
    }

    fn rotates_refresh_token(&self) -> bool {
        false
    }
}

/// RFC 6749 defaults for providers without special handling
struct GenericQuirks;

impl ProviderQuirks for GenericQuirks {
    fn id(&self) -> &'static str {
        "generic"
    }

    fn scope_separator(&self) -> char {
        ' '
    }

    fn rotates_refresh_token(&self) -> bool {
        false
    }
}

static STRAVA: StravaQuirks = StravaQuirks;
static WHOOP: WhoopQuirks = WhoopQuirks;
static GENERIC: GenericQuirks = GenericQuirks;

/// Select the quirks for a provider identifier.
#[must_use]
pub fn quirks_for(provider: &str) -> &'static dyn ProviderQuirks {
    match provider {
        providers::STRAVA => &STRAVA,
        providers::WHOOP => &WHOOP,
        _ => &GENERIC,
    }
}
