// ABOUTME: OAuth module organizing authorization flows and token management
// ABOUTME: Centralizes the registry, flow controller, refresher, and facade
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Fitness Connect

//! # OAuth credential lifecycle
//!
//! The authorization-flow state machine, refresh coordination, and the
//! facade the routing layer and downstream API clients call into. Per
//! provider the lifecycle is `NotConnected → PendingCallback → Connected`;
//! `Connected` reverts to `NotConnected` only when a refresh fails with an
//! unrecoverable grant error or the provider is explicitly disconnected.

/// Authorization URL construction and callback handling
pub mod flow;

/// Facade wiring the registry, store, flow, and refresher together
pub mod manager;

/// Per-provider protocol quirks
pub mod providers;

/// On-demand token validity with single-flight refresh
pub mod refresher;

/// Immutable provider configuration lookup
pub mod registry;

pub use flow::AuthFlowController;
pub use manager::CredentialManager;
pub use providers::{quirks_for, ProviderQuirks};
pub use refresher::TokenRefresher;
pub use registry::ProviderRegistry;

use crate::models::OAuthErrorResponse;

/// Whether a token endpoint error body positively identifies a rejected
/// grant (revoked or superseded), as opposed to a transient failure.
pub(crate) fn is_grant_rejection(body: &str) -> bool {
    serde_json::from_str::<OAuthErrorResponse>(body)
        .ok()
        .and_then(|e| e.error)
        .is_some_and(|e| matches!(e.as_str(), "invalid_grant" | "invalid_token"))
}

#[cfg(test)]
mod tests {
    use super::is_grant_rejection;

    #[test]
    fn grant_rejection_matches_oauth_error_codes() {
        assert!(is_grant_rejection(r#"{"error":"invalid_grant"}"#));
        assert!(is_grant_rejection(
            r#"{"error":"invalid_token","error_description":"revoked"}"#
        ));
        assert!(!is_grant_rejection(r#"{"error":"server_error"}"#));
        assert!(!is_grant_rejection("not json"));
        assert!(!is_grant_rejection(""));
    }
}
