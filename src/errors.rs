// ABOUTME: Unified error taxonomy for the OAuth credential lifecycle
// ABOUTME: Distinguishes recoverable, unrecoverable, and caller errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Fitness Connect

//! Error types shared by every component of the credential core.
//!
//! Errors are cloneable so concurrent callers waiting on a shared refresh
//! can each receive the single in-flight outcome.

use thiserror::Error;

/// Result alias used throughout the crate
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors surfaced by the credential lifecycle core
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Fatal at startup: provider credentials missing or malformed
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Caller named a provider that is not registered
    #[error("provider not supported: {0}")]
    UnknownProvider(String),

    /// Callback carried an unknown, reused, or expired state parameter
    #[error("invalid or expired state parameter")]
    InvalidState,

    /// Provider rejected the authorization code (stale or already used)
    #[error("{provider} rejected the authorization code")]
    InvalidGrant {
        /// Provider that rejected the code
        provider: String,
    },

    /// Code exchange failed for a reason other than code rejection
    #[error("token exchange with {provider} failed: {cause}")]
    TokenExchangeFailed {
        /// Provider whose token endpoint failed
        provider: String,
        /// Underlying network or protocol failure
        cause: String,
    },

    /// Refresh failed transiently; the stored record is untouched and a
    /// later retry may succeed
    #[error("transient refresh failure for {provider}: {cause}")]
    TransientRefresh {
        /// Provider whose refresh failed
        provider: String,
        /// Underlying network or protocol failure
        cause: String,
    },

    /// The grant is no longer valid; the stored record has been purged and
    /// the authorization flow must be restarted
    #[error("{provider} authorization is no longer valid, re-authorization required")]
    ReauthorizationRequired {
        /// Provider requiring a new authorization
        provider: String,
    },

    /// No credential record exists for the provider
    #[error("not connected to {provider}")]
    NotConnected {
        /// Provider with no stored credential
        provider: String,
    },

    /// Token store I/O or serialization failure
    #[error("token store error: {0}")]
    Storage(String),
}

impl AuthError {
    pub(crate) fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }

    pub(crate) fn not_connected(provider: &str) -> Self {
        Self::NotConnected {
            provider: provider.to_owned(),
        }
    }
}
