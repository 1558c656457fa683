// ABOUTME: Authorization flow controller for OAuth code-grant flows
// ABOUTME: Issues CSRF-protected authorization URLs and exchanges callback codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Fitness Connect

//! Authorization flow.
//!
//! A flow begins with [`AuthFlowController::begin_authorization`], which
//! issues a single-use CSRF state token bound to the provider, and ends
//! with [`AuthFlowController::complete_authorization`], which consumes the
//! state before attempting the code exchange so a replayed callback can
//! never succeed twice.

use crate::constants::oauth::{STATE_LENGTH, STATE_TTL_MINUTES};
use crate::errors::{AuthError, AuthResult};
use crate::models::{
    AuthorizationRequest, ConnectionResult, ProviderConfig, TokenEndpointResponse, TokenRecord,
};
use crate::oauth::providers::quirks_for;
use crate::oauth::registry::ProviderRegistry;
use crate::oauth::is_grant_rejection;
use crate::store::TokenStore;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use url::Url;

/// An authorization we have issued a state token for and are awaiting a
/// callback on. The state token itself is the map key.
#[derive(Debug, Clone)]
struct PendingAuthorization {
    provider: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Builds authorization URLs, validates callbacks, exchanges codes.
pub struct AuthFlowController {
    registry: Arc<ProviderRegistry>,
    store: Arc<dyn TokenStore>,
    http: reqwest::Client,
    pending: RwLock<HashMap<String, PendingAuthorization>>,
}

impl AuthFlowController {
    /// Create a flow controller over the given registry and store.
    #[must_use]
    pub fn new(
        registry: Arc<ProviderRegistry>,
        store: Arc<dyn TokenStore>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            registry,
            store,
            http,
            pending: RwLock::new(HashMap::new()),
        }
    }

    /// Issue an authorization URL for a provider.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnknownProvider`] for unregistered providers and
    /// [`AuthError::Configuration`] when the configured authorize endpoint
    /// is not a valid URL.
    pub async fn begin_authorization(&self, provider: &str) -> AuthResult<AuthorizationRequest> {
        let config = self.registry.get(provider)?;
        let quirks = quirks_for(provider);

        let state = generate_state();
        self.store_pending(provider, &state).await;

        let mut url = Url::parse(&config.auth_url).map_err(|e| {
            AuthError::Configuration(format!("{provider}: invalid authorize URL: {e}"))
        })?;
        url.query_pairs_mut()
            .append_pair("client_id", &config.client_id)
            .append_pair("redirect_uri", &config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &quirks.join_scopes(&config.scopes))
            .append_pair("state", &state);

        info!(provider, "issued authorization URL");

        Ok(AuthorizationRequest {
            provider: provider.to_owned(),
            url: url.into(),
            state,
            expires_in_minutes: STATE_TTL_MINUTES,
        })
    }

    /// Handle the provider's callback: validate the state, exchange the
    /// code, persist the resulting credential record.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidState`] for unknown, reused, or expired
    /// state tokens; [`AuthError::InvalidGrant`] when the provider rejects
    /// the code; [`AuthError::TokenExchangeFailed`] on network failures or
    /// other non-success responses.
    pub async fn complete_authorization(
        &self,
        provider: &str,
        code: &str,
        state: &str,
    ) -> AuthResult<ConnectionResult> {
        let config = self.registry.get(provider)?;
        self.consume_state(provider, state).await?;

        let response = self.exchange_code(config, code).await?;

        let now = Utc::now();
        let quirks = quirks_for(provider);
        let scopes = response
            .scope
            .as_deref()
            .map_or_else(|| config.scopes.clone(), |raw| quirks.split_scopes(raw));
        let record = TokenRecord {
            provider: provider.to_owned(),
            expires_at: response.expiry(now),
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            scopes,
            last_refreshed_at: None,
        };

        self.store.put(&record).await?;
        info!(provider, expires_at = %record.expires_at, "provider connected");

        Ok(ConnectionResult {
            provider: provider.to_owned(),
            connected: true,
            expires_at: record.expires_at,
            scopes: record.scopes,
            message: format!("{provider} connected successfully"),
        })
    }

    async fn store_pending(&self, provider: &str, state: &str) {
        let now = Utc::now();
        let mut pending = self.pending.write().await;
        pending.insert(
            state.to_owned(),
            PendingAuthorization {
                provider: provider.to_owned(),
                created_at: now,
                expires_at: now + Duration::minutes(i64::from(STATE_TTL_MINUTES)),
            },
        );
        // Expired entries are garbage; drop them while we hold the lock.
        pending.retain(|_, p| p.expires_at > now);
    }

    /// Remove the pending entry before any further validation: a state
    /// token is single-use no matter how the exchange turns out.
    async fn consume_state(&self, provider: &str, state: &str) -> AuthResult<()> {
        let pending = self
            .pending
            .write()
            .await
            .remove(state)
            .ok_or(AuthError::InvalidState)?;

        if pending.provider != provider {
            warn!(provider, "state token was issued for a different provider");
            return Err(AuthError::InvalidState);
        }
        if pending.expires_at < Utc::now() {
            warn!(
                provider,
                issued_at = %pending.created_at,
                "state token expired before the callback arrived"
            );
            return Err(AuthError::InvalidState);
        }
        Ok(())
    }

    async fn exchange_code(
        &self,
        config: &ProviderConfig,
        code: &str,
    ) -> AuthResult<TokenEndpointResponse> {
        let params = [
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", config.redirect_uri.as_str()),
        ];

        let response = self
            .http
            .post(&config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::TokenExchangeFailed {
                provider: config.id.clone(),
                cause: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| AuthError::TokenExchangeFailed {
                    provider: config.id.clone(),
                    cause: format!("invalid token response: {e}"),
                });
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() && is_grant_rejection(&body) {
            warn!(provider = %config.id, "provider rejected the authorization code");
            return Err(AuthError::InvalidGrant {
                provider: config.id.clone(),
            });
        }
        Err(AuthError::TokenExchangeFailed {
            provider: config.id.clone(),
            cause: format!("{status}: {body}"),
        })
    }
}

/// Cryptographically random state token from a fixed alphabet.
fn generate_state() -> String {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..STATE_LENGTH)
        .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::generate_state;
    use crate::constants::oauth::STATE_LENGTH;

    #[test]
    fn state_tokens_are_random_and_sized() {
        let a = generate_state();
        let b = generate_state();
        assert_eq!(a.len(), STATE_LENGTH);
        assert_eq!(b.len(), STATE_LENGTH);
        assert_ne!(a, b);
        assert!(a.chars().all(char::is_alphanumeric));
    }
}
