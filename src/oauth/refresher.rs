// ABOUTME: On-demand access token validity with single-flight refresh
// ABOUTME: One refresh per provider per expiry event, shared by all waiters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Fitness Connect

//! Token refresher.
//!
//! [`TokenRefresher::get_valid_access_token`] is the call every downstream
//! API client makes before talking to a provider. Fresh tokens are returned
//! without any network traffic. Expired tokens are renewed by a single
//! in-flight refresh per provider: concurrent callers join the flight and
//! all receive its one outcome, because some providers rotate refresh
//! tokens and a second concurrent attempt with a superseded refresh token
//! could poison the valid one. The refresh runs in a spawned task, so a
//! caller dropping out cannot cancel a refresh other waiters still need.

use crate::errors::{AuthError, AuthResult};
use crate::models::{ProviderConfig, TokenEndpointResponse, TokenRecord};
use crate::oauth::is_grant_rejection;
use crate::oauth::providers::quirks_for;
use crate::oauth::registry::ProviderRegistry;
use crate::store::TokenStore;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

type RefreshOutcome = AuthResult<TokenRecord>;
type FlightReceiver = watch::Receiver<Option<RefreshOutcome>>;

/// Hands out currently valid access tokens, refreshing on demand.
pub struct TokenRefresher {
    registry: Arc<ProviderRegistry>,
    store: Arc<dyn TokenStore>,
    http: reqwest::Client,
    flights: Arc<DashMap<String, FlightReceiver>>,
}

impl TokenRefresher {
    /// Create a refresher over the given registry and store.
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
            flights: Arc::new(DashMap::new()),
        }
    }

    /// Return an access token guaranteed to outlive the safety margin.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotConnected`] when no record exists,
    /// [`AuthError::TransientRefresh`] when a refresh failed recoverably
    /// (record untouched, retry later), and
    /// [`AuthError::ReauthorizationRequired`] when the grant is gone and
    /// the record has been purged.
    pub async fn get_valid_access_token(&self, provider: &str) -> AuthResult<String> {
        self.registry.get(provider)?;

        let record = self
            .store
            .get(provider)
            .await?
            .ok_or_else(|| AuthError::not_connected(provider))?;

        if record.is_fresh_at(Utc::now()) {
            return Ok(record.access_token);
        }

        debug!(provider, expires_at = %record.expires_at, "token inside expiry margin, refreshing");
        let refreshed = self.join_refresh(provider).await?;
        Ok(refreshed.access_token)
    }

    /// Join the provider's refresh flight, starting one if none is active.
    async fn join_refresh(&self, provider: &str) -> RefreshOutcome {
        let mut rx = match self.flights.entry(provider.to_owned()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let (tx, rx) = watch::channel(None);
                entry.insert(rx.clone());

                let registry = Arc::clone(&self.registry);
                let store = Arc::clone(&self.store);
                let http = self.http.clone();
                let flights = Arc::clone(&self.flights);
                let name = provider.to_owned();
                tokio::spawn(async move {
                    let outcome = refresh_once(&registry, store.as_ref(), &http, &name).await;
                    // Publish before unregistering so a waiter holding this
                    // receiver always observes the outcome.
                    let _ = tx.send(Some(outcome));
                    flights.remove(&name);
                });
                rx
            }
        };

        loop {
            {
                let value = rx.borrow_and_update();
                if let Some(outcome) = value.as_ref() {
                    return outcome.clone();
                }
            }
            if rx.changed().await.is_err() {
                return Err(AuthError::TransientRefresh {
                    provider: provider.to_owned(),
                    cause: "refresh task ended without an outcome".to_owned(),
                });
            }
        }
    }
}

/// The single in-flight refresh for a provider.
async fn refresh_once(
    registry: &ProviderRegistry,
    store: &dyn TokenStore,
    http: &reqwest::Client,
    provider: &str,
) -> RefreshOutcome {
    let config = registry.get(provider)?;

    let record = store
        .get(provider)
        .await?
        .ok_or_else(|| AuthError::not_connected(provider))?;

    // A flight that completed between the caller's freshness check and this
    // one already renewed the token; don't hit the provider again.
    if record.is_fresh_at(Utc::now()) {
        return Ok(record);
    }

    let Some(refresh_token) = record.refresh_token.clone() else {
        warn!(provider, "token expired and no refresh token stored, purging record");
        store.delete(provider).await?;
        return Err(AuthError::ReauthorizationRequired {
            provider: provider.to_owned(),
        });
    };

    let response = match request_refresh(http, config, &refresh_token).await {
        Ok(response) => response,
        Err(RefreshFailure::GrantRejected) => {
            warn!(provider, "refresh token rejected by provider, purging record");
            store.delete(provider).await?;
            return Err(AuthError::ReauthorizationRequired {
                provider: provider.to_owned(),
            });
        }
        Err(RefreshFailure::Transient(cause)) => {
            warn!(provider, %cause, "transient refresh failure, record left untouched");
            return Err(AuthError::TransientRefresh {
                provider: provider.to_owned(),
                cause,
            });
        }
    };

    let quirks = quirks_for(provider);
    if response.refresh_token.is_none() && quirks.rotates_refresh_token() {
        warn!(provider, "expected a rotated refresh token but none was issued, retaining previous");
    }

    let now = Utc::now();
    let scopes = response
        .scope
        .as_deref()
        .map_or_else(|| record.scopes.clone(), |raw| quirks.split_scopes(raw));
    let updated = TokenRecord {
        provider: record.provider,
        expires_at: response.expiry(now),
        access_token: response.access_token,
        // Not every provider rotates the refresh token; keep ours when the
        // response omits one.
        refresh_token: response.refresh_token.or(Some(refresh_token)),
        scopes,
        last_refreshed_at: Some(now),
    };

    store.put(&updated).await?;
    info!(provider, expires_at = %updated.expires_at, "access token refreshed");
    Ok(updated)
}

enum RefreshFailure {
    /// Network, timeout, 5xx, or malformed response; safe to retry later
    Transient(String),
    /// Provider positively rejected the grant; the credential is dead
    GrantRejected,
}

async fn request_refresh(
    http: &reqwest::Client,
    config: &ProviderConfig,
    refresh_token: &str,
) -> Result<TokenEndpointResponse, RefreshFailure> {
    let params = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];

    let response = http
        .post(&config.token_url)
        .form(&params)
        .send()
        .await
        .map_err(|e| RefreshFailure::Transient(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| RefreshFailure::Transient(format!("invalid token response: {e}")));
    }

    let body = response.text().await.unwrap_or_default();
    if status.is_client_error() && is_grant_rejection(&body) {
        return Err(RefreshFailure::GrantRejected);
    }
    Err(RefreshFailure::Transient(format!("{status}: {body}")))
}
