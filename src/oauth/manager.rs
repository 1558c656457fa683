// ABOUTME: Credential manager facade over registry, store, flow, and refresher
// ABOUTME: The single entry point routing layers and API clients call into
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Fitness Connect

//! Credential manager.
//!
//! An explicitly constructed instance with a defined startup lifecycle; the
//! crate has no process-wide singleton. Build one from [`ServerConfig`] at
//! startup, or inject a registry and store directly (tests do).

use crate::config::ServerConfig;
use crate::errors::AuthResult;
use crate::models::{AuthorizationRequest, ConnectionResult, ProviderStatus};
use crate::oauth::flow::AuthFlowController;
use crate::oauth::refresher::TokenRefresher;
use crate::oauth::registry::ProviderRegistry;
use crate::store::{FileTokenStore, TokenStore};
use crate::utils::http_client::oauth_client;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Facade over the credential lifecycle: authorization, refresh, status.
pub struct CredentialManager {
    registry: Arc<ProviderRegistry>,
    store: Arc<dyn TokenStore>,
    flow: AuthFlowController,
    refresher: TokenRefresher,
}

impl CredentialManager {
    /// Build a manager from validated configuration, using the file-backed
    /// token store.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::AuthError::Configuration`] for invalid
    /// provider configuration and
    /// [`crate::errors::AuthError::Storage`] when the store directory
    /// cannot be created.
    pub fn from_config(config: &ServerConfig) -> AuthResult<Self> {
        let registry = Arc::new(ProviderRegistry::from_config(&config.oauth)?);
        let store: Arc<dyn TokenStore> =
            Arc::new(FileTokenStore::new(&config.token_store_dir)?);
        Ok(Self::new(registry, store))
    }

    /// Build a manager over an injected registry and token store.
    #[must_use]
    pub fn new(registry: Arc<ProviderRegistry>, store: Arc<dyn TokenStore>) -> Self {
        if registry.is_empty() {
            warn!("no OAuth providers are configured");
        }
        let http = oauth_client();
        Self {
            flow: AuthFlowController::new(
                Arc::clone(&registry),
                Arc::clone(&store),
                http.clone(),
            ),
            refresher: TokenRefresher::new(Arc::clone(&registry), Arc::clone(&store), http),
            registry,
            store,
        }
    }

    /// Issue an authorization URL; the routing layer redirects the user's
    /// browser to it.
    ///
    /// # Errors
    ///
    /// See [`AuthFlowController::begin_authorization`].
    pub async fn begin_authorization(&self, provider: &str) -> AuthResult<AuthorizationRequest> {
        self.flow.begin_authorization(provider).await
    }

    /// Complete a provider callback: validate state, exchange the code,
    /// persist the credential.
    ///
    /// # Errors
    ///
    /// See [`AuthFlowController::complete_authorization`].
    pub async fn complete_authorization(
        &self,
        provider: &str,
        code: &str,
        state: &str,
    ) -> AuthResult<ConnectionResult> {
        self.flow.complete_authorization(provider, code, state).await
    }

    /// Return an access token valid past the safety margin, refreshing if
    /// needed.
    ///
    /// # Errors
    ///
    /// See [`TokenRefresher::get_valid_access_token`].
    pub async fn get_valid_access_token(&self, provider: &str) -> AuthResult<String> {
        self.refresher.get_valid_access_token(provider).await
    }

    /// Delete the stored credential; the provider reverts to not connected.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::AuthError::UnknownProvider`] for
    /// unregistered providers and
    /// [`crate::errors::AuthError::Storage`] on persistence failure.
    pub async fn disconnect(&self, provider: &str) -> AuthResult<()> {
        self.registry.get(provider)?;
        self.store.delete(provider).await?;
        info!(provider, "provider disconnected");
        Ok(())
    }

    /// Connection status for one provider. Pure store read; never triggers
    /// a refresh or a network call.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::AuthError::UnknownProvider`] for
    /// unregistered providers; storage failures degrade to a disconnected
    /// status rather than an error.
    pub async fn describe(&self, provider: &str) -> AuthResult<ProviderStatus> {
        self.registry.get(provider)?;
        Ok(self.status_of(provider).await)
    }

    /// Connection status for every registered provider. Always well-formed;
    /// "not connected" is a normal state, not an error.
    pub async fn describe_all(&self) -> BTreeMap<String, ProviderStatus> {
        let mut statuses = BTreeMap::new();
        for id in self.registry.provider_ids() {
            statuses.insert(id.to_owned(), self.status_of(id).await);
        }
        statuses
    }

    async fn status_of(&self, provider: &str) -> ProviderStatus {
        match self.store.get(provider).await {
            Ok(Some(record)) => ProviderStatus::from(&record),
            Ok(None) => ProviderStatus::disconnected(),
            Err(e) => {
                warn!(provider, error = %e, "token store read failed, reporting as disconnected");
                ProviderStatus::disconnected()
            }
        }
    }
}
