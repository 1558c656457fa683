// ABOUTME: Immutable provider registry built from validated configuration
// ABOUTME: Lookup by provider identifier, no runtime mutation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Fitness Connect

//! Provider registry.

use crate::config::OAuthConfig;
use crate::config::OAuthProviderConfig;
use crate::constants::providers;
use crate::errors::{AuthError, AuthResult};
use crate::models::ProviderConfig;
use std::collections::HashMap;
use tracing::info;

/// Immutable map of provider identifier to validated [`ProviderConfig`].
///
/// Built exactly once at startup; enabled providers with incomplete
/// credentials fail construction rather than first use.
pub struct ProviderRegistry {
    providers: HashMap<String, ProviderConfig>,
}

impl ProviderRegistry {
    /// Build the registry from OAuth configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] when an enabled provider is
    /// missing its client id or client secret.
    pub fn from_config(oauth: &OAuthConfig) -> AuthResult<Self> {
        let mut registered = HashMap::new();

        for (id, cfg) in [
            (providers::STRAVA, &oauth.strava),
            (providers::WHOOP, &oauth.whoop),
        ] {
            if !cfg.enabled {
                continue;
            }
            registered.insert(id.to_owned(), Self::build_provider(id, cfg)?);
            info!(provider = id, "registered OAuth provider");
        }

        Ok(Self {
            providers: registered,
        })
    }

    fn build_provider(id: &str, cfg: &OAuthProviderConfig) -> AuthResult<ProviderConfig> {
        cfg.validate(id)?;
        let client_id = cfg
            .client_id
            .clone()
            .ok_or_else(|| AuthError::Configuration(format!("{id}: client_id is missing")))?;
        let client_secret = cfg
            .client_secret
            .clone()
            .ok_or_else(|| AuthError::Configuration(format!("{id}: client_secret is missing")))?;

        Ok(ProviderConfig {
            id: id.to_owned(),
            auth_url: cfg.auth_url.clone(),
            token_url: cfg.token_url.clone(),
            client_id,
            client_secret,
            redirect_uri: cfg.redirect_uri.clone(),
            scopes: cfg.scopes.clone(),
        })
    }

    /// Look up a provider's configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnknownProvider`] for unregistered identifiers.
    pub fn get(&self, provider: &str) -> AuthResult<&ProviderConfig> {
        self.providers
            .get(provider)
            .ok_or_else(|| AuthError::UnknownProvider(provider.to_owned()))
    }

    /// Registered provider identifiers, sorted for deterministic iteration.
    #[must_use]
    pub fn provider_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Whether no providers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
