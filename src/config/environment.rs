// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Loads per-provider OAuth credentials and validates them eagerly
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Fitness Connect

//! Environment-based configuration for the credential core.
//!
//! A provider is considered *enabled* as soon as any of its environment
//! variables is set; an enabled provider with incomplete credentials is a
//! startup error, not a deferred one.

use crate::constants::{defaults, providers};
use crate::errors::{AuthError, AuthResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::{debug, info};

/// Top-level configuration assembled at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL of this application, used to derive redirect URIs
    pub base_url: String,
    /// Directory holding the durable token store
    pub token_store_dir: PathBuf,
    /// Per-provider OAuth configuration
    pub oauth: OAuthConfig,
}

impl ServerConfig {
    /// Load and validate configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] when an enabled provider is
    /// missing its client id or client secret.
    pub fn from_env() -> AuthResult<Self> {
        let base_url =
            env::var("APP_BASE_URL").unwrap_or_else(|_| defaults::BASE_URL.to_owned());

        let token_store_dir = env::var("TOKEN_STORE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_store_dir());

        let oauth = OAuthConfig::from_env(&base_url);
        oauth.validate()?;

        info!(
            base_url = %base_url,
            token_store_dir = %token_store_dir.display(),
            "configuration loaded"
        );

        Ok(Self {
            base_url,
            token_store_dir,
            oauth,
        })
    }
}

/// OAuth configuration for all supported providers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// Strava OAuth configuration
    pub strava: OAuthProviderConfig,
    /// WHOOP OAuth configuration
    pub whoop: OAuthProviderConfig,
}

impl OAuthConfig {
    /// Load OAuth configuration for every supported provider.
    #[must_use]
    pub fn from_env(base_url: &str) -> Self {
        Self {
            strava: OAuthProviderConfig::load(
                providers::STRAVA,
                base_url,
                providers::STRAVA_AUTH_URL,
                providers::STRAVA_TOKEN_URL,
                providers::STRAVA_DEFAULT_SCOPES,
            ),
            whoop: OAuthProviderConfig::load(
                providers::WHOOP,
                base_url,
                providers::WHOOP_AUTH_URL,
                providers::WHOOP_TOKEN_URL,
                providers::WHOOP_DEFAULT_SCOPES,
            ),
        }
    }

    /// Validate every enabled provider.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] for the first enabled provider
    /// with missing credentials.
    pub fn validate(&self) -> AuthResult<()> {
        self.strava.validate(providers::STRAVA)?;
        self.whoop.validate(providers::WHOOP)?;
        Ok(())
    }
}

/// OAuth configuration for a single provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OAuthProviderConfig {
    /// OAuth client identifier
    pub client_id: Option<String>,
    /// OAuth client secret
    pub client_secret: Option<String>,
    /// Redirect URI registered with the provider
    pub redirect_uri: String,
    /// Authorization endpoint
    pub auth_url: String,
    /// Token endpoint
    pub token_url: String,
    /// Scopes requested during authorization
    pub scopes: Vec<String>,
    /// Whether this provider participates in the registry
    pub enabled: bool,
}

impl OAuthProviderConfig {
    fn load(
        provider: &str,
        base_url: &str,
        default_auth_url: &str,
        default_token_url: &str,
        default_scopes: &str,
    ) -> Self {
        let prefix = provider.to_uppercase();

        let client_id = non_empty(env::var(format!("{prefix}_CLIENT_ID")).ok());
        let client_secret = non_empty(env::var(format!("{prefix}_CLIENT_SECRET")).ok());
        let enabled = client_id.is_some() || client_secret.is_some();

        let redirect_uri = env::var(format!("{prefix}_REDIRECT_URI"))
            .unwrap_or_else(|_| format!("{base_url}/auth/{provider}/callback"));

        let auth_url = env::var(format!("{prefix}_AUTH_URL"))
            .unwrap_or_else(|_| default_auth_url.to_owned());
        let token_url = env::var(format!("{prefix}_TOKEN_URL"))
            .unwrap_or_else(|_| default_token_url.to_owned());

        let scopes = env::var(format!("{prefix}_SCOPES"))
            .map_or_else(|_| split_scopes(default_scopes), |raw| split_scopes(&raw));

        if !enabled {
            debug!(provider, "no credentials in environment, provider disabled");
        }

        Self {
            client_id,
            client_secret,
            redirect_uri,
            auth_url,
            token_url,
            scopes,
            enabled,
        }
    }

    /// Validate this provider's credentials if it is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] when the client id or secret is
    /// missing or empty.
    pub fn validate(&self, provider: &str) -> AuthResult<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.client_id.is_none() {
            return Err(AuthError::Configuration(format!(
                "{provider}: client_id is missing"
            )));
        }
        if self.client_secret.is_none() {
            return Err(AuthError::Configuration(format!(
                "{provider}: client_secret is missing"
            )));
        }
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Scope lists in the environment may be comma- or space-separated; the
/// provider-preferred separator is reapplied when URLs are built.
fn split_scopes(raw: &str) -> Vec<String> {
    raw.split([',', ' '])
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

fn default_store_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(defaults::DATA_DIR_NAME)
        .join("tokens")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serial_test::serial;

    fn clear_provider_env() {
        for prefix in ["STRAVA", "WHOOP"] {
            for suffix in [
                "CLIENT_ID",
                "CLIENT_SECRET",
                "REDIRECT_URI",
                "AUTH_URL",
                "TOKEN_URL",
                "SCOPES",
            ] {
                env::remove_var(format!("{prefix}_{suffix}"));
            }
        }
        env::remove_var("APP_BASE_URL");
        env::remove_var("TOKEN_STORE_DIR");
    }

    #[test]
    #[serial]
    fn unconfigured_providers_are_disabled_and_valid() {
        clear_provider_env();

        let config = ServerConfig::from_env().unwrap();
        assert!(!config.oauth.strava.enabled);
        assert!(!config.oauth.whoop.enabled);
        assert_eq!(config.base_url, defaults::BASE_URL);
    }

    #[test]
    #[serial]
    fn partial_credentials_fail_fast() {
        clear_provider_env();
        env::set_var("STRAVA_CLIENT_ID", "12345");

        let result = ServerConfig::from_env();
        assert!(matches!(result, Err(AuthError::Configuration(_))));

        clear_provider_env();
    }

    #[test]
    #[serial]
    fn full_credentials_enable_provider_with_defaults() {
        clear_provider_env();
        env::set_var("WHOOP_CLIENT_ID", "id");
        env::set_var("WHOOP_CLIENT_SECRET", "secret");

        let config = ServerConfig::from_env().unwrap();
        let whoop = &config.oauth.whoop;
        assert!(whoop.enabled);
        assert_eq!(whoop.auth_url, providers::WHOOP_AUTH_URL);
        assert_eq!(whoop.token_url, providers::WHOOP_TOKEN_URL);
        assert_eq!(
            whoop.redirect_uri,
            format!("{}/auth/whoop/callback", defaults::BASE_URL)
        );
        assert!(whoop.scopes.contains(&"read:recovery".to_owned()));

        clear_provider_env();
    }

    #[test]
    #[serial]
    fn scope_override_accepts_both_separators() {
        clear_provider_env();
        env::set_var("STRAVA_CLIENT_ID", "id");
        env::set_var("STRAVA_CLIENT_SECRET", "secret");
        env::set_var("STRAVA_SCOPES", "read,activity:read_all");

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(
            config.oauth.strava.scopes,
            vec!["read".to_owned(), "activity:read_all".to_owned()]
        );

        clear_provider_env();
    }
}
