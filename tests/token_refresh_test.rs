// ABOUTME: Integration tests for the token refresher
// ABOUTME: Covers expiry margins, single-flight, retention, and grant revocation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Fitness Connect

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use chrono::{DateTime, Duration, Utc};
use fitness_connect::config::{OAuthConfig, OAuthProviderConfig};
use fitness_connect::errors::AuthError;
use fitness_connect::models::TokenRecord;
use fitness_connect::oauth::{CredentialManager, ProviderRegistry};
use fitness_connect::store::{FileTokenStore, TokenStore};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_config(server_uri: &str, provider: &str) -> OAuthProviderConfig {
    OAuthProviderConfig {
        client_id: Some(format!("{provider}-client")),
        client_secret: Some(format!("{provider}-secret")),
        redirect_uri: format!("http://localhost:8000/auth/{provider}/callback"),
        auth_url: format!("{server_uri}/oauth/authorize"),
        token_url: format!("{server_uri}/oauth/token"),
        scopes: vec!["read".to_owned()],
        enabled: true,
    }
}

/// Manager plus a handle on its store so tests can seed and inspect records.
fn harness(server_uri: &str, dir: &TempDir) -> (CredentialManager, Arc<FileTokenStore>) {
    let oauth = OAuthConfig {
        strava: provider_config(server_uri, "strava"),
        whoop: provider_config(server_uri, "whoop"),
    };
    let registry = Arc::new(ProviderRegistry::from_config(&oauth).unwrap());
    let store = Arc::new(FileTokenStore::new(dir.path()).unwrap());
    (CredentialManager::new(registry, store.clone()), store)
}

fn record_expiring_at(provider: &str, expires_at: DateTime<Utc>) -> TokenRecord {
    TokenRecord {
        provider: provider.to_owned(),
        access_token: "stored-access".to_owned(),
        refresh_token: Some("stored-refresh".to_owned()),
        expires_at,
        scopes: vec!["read".to_owned()],
        last_refreshed_at: None,
    }
}

async fn mount_refresh(server: &MockServer, body: serde_json::Value, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn missing_record_fails_with_not_connected() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (manager, _store) = harness(&server.uri(), &dir);

    let result = manager.get_valid_access_token("strava").await;
    assert!(matches!(result, Err(AuthError::NotConnected { provider }) if provider == "strava"));
}

#[tokio::test]
async fn fresh_token_is_returned_without_network_calls() {
    let server = MockServer::start().await;
    mount_refresh(&server, serde_json::json!({"access_token": "x"}), 0).await;
    let dir = TempDir::new().unwrap();
    let (manager, store) = harness(&server.uri(), &dir);

    store
        .put(&record_expiring_at("strava", Utc::now() + Duration::hours(1)))
        .await
        .unwrap();

    let token = manager.get_valid_access_token("strava").await.unwrap();
    assert_eq!(token, "stored-access");
}

#[tokio::test]
async fn token_just_inside_the_margin_is_refreshed() {
    let server = MockServer::start().await;
    mount_refresh(
        &server,
        serde_json::json!({
            "access_token": "refreshed-access",
            "refresh_token": "refreshed-refresh",
            "expires_in": 21600,
        }),
        1,
    )
    .await;
    let dir = TempDir::new().unwrap();
    let (manager, store) = harness(&server.uri(), &dir);

    // One second short of the 60s safety margin: must refresh.
    store
        .put(&record_expiring_at("strava", Utc::now() + Duration::seconds(59)))
        .await
        .unwrap();

    let token = manager.get_valid_access_token("strava").await.unwrap();
    assert_eq!(token, "refreshed-access");
}

#[tokio::test]
async fn token_just_outside_the_margin_is_not_refreshed() {
    let server = MockServer::start().await;
    mount_refresh(&server, serde_json::json!({"access_token": "x"}), 0).await;
    let dir = TempDir::new().unwrap();
    let (manager, store) = harness(&server.uri(), &dir);

    // One second past the 60s safety margin: existing token is handed out.
    store
        .put(&record_expiring_at("strava", Utc::now() + Duration::seconds(61)))
        .await
        .unwrap();

    let token = manager.get_valid_access_token("strava").await.unwrap();
    assert_eq!(token, "stored-access");
}

#[tokio::test]
async fn concurrent_callers_share_a_single_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(std::time::Duration::from_millis(200))
                .set_body_json(serde_json::json!({
                    "access_token": "refreshed-access",
                    "refresh_token": "refreshed-refresh",
                    "expires_in": 21600,
                })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let (manager, store) = harness(&server.uri(), &dir);
    let manager = Arc::new(manager);

    store
        .put(&record_expiring_at("strava", Utc::now() - Duration::seconds(10)))
        .await
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.get_valid_access_token("strava").await })
        })
        .collect();

    for handle in handles {
        let token = handle.await.unwrap().unwrap();
        assert_eq!(token, "refreshed-access");
    }
    // The mock's expect(1) verifies exactly one refresh reached the server.
}

#[tokio::test]
async fn refresh_token_is_retained_when_response_omits_it() {
    let server = MockServer::start().await;
    mount_refresh(
        &server,
        serde_json::json!({
            "access_token": "refreshed-access",
            "expires_in": 3600,
        }),
        1,
    )
    .await;
    let dir = TempDir::new().unwrap();
    let (manager, store) = harness(&server.uri(), &dir);

    store
        .put(&record_expiring_at("whoop", Utc::now() - Duration::seconds(10)))
        .await
        .unwrap();

    manager.get_valid_access_token("whoop").await.unwrap();

    let updated = store.get("whoop").await.unwrap().unwrap();
    assert_eq!(updated.access_token, "refreshed-access");
    assert_eq!(updated.refresh_token.as_deref(), Some("stored-refresh"));
    assert!(updated.last_refreshed_at.is_some());
}

#[tokio::test]
async fn rotated_refresh_token_replaces_the_prior_one() {
    let server = MockServer::start().await;
    mount_refresh(
        &server,
        serde_json::json!({
            "access_token": "refreshed-access",
            "refresh_token": "rotated-refresh",
            "expires_in": 21600,
        }),
        1,
    )
    .await;
    let dir = TempDir::new().unwrap();
    let (manager, store) = harness(&server.uri(), &dir);

    store
        .put(&record_expiring_at("strava", Utc::now() - Duration::seconds(10)))
        .await
        .unwrap();

    manager.get_valid_access_token("strava").await.unwrap();

    let updated = store.get("strava").await.unwrap().unwrap();
    assert_eq!(updated.refresh_token.as_deref(), Some("rotated-refresh"));
}

#[tokio::test]
async fn scopes_are_retained_when_refresh_omits_them() {
    let server = MockServer::start().await;
    mount_refresh(
        &server,
        serde_json::json!({
            "access_token": "refreshed-access",
            "refresh_token": "rotated-refresh",
            "expires_in": 21600,
        }),
        1,
    )
    .await;
    let dir = TempDir::new().unwrap();
    let (manager, store) = harness(&server.uri(), &dir);

    store
        .put(&record_expiring_at("strava", Utc::now() - Duration::seconds(10)))
        .await
        .unwrap();

    manager.get_valid_access_token("strava").await.unwrap();

    let updated = store.get("strava").await.unwrap().unwrap();
    assert_eq!(updated.scopes, vec!["read".to_owned()]);
}

#[tokio::test]
async fn revoked_grant_purges_the_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({"error": "invalid_grant"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let (manager, store) = harness(&server.uri(), &dir);

    store
        .put(&record_expiring_at("strava", Utc::now() - Duration::seconds(10)))
        .await
        .unwrap();

    let result = manager.get_valid_access_token("strava").await;
    assert!(
        matches!(result, Err(AuthError::ReauthorizationRequired { provider }) if provider == "strava")
    );

    // The record is gone: no stale token can ever be returned.
    assert!(store.get("strava").await.unwrap().is_none());
    let again = manager.get_valid_access_token("strava").await;
    assert!(matches!(again, Err(AuthError::NotConnected { .. })));
}

#[tokio::test]
async fn transient_failure_preserves_the_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let (manager, store) = harness(&server.uri(), &dir);

    let expired = record_expiring_at("strava", Utc::now() - Duration::seconds(10));
    store.put(&expired).await.unwrap();

    let result = manager.get_valid_access_token("strava").await;
    assert!(matches!(result, Err(AuthError::TransientRefresh { .. })));

    // A later retry still has everything it needs.
    assert_eq!(store.get("strava").await.unwrap().unwrap(), expired);
}

#[tokio::test]
async fn missing_refresh_token_requires_reauthorization() {
    let server = MockServer::start().await;
    mount_refresh(&server, serde_json::json!({"access_token": "x"}), 0).await;
    let dir = TempDir::new().unwrap();
    let (manager, store) = harness(&server.uri(), &dir);

    let mut record = record_expiring_at("whoop", Utc::now() - Duration::seconds(10));
    record.refresh_token = None;
    store.put(&record).await.unwrap();

    let result = manager.get_valid_access_token("whoop").await;
    assert!(matches!(result, Err(AuthError::ReauthorizationRequired { .. })));
    assert!(store.get("whoop").await.unwrap().is_none());
}
