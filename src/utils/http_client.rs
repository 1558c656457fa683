// ABOUTME: Shared HTTP client utilities with connection pooling and timeouts
// ABOUTME: Provides an OAuth-tuned client so token calls never hang indefinitely
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Fitness Connect

//! HTTP client construction.

use crate::constants::http::{OAUTH_CONNECT_TIMEOUT_SECS, OAUTH_TIMEOUT_SECS};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Create a new HTTP client with custom timeout settings.
///
/// Falls back to a default client if custom client creation fails.
#[must_use]
pub fn create_client_with_timeout(timeout_secs: u64, connect_timeout_secs: u64) -> Client {
    ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Create a new HTTP client optimized for OAuth flows.
///
/// Token exchanges and refreshes should be fast operations; the short
/// timeouts bound how long any caller can be suspended on a provider.
#[must_use]
pub fn oauth_client() -> Client {
    create_client_with_timeout(OAUTH_TIMEOUT_SECS, OAUTH_CONNECT_TIMEOUT_SECS)
}
