// ABOUTME: Main library entry point for the Fitness Connect credential core
// ABOUTME: Manages OAuth2 authorization, token persistence, and refresh for fitness providers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Fitness Connect

#![deny(unsafe_code)]

//! # Fitness Connect
//!
//! OAuth credential lifecycle core for a personal fitness agent. This crate
//! mediates OAuth2 authorization with fitness providers (Strava for activity
//! tracking, WHOOP for biometrics) on behalf of a single user and keeps the
//! resulting credentials usable: it initiates authorization, exchanges
//! authorization codes for tokens, persists tokens durably, and refreshes
//! expired tokens before they are handed to downstream API clients.
//!
//! ## Architecture
//!
//! - **Config**: environment-based configuration, validated eagerly at startup
//! - **Registry**: immutable per-provider OAuth endpoints and credentials
//! - **Flow**: authorization URLs, CSRF state, authorization-code exchange
//! - **Store**: durable one-record-per-provider token persistence
//! - **Refresher**: on-demand token validity with single-flight refresh
//! - **Manager**: the facade routing layers and API clients call into
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use fitness_connect::config::environment::ServerConfig;
//! use fitness_connect::errors::AuthResult;
//! use fitness_connect::oauth::CredentialManager;
//!
//! #[tokio::main]
//! async fn main() -> AuthResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     let manager = CredentialManager::from_config(&config)?;
//!
//!     let request = manager.begin_authorization("strava").await?;
//!     println!("visit {} to connect Strava", request.url);
//!     Ok(())
//! }
//! ```

/// Configuration management loaded once at startup
pub mod config;

/// Application constants and provider defaults
pub mod constants;

/// Unified error taxonomy for the credential lifecycle
pub mod errors;

/// Structured logging configuration
pub mod logging;

/// Credential and status data structures
pub mod models;

/// OAuth flows, provider registry, refresh coordination
pub mod oauth;

/// Durable token persistence
pub mod store;

/// Shared HTTP client utilities
pub mod utils;
