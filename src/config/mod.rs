// ABOUTME: Configuration module for startup-time settings
// ABOUTME: Everything is read once from the environment and immutable after
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Fitness Connect

//! Configuration management.
//!
//! All configuration is loaded from the environment exactly once at process
//! start and validated eagerly; missing provider credentials fail startup
//! instead of surfacing at first use.

/// Environment-based configuration loading and validation
pub mod environment;

pub use environment::{OAuthConfig, OAuthProviderConfig, ServerConfig};
