// ABOUTME: Shared utility modules
// ABOUTME: Currently hosts the HTTP client helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Fitness Connect

//! Shared utilities.

/// HTTP client construction with tuned timeouts
pub mod http_client;
