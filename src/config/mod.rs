// ABOUTME: Configuration management module for the engagement service layer
// ABOUTME: Environment-driven settings for storage, generative content, and estimation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! Configuration module for the TwinForge engagement engine
//!
//! - **Environment**: `ServerConfig` loaded from environment variables and `.env`
//! - **Engagement**: algorithm thresholds live in `twinforge_intelligence::EngagementConfig`

/// Environment and server configuration
pub mod environment;

pub use environment::{GenerativeConfig, ServerConfig};
