// ABOUTME: Application constants for the engagement service layer
// ABOUTME: Re-exports the domain constants and adds service and environment names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! # Constants Module
//!
//! Domain constants live in the core crate; this module adds the names used
//! by logging and environment configuration.

pub use twinforge_core::constants::{
    action_queue, energy, estimation_defaults, level_curve, level_prediction, prediction, scoring,
    snapshot, xp_sources,
};

/// Service names for structured logging
pub mod service_names {
    /// Engagement engine service name
    pub const TWINFORGE_ENGAGEMENT: &str = "twinforge_engagement";
    /// Operator CLI
    pub const TWINFORGE_CLI: &str = "twinforge_cli";
}

/// Environment variable names read by `ServerConfig`
pub mod env_vars {
    /// SQLite connection URL
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Generative content endpoint base URL
    pub const GENERATIVE_BASE_URL: &str = "TWINFORGE_GENERATIVE_BASE_URL";
    /// Bearer token for the generative endpoint
    pub const GENERATIVE_TOKEN: &str = "TWINFORGE_GENERATIVE_TOKEN";
    /// Generative request timeout in seconds
    pub const GENERATIVE_TIMEOUT_SECS: &str = "TWINFORGE_GENERATIVE_TIMEOUT_SECS";
    /// Fixed seed for activity estimation
    pub const ESTIMATION_SEED: &str = "TWINFORGE_ESTIMATION_SEED";
}

/// Defaults used when the environment is silent
pub mod defaults {
    /// Local database file
    pub const DATABASE_URL: &str = "sqlite:./data/twinforge.db";
    /// Generative request timeout in seconds
    pub const GENERATIVE_TIMEOUT_SECS: u64 = 30;
}
