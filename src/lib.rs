// ABOUTME: Main library entry point for the TwinForge engagement engine
// ABOUTME: Storage, generative client, configuration, logging, and the async engagement services
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

#![deny(unsafe_code)]

//! # TwinForge Engagement Engine
//!
//! Scoring and anti-abuse pipeline of the TwinForge fitness product: adaptive
//! scores, transformation and level predictions, the dashboard action queue,
//! and absence detection with estimated-activity rewards reconciled against
//! the weight the user enters on return.
//!
//! ## Architecture
//!
//! - **`twinforge-core`**: errors, constants, and domain models
//! - **`twinforge-intelligence`**: pure algorithms and `EngagementConfig`
//! - **this crate**: the `EngagementStore` trait with its SQLite backend, the
//!   generative content client, and the services that join them
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use twinforge_engagement::config::ServerConfig;
//! use twinforge_engagement::services::EngagementEngine;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     let engine = EngagementEngine::from_config(&config).await?;
//!
//!     let user_id = uuid::Uuid::new_v4();
//!     let report = engine.scoring.compute_scores(user_id, chrono::Utc::now()).await?;
//!     println!("Overall score: {}", report.scores.overall_score);
//!     Ok(())
//! }
//! ```

/// Configuration loaded from the environment
pub mod config;

/// Service and environment constants plus re-exported domain constants
pub mod constants;

/// SQLite persistence
pub mod database;

/// Storage abstraction and backends
pub mod database_plugins;

/// Error types
pub mod errors;

/// External service clients
pub mod external;

/// Logging setup and domain event helpers
pub mod logging;

/// Async engagement services
pub mod services;

pub use database_plugins::sqlite::SqliteEngagementStore;
pub use database_plugins::EngagementStore;
pub use errors::{AppError, AppResult};
pub use services::EngagementEngine;
