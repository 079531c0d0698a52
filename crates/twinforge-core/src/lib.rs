// ABOUTME: Core types and constants for the TwinForge engagement engine
// ABOUTME: Foundation crate with error handling, constants, and domain models
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

#![deny(unsafe_code)]

//! # TwinForge Core
//!
//! Foundation crate providing shared types and constants for the TwinForge
//! engagement engine. This crate holds no I/O so that the algorithm crate and
//! the service crate can both depend on it without pulling in storage or HTTP.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and `AppResult`
//! - **constants**: Scoring, prediction, and absence constants organized by domain
//! - **models**: Domain models (objectives, snapshots, scores, predictions, absences, actions)

/// Unified error handling system with standard error codes
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core data models shared by the algorithm and service crates
pub mod models;
