// ABOUTME: Error handling for the engagement service layer
// ABOUTME: Re-exports the core error types so callers import from one place
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! # Unified Error Handling System
//!
//! `AppError` carries an `ErrorCode` plus a message. Storage and HTTP errors
//! convert through the core crate's `From` implementations, so `?` works on
//! `sqlx` and `reqwest` results directly.

pub use twinforge_core::errors::{AppError, AppResult, ErrorCode};
