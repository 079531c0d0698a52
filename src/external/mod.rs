// ABOUTME: External API client modules (generative content endpoint)
// ABOUTME: Provider trait plus the HTTP implementation used in production
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! External API Clients

pub mod generative_client;

// Re-export commonly used types
pub use generative_client::{
    ActionSuggestionRequest, AnalysisRequest, GeneratedAction, GenerativeClient,
    GenerativeContentProvider,
};
