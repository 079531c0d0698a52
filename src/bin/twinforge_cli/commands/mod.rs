// ABOUTME: Re-exports command modules for twinforge-cli
// ABOUTME: Engagement commands (scores, predictions, actions) and absence commands
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

pub mod absence;
pub mod engagement;
