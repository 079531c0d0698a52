// ABOUTME: Absence tier thresholds configuration
// ABOUTME: Hours since the latest activity at which each absence tier begins
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use serde::{Deserialize, Serialize};

/// Hours since the latest activity at which each tier starts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsenceConfig {
    /// Start of `soft_reminder`
    pub soft_reminder_hours: i64,
    /// Start of `active`; an absence log is opened here
    pub active_hours: i64,
    /// Start of `estimation`
    pub estimation_hours: i64,
    /// Start of `max_reached`
    pub max_reached_hours: i64,
    /// Start of `hibernation`
    pub hibernation_hours: i64,
}

impl Default for AbsenceConfig {
    fn default() -> Self {
        Self {
            soft_reminder_hours: 24,
            active_hours: 48,
            estimation_hours: 72,
            max_reached_hours: 7 * 24,
            hibernation_hours: 14 * 24,
        }
    }
}
