// ABOUTME: XP event log entries and award results
// ABOUTME: Events are keyed by (user, source key) so awards are idempotent
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One XP grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpEvent {
    /// Row id
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Idempotency key, unique per user
    pub source_key: String,
    /// XP granted
    pub amount: u64,
    /// Grant time
    pub occurred_at: DateTime<Utc>,
}

impl XpEvent {
    /// New event stamped now
    #[must_use]
    pub fn new(user_id: Uuid, source_key: impl Into<String>, amount: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            source_key: source_key.into(),
            amount,
            occurred_at: Utc::now(),
        }
    }
}

/// Result of the idempotent award primitive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpAward {
    /// Event stored under the source key (the earlier one on replay)
    pub event: XpEvent,
    /// False when the key had already been awarded
    pub newly_awarded: bool,
    /// User's cumulative XP after the call
    pub total_xp: u64,
}

/// Aggregated XP history for one user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpSummary {
    /// Cumulative XP
    pub total_xp: u64,
    /// All-time number of events
    pub event_count: u32,
    /// XP earned in the trailing 30 days
    pub xp_last_30_days: u64,
    /// XP earned in the trailing 7 days
    pub xp_last_7_days: u64,
}

/// Build the idempotency key for an award tied to a source record
#[must_use]
pub fn source_key(prefix: &str, record_id: Uuid) -> String {
    format!("{prefix}:{record_id}")
}
