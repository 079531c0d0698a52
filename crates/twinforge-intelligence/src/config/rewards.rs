// ABOUTME: Reconciliation reward and action queue configuration
// ABOUTME: Objective-aligned bonus XP and action generation limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use serde::{Deserialize, Serialize};
use twinforge_core::constants::action_queue::{MAX_NEW_ACTIONS, MIN_RULE_ACTIONS};

/// Reconciliation rewards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Flat bonus for objective-aligned progress
    pub aligned_bonus_xp: u64,
    /// Coherence required for the bonus
    pub bonus_min_coherence: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            aligned_bonus_xp: 50,
            bonus_min_coherence: 0.7,
        }
    }
}

/// Action queue limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionQueueConfig {
    /// Maximum actions inserted per generation
    pub max_new_actions: usize,
    /// Below this many rule actions the fallbacks run
    pub min_rule_actions: usize,
}

impl Default for ActionQueueConfig {
    fn default() -> Self {
        Self {
            max_new_actions: MAX_NEW_ACTIONS,
            min_rule_actions: MIN_RULE_ACTIONS,
        }
    }
}
