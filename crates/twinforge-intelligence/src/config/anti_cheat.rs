// ABOUTME: Weight-change plausibility thresholds and coherence multipliers
// ABOUTME: Rate limits, history checks, calorie cross-check, and XP multiplier mapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! Anti-cheat validation configuration
//!
//! Every check multiplies the coherence score; thresholds are in kilograms or
//! kilograms per week.

use serde::{Deserialize, Serialize};

/// Weight-change validation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AntiCheatConfig {
    /// Weekly rate limits
    pub rate: RateLimits,
    /// Objective direction check
    pub objective: ObjectiveCheckConfig,
    /// Reconciliation and absence history checks
    pub history: HistoryCheckConfig,
    /// Estimated calorie balance cross-check
    pub calories: CalorieCheckConfig,
    /// Coherence to XP multiplier mapping
    pub multiplier: MultiplierConfig,
}

/// Weekly rate-of-change limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimits {
    /// Loss rate flagged as extreme (kg/week)
    pub extreme_loss_kg_per_week: f64,
    /// Gain rate flagged as extreme (kg/week)
    pub extreme_gain_kg_per_week: f64,
    /// Loss rate flagged as high (kg/week)
    pub high_loss_kg_per_week: f64,
    /// Gain rate flagged as high (kg/week)
    pub high_gain_kg_per_week: f64,
    /// Coherence multiplier for an extreme rate
    pub extreme_multiplier: f64,
    /// Coherence multiplier for a high rate
    pub high_multiplier: f64,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            extreme_loss_kg_per_week: 1.5,
            extreme_gain_kg_per_week: 0.8,
            high_loss_kg_per_week: 1.0,
            high_gain_kg_per_week: 0.5,
            extreme_multiplier: 0.3,
            high_multiplier: 0.6,
        }
    }
}

/// Objective direction check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveCheckConfig {
    /// Changes smaller than this (kg) have no direction
    pub direction_tolerance_kg: f64,
    /// Coherence multiplier when the change contradicts the objective
    pub contradiction_multiplier: f64,
}

impl Default for ObjectiveCheckConfig {
    fn default() -> Self {
        Self {
            direction_tolerance_kg: 0.2,
            contradiction_multiplier: 0.6,
        }
    }
}

/// Historical pattern checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryCheckConfig {
    /// Lookback for reconciliation and absence history (days)
    pub window_days: i64,
    /// Maximum rows loaded per history kind
    pub row_limit: u32,
    /// Standard deviation of recent reconciled weights flagged as high (kg)
    pub max_weight_std_dev_kg: f64,
    /// Coherence multiplier for high variance
    pub variance_multiplier: f64,
    /// Distance from the recent average flagged as an outlier (kg)
    pub max_distance_from_average_kg: f64,
    /// Coherence multiplier for an outlier
    pub outlier_multiplier: f64,
    /// Window for the reconciliation frequency check (days)
    pub frequency_window_days: i64,
    /// Reconciliations in the frequency window above which the user is flagged
    pub max_recent_reconciliations: usize,
    /// Coherence multiplier for excessive reconciliations
    pub frequency_multiplier: f64,
    /// Absences in the history window above which the user is flagged
    pub max_absences: usize,
    /// Coherence multiplier for frequent absences
    pub absence_frequency_multiplier: f64,
    /// Absences of at most this many days count as short
    pub short_absence_days: u32,
    /// Consecutive short absences flagged as a pattern
    pub short_absence_streak: usize,
    /// Coherence multiplier for the short-absence pattern
    pub short_absence_multiplier: f64,
}

impl Default for HistoryCheckConfig {
    fn default() -> Self {
        Self {
            window_days: 90,
            row_limit: 50,
            max_weight_std_dev_kg: 3.0,
            variance_multiplier: 0.85,
            max_distance_from_average_kg: 5.0,
            outlier_multiplier: 0.8,
            frequency_window_days: 30,
            max_recent_reconciliations: 5,
            frequency_multiplier: 0.9,
            max_absences: 5,
            absence_frequency_multiplier: 0.85,
            short_absence_days: 3,
            short_absence_streak: 3,
            short_absence_multiplier: 0.8,
        }
    }
}

/// Cross-check of the weight delta against the estimated energy balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalorieCheckConfig {
    /// Discrepancy above which coherence is reduced (kg)
    pub large_discrepancy_kg: f64,
    /// Coherence multiplier for a large discrepancy
    pub large_discrepancy_multiplier: f64,
    /// Discrepancy below which coherence is rewarded (kg)
    pub small_discrepancy_kg: f64,
    /// Coherence multiplier for a small discrepancy
    pub small_discrepancy_multiplier: f64,
}

impl Default for CalorieCheckConfig {
    fn default() -> Self {
        Self {
            large_discrepancy_kg: 2.0,
            large_discrepancy_multiplier: 0.7,
            small_discrepancy_kg: 0.5,
            small_discrepancy_multiplier: 1.1,
        }
    }
}

/// Coherence to XP multiplier mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiplierConfig {
    /// Coherence at or above which a change is realistic
    pub realistic_threshold: f64,
    /// Coherence and multiplier used when no previous weight exists
    pub no_previous_weight_score: f64,
    /// Multiplier at zero coherence
    pub base: f64,
    /// Multiplier gained per unit of coherence
    pub coherence_weight: f64,
    /// Bonus when the change is aligned with the objective
    pub alignment_bonus: f64,
    /// Multiplier floor
    pub min: f64,
    /// Multiplier ceiling
    pub max: f64,
}

impl Default for MultiplierConfig {
    fn default() -> Self {
        Self {
            realistic_threshold: 0.5,
            no_previous_weight_score: 0.7,
            base: 0.5,
            coherence_weight: 0.2,
            alignment_bonus: 0.1,
            min: 0.3,
            max: 1.0,
        }
    }
}
