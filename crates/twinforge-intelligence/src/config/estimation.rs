// ABOUTME: Absence activity estimation configuration
// ABOUTME: Baseline window, data sufficiency, variation band, confidence decay, XP fractions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use serde::{Deserialize, Serialize};

/// Estimation of activity during an absence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimationConfig {
    /// Trailing window for baselines (days)
    pub baseline_window_days: i64,
    /// Distinct active days needed before history replaces the defaults
    pub min_active_days: u32,
    /// Maximum days estimated per absence
    pub max_estimated_days: u32,
    /// Lower edge of the per-day variation factor
    pub variation_min: f64,
    /// Upper edge of the per-day variation factor
    pub variation_max: f64,
    /// Confidence lost per day of absence
    pub confidence_decay_per_day: f64,
    /// Floor of the day-decay factor
    pub min_decay_factor: f64,
    /// Active-day thresholds for the quality buckets
    pub quality_thresholds: QualityThresholds,
    /// Share of normal XP per quality bucket
    pub xp_fractions: XpFractions,
}

/// Active days needed for each quality bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityThresholds {
    /// Minimum active days for `excellent`
    pub excellent_days: u32,
    /// Minimum active days for `good`
    pub good_days: u32,
    /// Minimum active days for `fair`
    pub fair_days: u32,
}

/// XP fraction and base confidence per quality bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpFractions {
    /// Fraction for `excellent`
    pub excellent: f64,
    /// Fraction for `good`
    pub good: f64,
    /// Fraction for `fair`
    pub fair: f64,
    /// Fraction for `poor`
    pub poor: f64,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            baseline_window_days: 30,
            min_active_days: 7,
            max_estimated_days: 14,
            variation_min: 0.90,
            variation_max: 1.10,
            confidence_decay_per_day: 0.03,
            min_decay_factor: 0.3,
            quality_thresholds: QualityThresholds {
                excellent_days: 21,
                good_days: 14,
                fair_days: 7,
            },
            xp_fractions: XpFractions {
                excellent: 0.70,
                good: 0.65,
                fair: 0.60,
                poor: 0.50,
            },
        }
    }
}
