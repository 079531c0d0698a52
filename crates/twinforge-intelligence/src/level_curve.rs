// ABOUTME: XP-to-level curve with banded per-level costs
// ABOUTME: Provides level lookup, inverse threshold lookup, and level progress
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! Level curve
//!
//! Leveling from `L` to `L + 1` costs a fixed amount of XP that depends on the
//! band `L` falls into. Past the fixed band table the cost grows by a step
//! every block of levels, with no upper bound. Level 1 starts at 0 XP.

use serde::{Deserialize, Serialize};
use twinforge_core::constants::level_curve::{
    BANDS, FIXED_BANDS_MAX_LEVEL, OPEN_BAND_BASE_COST, OPEN_BAND_COST_STEP, OPEN_BAND_STEP_LEVELS,
};

/// XP cost of advancing from `level` to `level + 1`
#[must_use]
pub fn level_cost(level: u32) -> u64 {
    let level = level.max(1);
    BANDS
        .iter()
        .find(|(last_level, _)| level <= *last_level)
        .map_or_else(
            || {
                let blocks = (level - FIXED_BANDS_MAX_LEVEL - 1) / OPEN_BAND_STEP_LEVELS;
                OPEN_BAND_BASE_COST + OPEN_BAND_COST_STEP * u64::from(blocks)
            },
            |(_, cost)| *cost,
        )
}

/// Cumulative XP at which `level` is reached; `xp_for_level(1) == 0`
#[must_use]
pub fn xp_for_level(level: u32) -> u64 {
    let target = level.max(1);
    let mut total = 0_u64;
    let mut first_level = 1_u32;

    for (last_level, cost) in BANDS {
        if target <= first_level {
            return total;
        }
        let levels = target.min(last_level + 1) - first_level;
        total = total.saturating_add(u64::from(levels).saturating_mul(cost));
        first_level = last_level + 1;
    }

    while first_level < target {
        let block_end = first_level + OPEN_BAND_STEP_LEVELS;
        let levels = target.min(block_end) - first_level;
        total = total.saturating_add(u64::from(levels).saturating_mul(level_cost(first_level)));
        first_level = block_end;
    }
    total
}

/// Highest level whose cumulative threshold is at most `total_xp`
#[must_use]
pub fn level_for_xp(total_xp: u64) -> u32 {
    let mut level = 1_u32;
    let mut threshold = 0_u64;

    for (last_level, cost) in BANDS {
        let band_levels = u64::from(last_level + 1 - level);
        let band_xp = band_levels * cost;
        if total_xp < threshold + band_xp {
            return level + u32::try_from((total_xp - threshold) / cost).unwrap_or(0);
        }
        threshold += band_xp;
        level = last_level + 1;
    }

    loop {
        let cost = level_cost(level);
        let block_xp = u64::from(OPEN_BAND_STEP_LEVELS).saturating_mul(cost);
        match threshold.checked_add(block_xp) {
            Some(next) if total_xp >= next && level < u32::MAX - OPEN_BAND_STEP_LEVELS => {
                threshold = next;
                level += OPEN_BAND_STEP_LEVELS;
            }
            _ => {
                let within = u32::try_from((total_xp - threshold) / cost).unwrap_or(u32::MAX);
                return level.saturating_add(within);
            }
        }
    }
}

/// XP still needed to reach the next level
#[must_use]
pub fn xp_to_next_level(total_xp: u64) -> u64 {
    xp_for_level(level_for_xp(total_xp) + 1).saturating_sub(total_xp)
}

/// Position of a user within the level curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    /// Current level
    pub level: u32,
    /// Cumulative XP
    pub total_xp: u64,
    /// XP earned since the current level was reached
    pub xp_into_level: u64,
    /// XP the current level costs in total
    pub xp_required: u64,
    /// `xp_into_level / xp_required` as a percentage
    pub percent: f64,
}

impl LevelProgress {
    /// Progress for a cumulative XP total
    #[must_use]
    pub fn from_xp(total_xp: u64) -> Self {
        let level = level_for_xp(total_xp);
        let xp_into_level = total_xp - xp_for_level(level);
        let xp_required = level_cost(level);
        Self {
            level,
            total_xp,
            xp_into_level,
            xp_required,
            percent: xp_into_level as f64 / xp_required as f64 * 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(999), 10);
        assert_eq!(level_for_xp(1000), 11);
        // 1000 + 15 * 150
        assert_eq!(xp_for_level(26), 3250);
        assert_eq!(level_for_xp(3249), 25);
        assert_eq!(level_for_xp(3250), 26);
    }

    #[test]
    fn test_open_band_costs() {
        assert_eq!(level_cost(100), 500);
        assert_eq!(level_cost(101), 600);
        assert_eq!(level_cost(110), 600);
        assert_eq!(level_cost(111), 650);
        assert_eq!(level_cost(121), 700);
    }

    #[test]
    fn test_inverse_is_consistent() {
        for level in 1..=400 {
            let threshold = xp_for_level(level);
            assert_eq!(level_for_xp(threshold), level, "threshold of {level}");
            if threshold > 0 {
                assert_eq!(level_for_xp(threshold - 1), level - 1);
            }
        }
    }

    #[test]
    fn test_monotonic() {
        let mut previous = level_for_xp(0);
        for xp in (0..200_000).step_by(37) {
            let level = level_for_xp(xp);
            assert!(level >= previous);
            previous = level;
        }
    }

    #[test]
    fn test_progress() {
        let progress = LevelProgress::from_xp(1075);
        assert_eq!(progress.level, 11);
        assert_eq!(progress.xp_into_level, 75);
        assert_eq!(progress.xp_required, 150);
        assert!((progress.percent - 50.0).abs() < 1e-9);
        assert_eq!(xp_to_next_level(1075), 75);
    }
}
