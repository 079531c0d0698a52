// ABOUTME: Goal-independent XP and level forecasting from the trailing XP rate
// ABOUTME: Data quality assessment, 30/60/90-day projections, primary horizon, confidence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use crate::level_curve::{level_for_xp, xp_to_next_level};
use chrono::{DateTime, Utc};
use twinforge_core::constants::level_prediction::{
    CONSERVATIVE_MULTIPLIER, FAST_PACE_XP_PER_DAY, HORIZONS, OPTIMISTIC_MULTIPLIER,
    RATE_WINDOW_DAYS, REALISTIC_MULTIPLIER, STEADY_PACE_XP_PER_DAY,
};
use twinforge_core::models::{
    DataQuality, LevelProjection, ProjectionMethod, UniversalLevelPrediction,
};
use uuid::Uuid;

/// `(min_events, min_avg_xp_per_day, quality)` checked in order
const QUALITY_BUCKETS: [(u32, f64, DataQuality); 3] = [
    (50, 50.0, DataQuality::Excellent),
    (20, 20.0, DataQuality::Good),
    (5, 5.0, DataQuality::Fair),
];

/// Maximum confidence bonus from the streak
const MAX_STREAK_BONUS: f64 = 20.0;

/// Confidence bonus per streak day
const STREAK_BONUS_PER_DAY: f64 = 2.0;

/// XP history summary used for the forecast
#[derive(Debug, Clone, Copy)]
pub struct XpHistory {
    /// Owner
    pub user_id: Uuid,
    /// Cumulative XP
    pub total_xp: u64,
    /// All-time number of XP events
    pub event_count: u32,
    /// XP earned in the trailing 30 days
    pub xp_last_30_days: u64,
    /// XP earned in the trailing 7 days
    pub xp_last_7_days: u64,
    /// Current streak in days
    pub streak_days: u32,
    /// Evaluation instant
    pub now: DateTime<Utc>,
}

/// Level predictor
pub struct LevelPredictor;

impl LevelPredictor {
    /// Forecast the user's level; `None` only without any XP history
    #[must_use]
    pub fn predict(history: &XpHistory) -> Option<UniversalLevelPrediction> {
        if history.event_count == 0 {
            return None;
        }

        let average_xp_per_day = history.xp_last_30_days as f64 / RATE_WINDOW_DAYS as f64;
        let data_quality = Self::assess_quality(history.event_count, average_xp_per_day);
        let is_fallback = data_quality == DataQuality::Poor;

        let projections: Vec<LevelProjection> = HORIZONS
            .iter()
            .map(|days| {
                let method = if is_fallback {
                    ProjectionMethod::Conservative
                } else {
                    Self::method_for_horizon(*days)
                };
                Self::project(history.total_xp, average_xp_per_day, *days, method)
            })
            .collect();

        let primary_index = Self::primary_index(average_xp_per_day);
        let primary = projections.get(primary_index).copied()?;

        let confidence_score = if is_fallback {
            Self::base_confidence(DataQuality::Poor)
        } else {
            Self::confidence(data_quality, history.streak_days, average_xp_per_day)
        };

        Some(UniversalLevelPrediction {
            user_id: history.user_id,
            current_xp: history.total_xp,
            current_level: level_for_xp(history.total_xp),
            xp_to_next_level: xp_to_next_level(history.total_xp),
            average_xp_per_day,
            xp_last_30_days: history.xp_last_30_days,
            xp_last_7_days: history.xp_last_7_days,
            projections,
            primary,
            data_quality,
            confidence_score,
            is_fallback,
            generated_at: history.now,
        })
    }

    /// Quality bucket from event count and daily XP
    #[must_use]
    pub fn assess_quality(event_count: u32, average_xp_per_day: f64) -> DataQuality {
        QUALITY_BUCKETS
            .iter()
            .find(|(min_events, min_avg, _)| {
                event_count >= *min_events && average_xp_per_day >= *min_avg
            })
            .map_or(DataQuality::Poor, |(_, _, quality)| *quality)
    }

    const fn method_for_horizon(days: i64) -> ProjectionMethod {
        match days {
            ..=30 => ProjectionMethod::Conservative,
            31..=60 => ProjectionMethod::Realistic,
            _ => ProjectionMethod::Optimistic,
        }
    }

    const fn multiplier(method: ProjectionMethod) -> f64 {
        match method {
            ProjectionMethod::Conservative => CONSERVATIVE_MULTIPLIER,
            ProjectionMethod::Realistic => REALISTIC_MULTIPLIER,
            ProjectionMethod::Optimistic => OPTIMISTIC_MULTIPLIER,
        }
    }

    fn project(
        total_xp: u64,
        average_xp_per_day: f64,
        days: i64,
        method: ProjectionMethod,
    ) -> LevelProjection {
        let gained = (average_xp_per_day * days as f64 * Self::multiplier(method))
            .round()
            .max(0.0) as u64;
        let projected_xp = total_xp.saturating_add(gained);
        let projected_level = level_for_xp(projected_xp);
        LevelProjection {
            days,
            method,
            projected_xp,
            projected_level,
            levels_gained: projected_level - level_for_xp(total_xp),
        }
    }

    fn primary_index(average_xp_per_day: f64) -> usize {
        if average_xp_per_day >= FAST_PACE_XP_PER_DAY {
            0
        } else if average_xp_per_day >= STEADY_PACE_XP_PER_DAY {
            1
        } else {
            2
        }
    }

    const fn base_confidence(quality: DataQuality) -> f64 {
        match quality {
            DataQuality::Excellent => 60.0,
            DataQuality::Good => 45.0,
            DataQuality::Fair => 30.0,
            DataQuality::Poor => 15.0,
        }
    }

    fn confidence(quality: DataQuality, streak_days: u32, average_xp_per_day: f64) -> f64 {
        let streak_bonus = (f64::from(streak_days) * STREAK_BONUS_PER_DAY).min(MAX_STREAK_BONUS);
        let pace_bonus = if average_xp_per_day >= FAST_PACE_XP_PER_DAY {
            20.0
        } else if average_xp_per_day >= STEADY_PACE_XP_PER_DAY {
            10.0
        } else if average_xp_per_day > 0.0 {
            5.0
        } else {
            0.0
        };
        (Self::base_confidence(quality) + streak_bonus + pace_bonus).min(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(event_count: u32, xp_last_30_days: u64, streak_days: u32) -> XpHistory {
        XpHistory {
            user_id: Uuid::new_v4(),
            total_xp: 1000,
            event_count,
            xp_last_30_days,
            xp_last_7_days: xp_last_30_days / 4,
            streak_days,
            now: Utc::now(),
        }
    }

    #[test]
    fn test_no_history_is_none() {
        assert!(LevelPredictor::predict(&history(0, 0, 0)).is_none());
    }

    #[test]
    fn test_quality_buckets() {
        assert_eq!(LevelPredictor::assess_quality(60, 80.0), DataQuality::Excellent);
        assert_eq!(LevelPredictor::assess_quality(60, 30.0), DataQuality::Good);
        assert_eq!(LevelPredictor::assess_quality(10, 30.0), DataQuality::Fair);
        assert_eq!(LevelPredictor::assess_quality(3, 300.0), DataQuality::Poor);
    }

    #[test]
    fn test_fast_pace_uses_thirty_day_primary() {
        // 3600 / 30 = 120 XP per day
        let prediction = LevelPredictor::predict(&history(80, 3600, 15)).unwrap();
        assert_eq!(prediction.data_quality, DataQuality::Excellent);
        assert_eq!(prediction.primary.days, 30);
        assert_eq!(prediction.primary.method, ProjectionMethod::Conservative);
        // 1000 + 120 * 30 * 0.8
        assert_eq!(prediction.primary.projected_xp, 3880);
        assert!((prediction.confidence_score - 100.0).abs() < f64::EPSILON);
        assert_eq!(prediction.projections[2].method, ProjectionMethod::Optimistic);
    }

    #[test]
    fn test_poor_quality_returns_conservative_fallback() {
        let prediction = LevelPredictor::predict(&history(2, 60, 1)).unwrap();
        assert!(prediction.is_fallback);
        assert!(prediction
            .projections
            .iter()
            .all(|p| p.method == ProjectionMethod::Conservative));
        assert!((prediction.confidence_score - 15.0).abs() < f64::EPSILON);
        assert_eq!(prediction.primary.days, 90);
    }

    #[test]
    fn test_projections_never_go_backwards() {
        let prediction = LevelPredictor::predict(&history(25, 900, 3)).unwrap();
        let levels: Vec<u32> = prediction.projections.iter().map(|p| p.projected_level).collect();
        assert!(levels.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(levels[0] >= prediction.current_level);
    }
}
