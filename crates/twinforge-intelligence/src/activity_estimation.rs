// ABOUTME: Estimation of what a user probably did during an absence
// ABOUTME: Trailing baselines, quality buckets, seeded per-day variation, decaying confidence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! Activity estimation
//!
//! Baselines are averaged over the days the user was active in the trailing
//! window. With too few active days the hardcoded defaults are used instead.
//! Each estimated day scales the baseline by a factor drawn uniformly from the
//! configured variation band using a caller-supplied RNG, so a fixed seed
//! reproduces the same estimates.

use crate::config::EstimationConfig;
use chrono::{DateTime, Days, NaiveDate, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use twinforge_core::constants::estimation_defaults;
use twinforge_core::models::{
    ActivityBaseline, ActivityKind, ActivityRecord, DailyEstimate, DataQuality, EstimatedActivity,
    PendingXpReward, RewardStatus, XpEvent,
};
use uuid::Uuid;

/// RNG used for estimation; seeded from `seed` when given, from entropy otherwise
#[must_use]
pub fn estimation_rng(seed: Option<u64>) -> ChaCha8Rng {
    seed.map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64)
}

/// Activity estimator
pub struct ActivityEstimator;

impl ActivityEstimator {
    /// Baseline from records and XP events in the trailing window
    #[must_use]
    pub fn baseline(
        records: &[ActivityRecord],
        xp_events: &[XpEvent],
        now: DateTime<Utc>,
        config: &EstimationConfig,
    ) -> ActivityBaseline {
        let window_start = now - chrono::Duration::days(config.baseline_window_days);
        let in_window: Vec<&ActivityRecord> = records
            .iter()
            .filter(|r| r.occurred_at >= window_start && r.occurred_at <= now)
            .collect();

        let active_days: HashSet<NaiveDate> =
            in_window.iter().map(|r| r.occurred_at.date_naive()).collect();
        let active_day_count = u32::try_from(active_days.len()).unwrap_or(u32::MAX);

        if active_day_count < config.min_active_days {
            return Self::default_baseline(active_day_count);
        }

        let days = f64::from(active_day_count);
        let sum = |kind: &[ActivityKind], field: fn(&ActivityRecord) -> Option<f64>| -> f64 {
            in_window
                .iter()
                .filter(|r| kind.contains(&r.kind))
                .filter_map(|r| field(r))
                .sum()
        };
        let count = |kind: ActivityKind| in_window.iter().filter(|r| r.kind == kind).count() as f64;

        let xp_total: u64 = xp_events
            .iter()
            .filter(|e| e.occurred_at >= window_start && e.occurred_at <= now)
            .map(|e| e.amount)
            .sum();

        ActivityBaseline {
            calories_in: sum(&[ActivityKind::Meal], |r| r.calories) / days,
            calories_out: sum(&[ActivityKind::Training, ActivityKind::Wearable], |r| r.calories)
                / days,
            protein_g: sum(&[ActivityKind::Meal], |r| r.protein_g) / days,
            carbs_g: sum(&[ActivityKind::Meal], |r| r.carbs_g) / days,
            fat_g: sum(&[ActivityKind::Meal], |r| r.fat_g) / days,
            trainings_per_week: count(ActivityKind::Training) / config.baseline_window_days as f64
                * 7.0,
            meals_per_day: count(ActivityKind::Meal) / days,
            daily_xp: xp_total as f64 / days,
            active_days: active_day_count,
            has_sufficient_data: true,
        }
    }

    fn default_baseline(active_days: u32) -> ActivityBaseline {
        ActivityBaseline {
            calories_in: estimation_defaults::CALORIES_IN,
            calories_out: estimation_defaults::CALORIES_OUT,
            protein_g: estimation_defaults::PROTEIN_G,
            carbs_g: estimation_defaults::CARBS_G,
            fat_g: estimation_defaults::FAT_G,
            trainings_per_week: estimation_defaults::TRAININGS_PER_WEEK,
            meals_per_day: estimation_defaults::MEALS_PER_DAY,
            daily_xp: estimation_defaults::DAILY_XP,
            active_days,
            has_sufficient_data: false,
        }
    }

    /// Quality bucket from the number of active days
    #[must_use]
    pub fn quality(baseline: &ActivityBaseline, config: &EstimationConfig) -> DataQuality {
        let thresholds = &config.quality_thresholds;
        if !baseline.has_sufficient_data {
            DataQuality::Poor
        } else if baseline.active_days >= thresholds.excellent_days {
            DataQuality::Excellent
        } else if baseline.active_days >= thresholds.good_days {
            DataQuality::Good
        } else if baseline.active_days >= thresholds.fair_days {
            DataQuality::Fair
        } else {
            DataQuality::Poor
        }
    }

    /// Share of normal XP granted for estimated days
    #[must_use]
    pub const fn xp_fraction(quality: DataQuality, config: &EstimationConfig) -> f64 {
        match quality {
            DataQuality::Excellent => config.xp_fractions.excellent,
            DataQuality::Good => config.xp_fractions.good,
            DataQuality::Fair => config.xp_fractions.fair,
            DataQuality::Poor => config.xp_fractions.poor,
        }
    }

    const fn base_confidence(quality: DataQuality) -> f64 {
        match quality {
            DataQuality::Excellent => 0.9,
            DataQuality::Good => 0.75,
            DataQuality::Fair => 0.6,
            DataQuality::Poor => 0.4,
        }
    }

    /// Draw one variation factor from the configured band
    pub fn variation<R: Rng + ?Sized>(rng: &mut R, config: &EstimationConfig) -> f64 {
        rng.gen_range(config.variation_min..=config.variation_max)
    }

    /// Estimate one absent day; day 0 is the first day after the latest activity
    pub fn estimate_day<R: Rng + ?Sized>(
        baseline: &ActivityBaseline,
        quality: DataQuality,
        absence_start: DateTime<Utc>,
        day_index: u32,
        rng: &mut R,
        config: &EstimationConfig,
    ) -> DailyEstimate {
        let variation = Self::variation(rng, config);
        let decay = config
            .confidence_decay_per_day
            .mul_add(-f64::from(day_index + 1), 1.0)
            .max(config.min_decay_factor);
        let date = absence_start
            .date_naive()
            .checked_add_days(Days::new(u64::from(day_index) + 1))
            .unwrap_or(NaiveDate::MAX);

        DailyEstimate {
            day_index,
            date,
            variation,
            calories_in: baseline.calories_in * variation,
            calories_out: baseline.calories_out * variation,
            protein_g: baseline.protein_g * variation,
            carbs_g: baseline.carbs_g * variation,
            fat_g: baseline.fat_g * variation,
            training_sessions: baseline.trainings_per_week / 7.0 * variation,
            meals: baseline.meals_per_day * variation,
            estimated_xp: (baseline.daily_xp * variation).round().max(0.0) as u64,
            confidence: Self::base_confidence(quality) * decay,
        }
    }

    /// Estimate (or extend) the absence up to `days_absent`, capped by configuration
    ///
    /// Days already present in `existing` are kept untouched; only missing day
    /// indices are appended. Returns the blob and the newly added days.
    pub fn estimate<R: Rng + ?Sized>(
        existing: Option<EstimatedActivity>,
        baseline: ActivityBaseline,
        absence_start: DateTime<Utc>,
        days_absent: u32,
        now: DateTime<Utc>,
        rng: &mut R,
        config: &EstimationConfig,
    ) -> (EstimatedActivity, Vec<DailyEstimate>) {
        let mut estimated = existing.unwrap_or_else(|| {
            let data_quality = Self::quality(&baseline, config);
            EstimatedActivity {
                xp_fraction: Self::xp_fraction(data_quality, config),
                data_quality,
                baseline,
                days: Vec::new(),
                generated_at: now,
            }
        });

        let target = days_absent.min(config.max_estimated_days);
        let already = estimated.estimated_day_count();
        let added: Vec<DailyEstimate> = (already..target)
            .map(|day_index| {
                Self::estimate_day(
                    &estimated.baseline,
                    estimated.data_quality,
                    absence_start,
                    day_index,
                    rng,
                    config,
                )
            })
            .collect();

        if !added.is_empty() {
            estimated.days.extend(added.iter().cloned());
            estimated.generated_at = now;
        }
        (estimated, added)
    }

    /// Pending reward for an estimated day at the blob's XP fraction
    #[must_use]
    pub fn pending_reward(
        user_id: Uuid,
        absence_log_id: Uuid,
        day: &DailyEstimate,
        xp_fraction: f64,
        now: DateTime<Utc>,
    ) -> PendingXpReward {
        PendingXpReward {
            id: Uuid::new_v4(),
            user_id,
            absence_log_id,
            day_index: day.day_index,
            estimated_date: day.date,
            base_estimated_xp: day.estimated_xp,
            multiplier: xp_fraction,
            final_xp: (day.estimated_xp as f64 * xp_fraction).round() as u64,
            status: RewardStatus::Pending,
            created_at: now,
            awarded_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn history(active_days: i64, now: DateTime<Utc>) -> Vec<ActivityRecord> {
        let user_id = Uuid::new_v4();
        (0..active_days)
            .flat_map(|day| {
                let at = now - Duration::days(day + 1);
                [
                    ActivityRecord::meal(user_id, at, 2400.0, 150.0, 250.0, 80.0),
                    ActivityRecord::training(user_id, at, 45.0, 400.0),
                ]
            })
            .collect()
    }

    #[test]
    fn test_insufficient_history_uses_defaults() {
        let now = Utc::now();
        let config = EstimationConfig::default();
        let baseline = ActivityEstimator::baseline(&history(3, now), &[], now, &config);
        assert!(!baseline.has_sufficient_data);
        assert!((baseline.calories_in - 2000.0).abs() < f64::EPSILON);
        assert_eq!(ActivityEstimator::quality(&baseline, &config), DataQuality::Poor);
        assert!((ActivityEstimator::xp_fraction(DataQuality::Poor, &config) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_history_baseline() {
        let now = Utc::now();
        let config = EstimationConfig::default();
        let baseline = ActivityEstimator::baseline(&history(21, now), &[], now, &config);
        assert!(baseline.has_sufficient_data);
        assert_eq!(baseline.active_days, 21);
        assert!((baseline.calories_in - 2400.0).abs() < 1e-9);
        assert!((baseline.calories_out - 400.0).abs() < 1e-9);
        assert!((baseline.trainings_per_week - 4.9).abs() < 1e-9);
        assert_eq!(
            ActivityEstimator::quality(&baseline, &config),
            DataQuality::Excellent
        );
    }

    #[test]
    fn test_variation_stays_in_band() {
        let config = EstimationConfig::default();
        let mut rng = estimation_rng(Some(7));
        for _ in 0..1000 {
            let v = ActivityEstimator::variation(&mut rng, &config);
            assert!((0.90..=1.10).contains(&v), "variation {v}");
        }
    }

    #[test]
    fn test_fixed_seed_reproduces_estimates() {
        let now = Utc::now();
        let config = EstimationConfig::default();
        let baseline = ActivityEstimator::baseline(&[], &[], now, &config);
        let start = now - Duration::days(5);
        let (first, _) = ActivityEstimator::estimate(
            None,
            baseline.clone(),
            start,
            5,
            now,
            &mut estimation_rng(Some(42)),
            &config,
        );
        let (second, _) = ActivityEstimator::estimate(
            None,
            baseline,
            start,
            5,
            now,
            &mut estimation_rng(Some(42)),
            &config,
        );
        assert_eq!(first, second);
        assert_eq!(first.days.len(), 5);
    }

    #[test]
    fn test_extension_only_appends_missing_days_and_caps() {
        let now = Utc::now();
        let config = EstimationConfig::default();
        let baseline = ActivityEstimator::baseline(&[], &[], now, &config);
        let start = now - Duration::days(20);
        let mut rng = estimation_rng(Some(1));
        let (initial, added) =
            ActivityEstimator::estimate(None, baseline.clone(), start, 4, now, &mut rng, &config);
        assert_eq!(added.len(), 4);
        let (extended, added) = ActivityEstimator::estimate(
            Some(initial.clone()),
            baseline,
            start,
            20,
            now,
            &mut rng,
            &config,
        );
        assert_eq!(added.len(), 10);
        assert_eq!(extended.days.len(), 14);
        assert_eq!(extended.days[..4], initial.days[..]);
        assert!(extended.days.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    }

    #[test]
    fn test_pending_reward_applies_fraction() {
        let now = Utc::now();
        let config = EstimationConfig::default();
        let baseline = ActivityEstimator::baseline(&[], &[], now, &config);
        let day = ActivityEstimator::estimate_day(
            &baseline,
            DataQuality::Poor,
            now,
            0,
            &mut estimation_rng(Some(3)),
            &config,
        );
        let reward = ActivityEstimator::pending_reward(Uuid::new_v4(), Uuid::new_v4(), &day, 0.5, now);
        assert_eq!(reward.final_xp, (day.estimated_xp as f64 * 0.5).round() as u64);
        assert_eq!(reward.status, RewardStatus::Pending);
    }
}
