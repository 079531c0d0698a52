// ABOUTME: Assembles the activity snapshot, streak, and daily consistency a user is scored on
// ABOUTME: Domain aggregates are loaded concurrently and extras are derived from the trailing window
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use crate::constants::snapshot::{
    BODY_SCAN_RECENT_DAYS, EXTRAS_WINDOW_DAYS, FASTING_RECENT_DAYS, NUTRITION_RECENT_DAYS,
    TRAINING_RECENT_DAYS, WEARABLE_RECENT_DAYS,
};
use crate::database_plugins::EngagementStore;
use crate::errors::AppResult;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};
use twinforge_core::models::{
    ActivityKind, ActivityRecord, ActivitySnapshot, BodyScanExtras, FastingExtras,
    NutritionExtras, ObjectiveType, UserContext, WearableExtras,
};
use uuid::Uuid;

/// How far back active days are read when counting a streak
const STREAK_LOOKBACK_DAYS: i64 = 365;

/// Window of the locally computed consistency score
const CONSISTENCY_WINDOW_DAYS: i64 = 7;

/// Everything the scoring and action services read about a user
#[derive(Debug, Clone)]
pub struct EngagementContext {
    /// Snapshot; `None` when it could not be loaded
    pub snapshot: Option<ActivitySnapshot>,
    /// Active objective
    pub objective: Option<ObjectiveType>,
    /// Consecutive active days
    pub streak_days: u32,
    /// Today's consistency score (0-100)
    pub daily_consistency: f64,
}

/// Consecutive active days ending today, or ending yesterday when today has
/// no activity yet
#[must_use]
pub fn current_streak(active_days: &[NaiveDate], today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = active_days.iter().copied().collect();
    let Some(yesterday) = today.pred_opt() else {
        return 0;
    };
    let mut cursor = if days.contains(&today) {
        today
    } else {
        yesterday
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        match cursor.pred_opt() {
            Some(previous) => cursor = previous,
            None => break,
        }
    }
    streak
}

/// Share of the trailing seven days (today included) with any activity, 0-100
#[must_use]
pub fn local_consistency_score(active_days: &[NaiveDate], today: NaiveDate) -> f64 {
    let window_start = today - Duration::days(CONSISTENCY_WINDOW_DAYS - 1);
    let active: BTreeSet<&NaiveDate> = active_days
        .iter()
        .filter(|day| **day >= window_start && **day <= today)
        .collect();
    active.len() as f64 / CONSISTENCY_WINDOW_DAYS as f64 * 100.0
}

/// Builds snapshots and engagement context from the store
#[derive(Clone)]
pub struct SnapshotService {
    store: Arc<dyn EngagementStore>,
}

impl SnapshotService {
    /// Create a snapshot service over `store`
    #[must_use]
    pub fn new(store: Arc<dyn EngagementStore>) -> Self {
        Self { store }
    }

    /// Assemble the user's activity snapshot at `now`
    ///
    /// # Errors
    ///
    /// Returns an error if any of the underlying queries fails
    pub async fn build_snapshot(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<ActivitySnapshot> {
        let since = |days: i64| now - Duration::days(days);
        let extras_kinds = [
            ActivityKind::Meal,
            ActivityKind::Fasting,
            ActivityKind::Wearable,
        ];

        let (training, nutrition, body_scan, fasting, wearable, context, window) = tokio::try_join!(
            self.store.domain_aggregate(
                user_id,
                ActivityKind::Training,
                since(TRAINING_RECENT_DAYS)
            ),
            self.store
                .domain_aggregate(user_id, ActivityKind::Meal, since(NUTRITION_RECENT_DAYS)),
            self.store.domain_aggregate(
                user_id,
                ActivityKind::BodyScan,
                since(BODY_SCAN_RECENT_DAYS)
            ),
            self.store
                .domain_aggregate(user_id, ActivityKind::Fasting, since(FASTING_RECENT_DAYS)),
            self.store.domain_aggregate(
                user_id,
                ActivityKind::Wearable,
                since(WEARABLE_RECENT_DAYS)
            ),
            self.store.get_user_context(user_id),
            self.store
                .list_activities(user_id, since(EXTRAS_WINDOW_DAYS), &extras_kinds),
        )?;

        let context = context.unwrap_or_default();
        let snapshot = ActivitySnapshot {
            training,
            nutrition,
            body_scan,
            fasting,
            wearable,
            nutrition_extras: nutrition_extras(&window, &context),
            body_scan_extras: BodyScanExtras {
                has_projections: context.has_projections,
            },
            fasting_extras: fasting_extras(&window, now.date_naive()),
            wearable_extras: wearable_extras(&window),
        };

        debug!(
            user.id = %user_id,
            snapshot.data_points = snapshot.total_data_points(),
            "Activity snapshot assembled"
        );
        Ok(snapshot)
    }

    /// Consecutive active days at `now`
    ///
    /// # Errors
    ///
    /// Returns an error if the active-day query fails
    pub async fn streak_days(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u32> {
        let days = self
            .store
            .active_days(user_id, now - Duration::days(STREAK_LOOKBACK_DAYS))
            .await?;
        Ok(current_streak(&days, now.date_naive()))
    }

    /// Today's consistency score: the stored value, or one computed from the
    /// trailing week when no value is stored or the lookup fails
    pub async fn daily_consistency(&self, user_id: Uuid, now: DateTime<Utc>) -> f64 {
        let today = now.date_naive();
        match self.store.get_daily_consistency(user_id, today).await {
            Ok(Some(score)) => return score,
            Ok(None) => {}
            Err(e) => {
                warn!(user.id = %user_id, "Stored consistency unavailable, computing locally: {e}");
            }
        }

        match self
            .store
            .active_days(user_id, now - Duration::days(CONSISTENCY_WINDOW_DAYS))
            .await
        {
            Ok(days) => local_consistency_score(&days, today),
            Err(e) => {
                warn!(user.id = %user_id, "Consistency fallback failed: {e}");
                0.0
            }
        }
    }

    /// Load snapshot, objective, streak, and consistency together
    ///
    /// A snapshot that fails to load degrades to `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the objective or streak lookup fails
    pub async fn engagement_context(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<EngagementContext> {
        let snapshot = match self.build_snapshot(user_id, now).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(user.id = %user_id, "Snapshot unavailable, scoring without it: {e}");
                None
            }
        };

        let (objective, streak_days) = tokio::try_join!(
            self.store.get_active_objective(user_id),
            self.streak_days(user_id, now),
        )?;
        let daily_consistency = self.daily_consistency(user_id, now).await;

        Ok(EngagementContext {
            snapshot,
            objective: objective.map(|o| o.objective_type),
            streak_days,
            daily_consistency,
        })
    }
}

fn nutrition_extras(window: &[ActivityRecord], context: &UserContext) -> NutritionExtras {
    let mut protein_by_day: HashMap<NaiveDate, f64> = HashMap::new();
    for meal in window.iter().filter(|r| r.kind == ActivityKind::Meal) {
        *protein_by_day
            .entry(meal.occurred_at.date_naive())
            .or_default() += meal.protein_g.unwrap_or(0.0);
    }

    let avg_daily_protein_g = if protein_by_day.is_empty() {
        None
    } else {
        Some(protein_by_day.values().sum::<f64>() / protein_by_day.len() as f64)
    };

    NutritionExtras {
        avg_daily_protein_g,
        has_active_meal_plan: context.has_active_meal_plan,
        pantry_item_count: context.pantry_item_count,
    }
}

fn fasting_extras(window: &[ActivityRecord], today: NaiveDate) -> FastingExtras {
    let sessions: Vec<&ActivityRecord> = window
        .iter()
        .filter(|r| r.kind == ActivityKind::Fasting)
        .collect();
    if sessions.is_empty() {
        return FastingExtras::default();
    }

    let succeeded = sessions
        .iter()
        .filter(|r| r.succeeded.unwrap_or(false))
        .count();
    let days: Vec<NaiveDate> = sessions.iter().map(|r| r.occurred_at.date_naive()).collect();

    FastingExtras {
        current_streak_days: current_streak(&days, today),
        success_rate_percent: succeeded as f64 / sessions.len() as f64 * 100.0,
    }
}

fn wearable_extras(window: &[ActivityRecord]) -> WearableExtras {
    let wearable: Vec<&ActivityRecord> = window
        .iter()
        .filter(|r| r.kind == ActivityKind::Wearable)
        .collect();
    let heart_rates: Vec<f64> = wearable.iter().filter_map(|r| r.heart_rate_avg).collect();

    WearableExtras {
        avg_heart_rate: if heart_rates.is_empty() {
            None
        } else {
            Some(heart_rates.iter().sum::<f64>() / heart_rates.len() as f64)
        },
        total_calories_burned: wearable.iter().filter_map(|r| r.calories).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_streak_counts_back_from_today() {
        let today = day(2025, 3, 10);
        let days = [day(2025, 3, 10), day(2025, 3, 9), day(2025, 3, 8), day(2025, 3, 6)];
        assert_eq!(current_streak(&days, today), 3);
    }

    #[test]
    fn test_streak_survives_until_end_of_today() {
        let today = day(2025, 3, 10);
        let days = [day(2025, 3, 9), day(2025, 3, 8)];
        assert_eq!(current_streak(&days, today), 2);
        assert_eq!(current_streak(&[day(2025, 3, 7)], today), 0);
        assert_eq!(current_streak(&[], today), 0);
    }

    #[test]
    fn test_local_consistency_uses_trailing_week() {
        let today = day(2025, 3, 10);
        let days = [
            day(2025, 3, 10),
            day(2025, 3, 8),
            day(2025, 3, 4),
            day(2025, 3, 3),
        ];
        let score = local_consistency_score(&days, today);
        assert!((score - 300.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_extras_from_window() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let window = vec![
            ActivityRecord::meal(user_id, now, 600.0, 40.0, 60.0, 20.0),
            ActivityRecord::meal(user_id, now, 700.0, 50.0, 70.0, 25.0),
            ActivityRecord::meal(user_id, now - Duration::days(1), 500.0, 30.0, 50.0, 15.0),
            ActivityRecord::fasting(user_id, now, 960.0, true),
            ActivityRecord::fasting(user_id, now - Duration::days(1), 720.0, false),
            ActivityRecord::wearable(user_id, now, 300.0, Some(120.0)),
            ActivityRecord::wearable(user_id, now, 200.0, None),
        ];

        let nutrition = nutrition_extras(&window, &UserContext::default());
        assert_eq!(nutrition.avg_daily_protein_g, Some(60.0));

        let fasting = fasting_extras(&window, now.date_naive());
        assert_eq!(fasting.current_streak_days, 2);
        assert!((fasting.success_rate_percent - 50.0).abs() < 1e-9);

        let wearable = wearable_extras(&window);
        assert_eq!(wearable.avg_heart_rate, Some(120.0));
        assert!((wearable.total_calories_burned - 500.0).abs() < 1e-9);
    }
}
