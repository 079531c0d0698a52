// ABOUTME: Activity logging: stores the entry, grants its XP once, refreshes consistency and weight
// ABOUTME: XP per activity is keyed by the record id so re-logging the same record never double-awards
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use super::snapshot::local_consistency_score;
use crate::constants::xp_sources::{
    ACTIVITY, BODY_SCAN_XP, FASTING_XP, MEAL_XP, TRAINING_XP, WEARABLE_XP, WEIGHT_UPDATE_XP,
};
use crate::database_plugins::EngagementStore;
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use chrono::Duration;
use std::sync::Arc;
use twinforge_core::models::{source_key, ActivityKind, ActivityRecord, XpAward, XpEvent};

/// XP granted for logging `record`; zero for a failed fast
#[must_use]
pub fn activity_xp(record: &ActivityRecord) -> u64 {
    match record.kind {
        ActivityKind::Meal => MEAL_XP,
        ActivityKind::Training => TRAINING_XP,
        ActivityKind::WeightUpdate => WEIGHT_UPDATE_XP,
        ActivityKind::BodyScan => BODY_SCAN_XP,
        ActivityKind::Wearable => WEARABLE_XP,
        ActivityKind::Fasting if record.succeeded.unwrap_or(false) => FASTING_XP,
        ActivityKind::Fasting => 0,
    }
}

/// Result of logging one activity
#[derive(Debug, Clone)]
pub struct LoggedActivity {
    /// The stored record
    pub record: ActivityRecord,
    /// XP award, when the activity earns any
    pub xp: Option<XpAward>,
    /// Consistency score stored for the record's day
    pub daily_consistency: f64,
}

/// Records activities and their side effects
#[derive(Clone)]
pub struct ActivityService {
    store: Arc<dyn EngagementStore>,
}

impl ActivityService {
    /// Create an activity service over `store`
    #[must_use]
    pub fn new(store: Arc<dyn EngagementStore>) -> Self {
        Self { store }
    }

    /// Store `record`, award its XP, and refresh the day's consistency score
    ///
    /// Weight updates and body scans also become the profile's current weight.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a negative or non-finite weight, or an error
    /// if any store write fails
    pub async fn log_activity(&self, record: ActivityRecord) -> AppResult<LoggedActivity> {
        if let Some(weight) = record.weight_kg {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(AppError::invalid_input(format!(
                    "Weight must be a positive number, got {weight}"
                )));
            }
        }

        self.store.record_activity(&record).await?;

        let amount = activity_xp(&record);
        let xp = if amount > 0 {
            let mut event = XpEvent::new(record.user_id, source_key(ACTIVITY, record.id), amount);
            event.occurred_at = record.occurred_at;
            let award = self.store.award_xp(&event).await?;
            AppLogger::log_xp_award(
                record.user_id,
                &award.event.source_key,
                award.event.amount,
                award.newly_awarded,
            );
            Some(award)
        } else {
            None
        };

        if let (ActivityKind::WeightUpdate | ActivityKind::BodyScan, Some(weight)) =
            (record.kind, record.weight_kg)
        {
            self.store
                .update_current_weight(record.user_id, weight, record.occurred_at)
                .await?;
        }

        let day = record.occurred_at.date_naive();
        let active_days = self
            .store
            .active_days(record.user_id, record.occurred_at - Duration::days(7))
            .await?;
        let daily_consistency = local_consistency_score(&active_days, day);
        self.store
            .upsert_daily_consistency(record.user_id, day, daily_consistency)
            .await?;

        Ok(LoggedActivity {
            record,
            xp,
            daily_consistency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_failed_fast_earns_nothing() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        assert_eq!(
            activity_xp(&ActivityRecord::fasting(user_id, now, 600.0, false)),
            0
        );
        assert_eq!(
            activity_xp(&ActivityRecord::fasting(user_id, now, 960.0, true)),
            FASTING_XP
        );
        assert_eq!(
            activity_xp(&ActivityRecord::training(user_id, now, 45.0, 400.0)),
            TRAINING_XP
        );
    }
}
