// ABOUTME: Universal level forecast from the user's XP history
// ABOUTME: Independent of objectives; only users without any XP get no forecast
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use super::snapshot::SnapshotService;
use crate::database_plugins::EngagementStore;
use crate::errors::AppResult;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;
use twinforge_core::models::UniversalLevelPrediction;
use twinforge_intelligence::{LevelPredictor, XpHistory};
use uuid::Uuid;

/// Level prediction service
#[derive(Clone)]
pub struct LevelPredictionService {
    store: Arc<dyn EngagementStore>,
    snapshots: SnapshotService,
}

impl LevelPredictionService {
    /// Create a level prediction service over `store`
    #[must_use]
    pub fn new(store: Arc<dyn EngagementStore>) -> Self {
        Self {
            snapshots: SnapshotService::new(Arc::clone(&store)),
            store,
        }
    }

    /// Forecast the user's level at 30, 60, and 90 days
    ///
    /// # Errors
    ///
    /// Returns an error if the XP summary or streak lookup fails
    pub async fn predict_level(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<UniversalLevelPrediction>> {
        let (summary, streak_days) = tokio::try_join!(
            self.store.xp_summary(user_id, now),
            self.snapshots.streak_days(user_id, now),
        )?;

        let prediction = LevelPredictor::predict(&XpHistory {
            user_id,
            total_xp: summary.total_xp,
            event_count: summary.event_count,
            xp_last_30_days: summary.xp_last_30_days,
            xp_last_7_days: summary.xp_last_7_days,
            streak_days,
            now,
        });

        if let Some(prediction) = &prediction {
            debug!(
                user.id = %user_id,
                level.current = prediction.current_level,
                level.quality = prediction.data_quality.as_str(),
                level.fallback = prediction.is_fallback,
                "Level prediction computed"
            );
        }
        Ok(prediction)
    }
}
