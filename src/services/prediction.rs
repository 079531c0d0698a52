// ABOUTME: Generates and persists a user's transformation prediction on demand
// ABOUTME: Loads profile, objective, weight history, and influence counts, then projects
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use super::snapshot::SnapshotService;
use crate::constants::prediction::{INFLUENCE_WINDOW_DAYS, WEIGHT_LOOKBACK_DAYS};
use crate::database_plugins::EngagementStore;
use crate::errors::AppResult;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use twinforge_core::models::{ActivityKind, TransformationPrediction};
use twinforge_intelligence::{project_transformation, PredictionInput};
use uuid::Uuid;

/// Transformation prediction service
#[derive(Clone)]
pub struct TransformationPredictionService {
    store: Arc<dyn EngagementStore>,
    snapshots: SnapshotService,
}

impl TransformationPredictionService {
    /// Create a prediction service over `store`
    #[must_use]
    pub fn new(store: Arc<dyn EngagementStore>) -> Self {
        Self {
            snapshots: SnapshotService::new(Arc::clone(&store)),
            store,
        }
    }

    /// Project the user's weight trajectory and store it as the active prediction
    ///
    /// Returns `Ok(None)` when there is no profile weight, no target, fewer
    /// than two weight points, or a trend too flat to project.
    ///
    /// # Errors
    ///
    /// Returns an error if loading inputs or persisting the prediction fails
    pub async fn generate_prediction(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<TransformationPrediction>> {
        let influence_since = now - Duration::days(INFLUENCE_WINDOW_DAYS);
        let (profile, objective, weight_points, activities, meals, streak_days) = tokio::try_join!(
            self.store.get_profile(user_id),
            self.store.get_active_objective(user_id),
            self.store
                .weight_points(user_id, now - Duration::days(WEIGHT_LOOKBACK_DAYS)),
            self.store.list_activities(
                user_id,
                influence_since,
                &[ActivityKind::Training, ActivityKind::Wearable]
            ),
            self.store
                .list_activities(user_id, influence_since, &[ActivityKind::Meal]),
            self.snapshots.streak_days(user_id, now),
        )?;

        let target_weight = profile
            .as_ref()
            .and_then(|p| p.target_weight_kg)
            .or_else(|| objective.as_ref().and_then(|o| o.target_value));

        let input = PredictionInput {
            user_id,
            current_weight: profile.as_ref().and_then(|p| p.current_weight_kg),
            target_weight,
            objective: objective.as_ref().map(|o| o.objective_type),
            weight_points: &weight_points,
            activity_count: u32::try_from(activities.len()).unwrap_or(u32::MAX),
            streak_days,
            meal_count: u32::try_from(meals.len()).unwrap_or(u32::MAX),
            now,
        };

        let Some(prediction) = project_transformation(&input) else {
            debug!(
                user.id = %user_id,
                weight.points = weight_points.len(),
                "Transformation prediction preconditions not met"
            );
            return Ok(None);
        };

        self.store.save_prediction(&prediction).await?;
        info!(
            user.id = %user_id,
            prediction.weekly_trend = prediction.weekly_trend,
            prediction.days_to_target = prediction.days_to_target,
            prediction.confidence = prediction.confidence_score,
            "Transformation prediction generated"
        );
        Ok(Some(prediction))
    }

    /// The currently active prediction, without regenerating
    ///
    /// # Errors
    ///
    /// Returns an error if the store lookup fails
    pub async fn active_prediction(
        &self,
        user_id: Uuid,
    ) -> AppResult<Option<TransformationPrediction>> {
        self.store.get_active_prediction(user_id).await
    }
}
