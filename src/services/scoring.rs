// ABOUTME: Computes a user's adaptive scores from the loaded engagement context
// ABOUTME: A snapshot that fails to load yields all-zero scores instead of an error
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use super::snapshot::{EngagementContext, SnapshotService};
use crate::database_plugins::EngagementStore;
use crate::errors::AppResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use twinforge_core::models::{AdaptiveScores, ObjectiveType};
use twinforge_intelligence::{calculate_adaptive_scores, ScoringInputs};
use uuid::Uuid;

/// Scores plus the inputs they were computed from
#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    /// Owner
    pub user_id: Uuid,
    /// Adaptive scores
    pub scores: AdaptiveScores,
    /// Objective the weights came from
    pub objective: Option<ObjectiveType>,
    /// Streak used for the consistency score
    pub streak_days: u32,
    /// Daily consistency used for the consistency score
    pub daily_consistency: f64,
    /// Whether the snapshot was available
    pub snapshot_loaded: bool,
}

/// Adaptive score service
#[derive(Clone)]
pub struct ScoringService {
    snapshots: SnapshotService,
}

impl ScoringService {
    /// Create a scoring service over `store`
    #[must_use]
    pub fn new(store: Arc<dyn EngagementStore>) -> Self {
        Self {
            snapshots: SnapshotService::new(store),
        }
    }

    /// Compute adaptive scores at `now`
    ///
    /// # Errors
    ///
    /// Returns an error if the objective or streak lookup fails
    pub async fn compute_scores(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<ScoreReport> {
        let context = self.snapshots.engagement_context(user_id, now).await?;
        Ok(Self::score_context(user_id, &context, now))
    }

    /// Score an already loaded context
    #[must_use]
    pub fn score_context(
        user_id: Uuid,
        context: &EngagementContext,
        now: DateTime<Utc>,
    ) -> ScoreReport {
        let scores = calculate_adaptive_scores(
            context.snapshot.as_ref(),
            ScoringInputs {
                objective: context.objective,
                daily_consistency_score: context.daily_consistency,
                streak_days: context.streak_days,
                now,
            },
        );
        debug!(
            user.id = %user_id,
            scores.overall = scores.overall_score,
            scores.trend = scores.trend.as_str(),
            "Adaptive scores computed"
        );

        ScoreReport {
            user_id,
            scores,
            objective: context.objective,
            streak_days: context.streak_days,
            daily_consistency: context.daily_consistency,
            snapshot_loaded: context.snapshot.is_some(),
        }
    }
}
