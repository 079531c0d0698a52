// ABOUTME: SQLite implementation of the engagement store
// ABOUTME: Thin delegation to the Database manager
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! SQLite database implementation
//!
//! This module wraps the SQLite `Database` manager to implement the
//! `EngagementStore` trait.

use super::EngagementStore;
use crate::database::Database;
use crate::errors::AppResult;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use twinforge_core::models::{
    AbsenceLog, AbsenceReconciliation, AbsenceStatus, ActivityKind, ActivityRecord,
    DashboardAction, DomainAggregate, EstimatedActivity, PendingXpReward, ReconciliationIntent,
    TransformationObjective, TransformationPrediction, UserContext, UserProfile, WeightPoint,
    XpAward, XpEvent, XpSummary,
};
use uuid::Uuid;

/// SQLite database implementation
#[derive(Clone)]
pub struct SqliteEngagementStore {
    /// The underlying database instance
    inner: Database,
}

impl SqliteEngagementStore {
    /// Connect to `database_url` and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let inner = Database::new(database_url).await?;
        Ok(Self { inner })
    }

    /// Get a reference to the inner database
    #[must_use]
    pub const fn inner(&self) -> &Database {
        &self.inner
    }
}

#[async_trait]
impl EngagementStore for SqliteEngagementStore {
    async fn migrate(&self) -> AppResult<()> {
        self.inner.migrate().await
    }

    async fn record_activity(&self, record: &ActivityRecord) -> AppResult<()> {
        self.inner.record_activity(record).await
    }

    async fn list_activities(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        kinds: &[ActivityKind],
    ) -> AppResult<Vec<ActivityRecord>> {
        self.inner.list_activities(user_id, since, kinds).await
    }

    async fn latest_activity_at(&self, user_id: Uuid) -> AppResult<Option<DateTime<Utc>>> {
        self.inner.latest_activity_at(user_id).await
    }

    async fn domain_aggregate(
        &self,
        user_id: Uuid,
        kind: ActivityKind,
        recent_since: DateTime<Utc>,
    ) -> AppResult<DomainAggregate> {
        self.inner
            .domain_aggregate(user_id, kind, recent_since)
            .await
    }

    async fn active_days(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<Vec<NaiveDate>> {
        self.inner.active_days(user_id, since).await
    }

    async fn weight_points(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<WeightPoint>> {
        self.inner.weight_points(user_id, since).await
    }

    async fn upsert_user_context(&self, context: &UserContext) -> AppResult<()> {
        self.inner.upsert_user_context(context).await
    }

    async fn get_user_context(&self, user_id: Uuid) -> AppResult<Option<UserContext>> {
        self.inner.get_user_context(user_id).await
    }

    async fn upsert_daily_consistency(
        &self,
        user_id: Uuid,
        day: NaiveDate,
        score: f64,
    ) -> AppResult<()> {
        self.inner.upsert_daily_consistency(user_id, day, score).await
    }

    async fn get_daily_consistency(
        &self,
        user_id: Uuid,
        day: NaiveDate,
    ) -> AppResult<Option<f64>> {
        self.inner.get_daily_consistency(user_id, day).await
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> AppResult<()> {
        self.inner.upsert_profile(profile).await
    }

    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        self.inner.get_profile(user_id).await
    }

    async fn update_current_weight(
        &self,
        user_id: Uuid,
        weight_kg: f64,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.inner.update_current_weight(user_id, weight_kg, at).await
    }

    async fn set_active_objective(&self, objective: &TransformationObjective) -> AppResult<()> {
        self.inner.set_active_objective(objective).await
    }

    async fn get_active_objective(
        &self,
        user_id: Uuid,
    ) -> AppResult<Option<TransformationObjective>> {
        self.inner.get_active_objective(user_id).await
    }

    async fn save_prediction(&self, prediction: &TransformationPrediction) -> AppResult<()> {
        self.inner.save_prediction(prediction).await
    }

    async fn get_active_prediction(
        &self,
        user_id: Uuid,
    ) -> AppResult<Option<TransformationPrediction>> {
        self.inner.get_active_prediction(user_id).await
    }

    async fn award_xp(&self, event: &XpEvent) -> AppResult<XpAward> {
        self.inner.award_xp(event).await
    }

    async fn total_xp(&self, user_id: Uuid) -> AppResult<u64> {
        self.inner.total_xp(user_id).await
    }

    async fn xp_summary(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<XpSummary> {
        self.inner.xp_summary(user_id, now).await
    }

    async fn list_xp_events(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<Vec<XpEvent>> {
        self.inner.list_xp_events(user_id, since).await
    }

    async fn insert_absence_log(&self, log: &AbsenceLog) -> AppResult<()> {
        self.inner.insert_absence_log(log).await
    }

    async fn get_open_absence(&self, user_id: Uuid) -> AppResult<Option<AbsenceLog>> {
        self.inner.get_open_absence(user_id).await
    }

    async fn get_absence_log(&self, id: Uuid) -> AppResult<Option<AbsenceLog>> {
        self.inner.get_absence_log(id).await
    }

    async fn update_absence_progress(
        &self,
        id: Uuid,
        days_absent: u32,
        estimated_activity: Option<&EstimatedActivity>,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.inner
            .update_absence_progress(id, days_absent, estimated_activity, now)
            .await
    }

    async fn transition_absence(
        &self,
        id: Uuid,
        from: AbsenceStatus,
        to: AbsenceStatus,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.inner.transition_absence(id, from, to, now).await
    }

    async fn record_reminder_sent(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        self.inner.record_reminder_sent(id, now).await
    }

    async fn list_recent_absences(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<AbsenceLog>> {
        self.inner.list_recent_absences(user_id, since, limit).await
    }

    async fn insert_pending_rewards(&self, rewards: &[PendingXpReward]) -> AppResult<u64> {
        self.inner.insert_pending_rewards(rewards).await
    }

    async fn list_rewards_for_absence(
        &self,
        absence_log_id: Uuid,
    ) -> AppResult<Vec<PendingXpReward>> {
        self.inner.list_rewards_for_absence(absence_log_id).await
    }

    async fn mark_rewards_awarded(
        &self,
        absence_log_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        self.inner.mark_rewards_awarded(absence_log_id, now).await
    }

    async fn insert_reconciliation(
        &self,
        reconciliation: &AbsenceReconciliation,
    ) -> AppResult<bool> {
        self.inner.insert_reconciliation(reconciliation).await
    }

    async fn get_reconciliation_for_absence(
        &self,
        absence_log_id: Uuid,
    ) -> AppResult<Option<AbsenceReconciliation>> {
        self.inner
            .get_reconciliation_for_absence(absence_log_id)
            .await
    }

    async fn list_recent_reconciliations(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<AbsenceReconciliation>> {
        self.inner
            .list_recent_reconciliations(user_id, since, limit)
            .await
    }

    async fn begin_intent(&self, intent: &ReconciliationIntent) -> AppResult<ReconciliationIntent> {
        self.inner.begin_intent(intent).await
    }

    async fn update_intent(&self, intent: &ReconciliationIntent) -> AppResult<()> {
        self.inner.update_intent(intent).await
    }

    async fn list_pending_intents(&self, user_id: Uuid) -> AppResult<Vec<ReconciliationIntent>> {
        self.inner.list_pending_intents(user_id).await
    }

    async fn delete_expired_actions(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        self.inner.delete_expired_actions(user_id, now).await
    }

    async fn list_live_actions(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<DashboardAction>> {
        self.inner.list_live_actions(user_id, now).await
    }

    async fn list_open_action_titles(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<String>> {
        self.inner.list_open_action_titles(user_id, now).await
    }

    async fn insert_actions(&self, actions: &[DashboardAction]) -> AppResult<u64> {
        self.inner.insert_actions(actions).await
    }

    async fn complete_action(
        &self,
        user_id: Uuid,
        action_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.inner.complete_action(user_id, action_id, now).await
    }

    async fn dismiss_action(&self, user_id: Uuid, action_id: Uuid) -> AppResult<bool> {
        self.inner.dismiss_action(user_id, action_id).await
    }
}
