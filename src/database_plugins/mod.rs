// ABOUTME: Storage abstraction for the engagement engine
// ABOUTME: Services depend on the EngagementStore trait; SQLite is the shipped backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

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

pub mod sqlite;

/// Core storage abstraction
///
/// Every single-active invariant (objective, absence log, incomplete action title)
/// and every idempotency key (XP source key, reward day, reconciliation per
/// absence, intent per absence) is enforced by the implementation, not by
/// callers.
#[async_trait]
pub trait EngagementStore: Send + Sync {
    /// Run migrations to set up the schema
    async fn migrate(&self) -> AppResult<()>;

    // ================================
    // Activities
    // ================================

    /// Append an activity record
    async fn record_activity(&self, record: &ActivityRecord) -> AppResult<()>;

    /// Activities at or after `since`, oldest first; empty `kinds` means all kinds
    async fn list_activities(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        kinds: &[ActivityKind],
    ) -> AppResult<Vec<ActivityRecord>>;

    /// Timestamp of the latest activity of any kind
    async fn latest_activity_at(&self, user_id: Uuid) -> AppResult<Option<DateTime<Utc>>>;

    /// Count, recent count, and latest timestamp for one domain
    async fn domain_aggregate(
        &self,
        user_id: Uuid,
        kind: ActivityKind,
        recent_since: DateTime<Utc>,
    ) -> AppResult<DomainAggregate>;

    /// Distinct UTC days with any activity since `since`, newest first
    async fn active_days(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<Vec<NaiveDate>>;

    /// Weight measurements since `since`, oldest first
    async fn weight_points(&self, user_id: Uuid, since: DateTime<Utc>)
        -> AppResult<Vec<WeightPoint>>;

    /// Save meal plan, pantry, and projection flags
    async fn upsert_user_context(&self, context: &UserContext) -> AppResult<()>;

    /// Meal plan, pantry, and projection flags
    async fn get_user_context(&self, user_id: Uuid) -> AppResult<Option<UserContext>>;

    /// Store the precomputed consistency score of a day
    async fn upsert_daily_consistency(
        &self,
        user_id: Uuid,
        day: NaiveDate,
        score: f64,
    ) -> AppResult<()>;

    /// Precomputed consistency score of a day
    async fn get_daily_consistency(&self, user_id: Uuid, day: NaiveDate)
        -> AppResult<Option<f64>>;

    // ================================
    // Profiles & Objectives
    // ================================

    /// Save profile weights
    async fn upsert_profile(&self, profile: &UserProfile) -> AppResult<()>;

    /// Profile weights
    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<UserProfile>>;

    /// Set the profile's current weight
    async fn update_current_weight(
        &self,
        user_id: Uuid,
        weight_kg: f64,
        at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Make an objective the user's only active one
    async fn set_active_objective(&self, objective: &TransformationObjective) -> AppResult<()>;

    /// The user's active objective
    async fn get_active_objective(&self, user_id: Uuid)
        -> AppResult<Option<TransformationObjective>>;

    // ================================
    // Predictions
    // ================================

    /// Store a prediction as the active one
    async fn save_prediction(&self, prediction: &TransformationPrediction) -> AppResult<()>;

    /// The active prediction
    async fn get_active_prediction(
        &self,
        user_id: Uuid,
    ) -> AppResult<Option<TransformationPrediction>>;

    // ================================
    // XP
    // ================================

    /// Idempotent XP award keyed by `(user, source_key)`
    async fn award_xp(&self, event: &XpEvent) -> AppResult<XpAward>;

    /// Cumulative XP
    async fn total_xp(&self, user_id: Uuid) -> AppResult<u64>;

    /// Totals for the level forecast
    async fn xp_summary(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<XpSummary>;

    /// XP events since `since`, oldest first
    async fn list_xp_events(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<Vec<XpEvent>>;

    // ================================
    // Absences
    // ================================

    /// Insert an active absence log; `ResourceAlreadyExists` when one is open
    async fn insert_absence_log(&self, log: &AbsenceLog) -> AppResult<()>;

    /// The user's active absence log
    async fn get_open_absence(&self, user_id: Uuid) -> AppResult<Option<AbsenceLog>>;

    /// Absence log by id
    async fn get_absence_log(&self, id: Uuid) -> AppResult<Option<AbsenceLog>>;

    /// Update an active log's day count and, when given, its estimate
    async fn update_absence_progress(
        &self,
        id: Uuid,
        days_absent: u32,
        estimated_activity: Option<&EstimatedActivity>,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Compare-and-set the status of a log
    async fn transition_absence(
        &self,
        id: Uuid,
        from: AbsenceStatus,
        to: AbsenceStatus,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Count a reminder sent for an active log
    async fn record_reminder_sent(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<()>;

    /// Recent absence logs, newest first
    async fn list_recent_absences(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<AbsenceLog>>;

    /// Insert rewards, skipping days already stored
    async fn insert_pending_rewards(&self, rewards: &[PendingXpReward]) -> AppResult<u64>;

    /// Rewards of one absence, by day
    async fn list_rewards_for_absence(&self, absence_log_id: Uuid)
        -> AppResult<Vec<PendingXpReward>>;

    /// Flip pending rewards of an absence to awarded
    async fn mark_rewards_awarded(&self, absence_log_id: Uuid, now: DateTime<Utc>)
        -> AppResult<u64>;

    /// Insert the audit record; false when the absence already has one
    async fn insert_reconciliation(&self, reconciliation: &AbsenceReconciliation)
        -> AppResult<bool>;

    /// The audit record of an absence
    async fn get_reconciliation_for_absence(
        &self,
        absence_log_id: Uuid,
    ) -> AppResult<Option<AbsenceReconciliation>>;

    /// Recent reconciliations, newest first
    async fn list_recent_reconciliations(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<AbsenceReconciliation>>;

    /// Persist a new intent or return the existing one for the absence
    async fn begin_intent(&self, intent: &ReconciliationIntent) -> AppResult<ReconciliationIntent>;

    /// Save intent progress
    async fn update_intent(&self, intent: &ReconciliationIntent) -> AppResult<()>;

    /// Uncommitted intents, oldest first
    async fn list_pending_intents(&self, user_id: Uuid) -> AppResult<Vec<ReconciliationIntent>>;

    // ================================
    // Dashboard actions
    // ================================

    /// Delete expired actions
    async fn delete_expired_actions(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64>;

    /// Live actions, highest priority first
    async fn list_live_actions(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<DashboardAction>>;

    /// Titles of unexpired, incomplete actions, dismissed included
    async fn list_open_action_titles(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<String>>;

    /// Insert actions, skipping titles that still have an incomplete row
    async fn insert_actions(&self, actions: &[DashboardAction]) -> AppResult<u64>;

    /// Complete a live action
    async fn complete_action(
        &self,
        user_id: Uuid,
        action_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Dismiss a live action
    async fn dismiss_action(&self, user_id: Uuid, action_id: Uuid) -> AppResult<bool>;
}
