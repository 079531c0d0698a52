// ABOUTME: Absence logs, pending XP rewards, reconciliation records, and saga intents
// ABOUTME: Uniqueness constraints make every write in the reconciliation flow replayable
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use super::{
    format_date, format_timestamp, parse_date, parse_optional_timestamp, parse_timestamp,
    parse_uuid, to_i64, to_u32, to_u64, Database,
};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use twinforge_core::models::{
    AbsenceLog, AbsenceReconciliation, AbsenceStatus, EstimatedActivity, PendingXpReward,
    ReconciliationIntent,
};
use uuid::Uuid;

const ABSENCE_COLUMNS: &str = "id, user_id, absence_start_date, days_absent, status, \
     estimated_activity, reminder_sent_count, created_at, updated_at";

const REWARD_COLUMNS: &str = "id, user_id, absence_log_id, day_index, estimated_date, \
     base_estimated_xp, multiplier, final_xp, status, created_at, awarded_at";

const RECONCILIATION_COLUMNS: &str = "id, user_id, absence_log_id, previous_weight, new_weight, \
     weight_delta, days_absent, coherence_score, validation_flags, adjusted_multiplier, \
     pending_xp, xp_awarded, bonus_xp, reconciled_at";

const INTENT_COLUMNS: &str = "id, user_id, absence_log_id, new_weight_kg, status, \
     completed_steps, last_error, created_at, updated_at";

impl Database {
    pub(super) async fn migrate_absences(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS absence_logs (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                absence_start_date TEXT NOT NULL,
                days_absent INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL CHECK (status IN ('active', 'reconciled', 'expired', 'cancelled')),
                estimated_activity TEXT,
                reminder_sent_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .await?;
        self.execute_ddl(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_absence_logs_one_active ON absence_logs(user_id) WHERE status = 'active'",
        )
        .await?;
        self.execute_ddl(
            "CREATE INDEX IF NOT EXISTS idx_absence_logs_user_start ON absence_logs(user_id, absence_start_date)",
        )
        .await?;

        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS pending_xp_rewards (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                absence_log_id TEXT NOT NULL REFERENCES absence_logs(id) ON DELETE CASCADE,
                day_index INTEGER NOT NULL,
                estimated_date TEXT NOT NULL,
                base_estimated_xp INTEGER NOT NULL,
                multiplier REAL NOT NULL,
                final_xp INTEGER NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('pending', 'awarded')),
                created_at TEXT NOT NULL,
                awarded_at TEXT,
                UNIQUE (absence_log_id, day_index)
            )
            ",
        )
        .await?;

        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS absence_reconciliations (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                absence_log_id TEXT NOT NULL UNIQUE REFERENCES absence_logs(id),
                previous_weight REAL,
                new_weight REAL NOT NULL,
                weight_delta REAL NOT NULL,
                days_absent INTEGER NOT NULL,
                coherence_score REAL NOT NULL,
                validation_flags TEXT NOT NULL,
                adjusted_multiplier REAL NOT NULL,
                pending_xp INTEGER NOT NULL,
                xp_awarded INTEGER NOT NULL,
                bonus_xp INTEGER NOT NULL,
                reconciled_at TEXT NOT NULL
            )
            ",
        )
        .await?;
        self.execute_ddl(
            "CREATE INDEX IF NOT EXISTS idx_reconciliations_user_time ON absence_reconciliations(user_id, reconciled_at)",
        )
        .await?;

        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS reconciliation_intents (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                absence_log_id TEXT NOT NULL UNIQUE REFERENCES absence_logs(id),
                new_weight_kg REAL NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('pending', 'committed')),
                completed_steps TEXT NOT NULL,
                last_error TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .await
    }

    // ========================================================================
    // Absence logs
    // ========================================================================

    /// Insert a new active absence log
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` when the user already has an active log
    pub async fn insert_absence_log(&self, log: &AbsenceLog) -> AppResult<()> {
        let estimated = log
            .estimated_activity
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r"
            INSERT INTO absence_logs (id, user_id, absence_start_date, days_absent, status,
                                      estimated_activity, reminder_sent_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(log.id.to_string())
        .bind(log.user_id.to_string())
        .bind(format_timestamp(log.absence_start_date))
        .bind(i64::from(log.days_absent))
        .bind(log.status.as_str())
        .bind(estimated)
        .bind(i64::from(log.reminder_sent_count))
        .bind(format_timestamp(log.created_at))
        .bind(format_timestamp(log.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The user's active absence log
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the row is malformed
    pub async fn get_open_absence(&self, user_id: Uuid) -> AppResult<Option<AbsenceLog>> {
        let row = sqlx::query(&format!(
            "SELECT {ABSENCE_COLUMNS} FROM absence_logs WHERE user_id = $1 AND status = 'active'"
        ))
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load open absence: {e}")))?;

        row.as_ref().map(Self::row_to_absence_log).transpose()
    }

    /// Absence log by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the row is malformed
    pub async fn get_absence_log(&self, id: Uuid) -> AppResult<Option<AbsenceLog>> {
        let row = sqlx::query(&format!(
            "SELECT {ABSENCE_COLUMNS} FROM absence_logs WHERE id = $1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load absence: {e}")))?;

        row.as_ref().map(Self::row_to_absence_log).transpose()
    }

    /// Update days absent and, when given, the estimated activity of an active log
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database query fails
    pub async fn update_absence_progress(
        &self,
        id: Uuid,
        days_absent: u32,
        estimated_activity: Option<&EstimatedActivity>,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let estimated = estimated_activity.map(serde_json::to_string).transpose()?;

        let result = sqlx::query(
            r"
            UPDATE absence_logs
            SET days_absent = $2,
                estimated_activity = COALESCE($3, estimated_activity),
                updated_at = $4
            WHERE id = $1 AND status = 'active'
            ",
        )
        .bind(id.to_string())
        .bind(i64::from(days_absent))
        .bind(estimated)
        .bind(format_timestamp(now))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update absence: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Move a log from `from` to `to`; false when it was not in `from`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn transition_absence(
        &self,
        id: Uuid,
        from: AbsenceStatus,
        to: AbsenceStatus,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE absence_logs SET status = $3, updated_at = $4 WHERE id = $1 AND status = $2",
        )
        .bind(id.to_string())
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(format_timestamp(now))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update absence status: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Count a reminder sent for an active log
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn record_reminder_sent(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE absence_logs
            SET reminder_sent_count = reminder_sent_count + 1, updated_at = $2
            WHERE id = $1 AND status = 'active'
            ",
        )
        .bind(id.to_string())
        .bind(format_timestamp(now))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to record reminder: {e}")))?;

        Ok(())
    }

    /// Absence logs started at or after `since`, newest first, at most `limit`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_recent_absences(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<AbsenceLog>> {
        let rows = sqlx::query(&format!(
            "SELECT {ABSENCE_COLUMNS} FROM absence_logs \
             WHERE user_id = $1 AND absence_start_date >= $2 \
             ORDER BY absence_start_date DESC LIMIT $3"
        ))
        .bind(user_id.to_string())
        .bind(format_timestamp(since))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list absences: {e}")))?;

        rows.iter().map(Self::row_to_absence_log).collect()
    }

    fn row_to_absence_log(row: &SqliteRow) -> AppResult<AbsenceLog> {
        let id: String = row.get("id");
        let user_id: String = row.get("user_id");
        let start: String = row.get("absence_start_date");
        let status: String = row.get("status");
        let estimated: Option<String> = row.get("estimated_activity");
        let created_at: String = row.get("created_at");
        let updated_at: String = row.get("updated_at");

        Ok(AbsenceLog {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            absence_start_date: parse_timestamp(&start)?,
            days_absent: to_u32(row.get("days_absent")),
            status: status
                .parse()
                .map_err(|e: AppError| AppError::database(e.to_string()))?,
            estimated_activity: estimated
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            reminder_sent_count: to_u32(row.get("reminder_sent_count")),
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }

    // ========================================================================
    // Pending XP rewards
    // ========================================================================

    /// Insert rewards, skipping days already stored for the absence
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails
    pub async fn insert_pending_rewards(&self, rewards: &[PendingXpReward]) -> AppResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let mut inserted = 0;
        for reward in rewards {
            let result = sqlx::query(
                r"
                INSERT INTO pending_xp_rewards (id, user_id, absence_log_id, day_index, estimated_date,
                                                base_estimated_xp, multiplier, final_xp, status,
                                                created_at, awarded_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ON CONFLICT(absence_log_id, day_index) DO NOTHING
                ",
            )
            .bind(reward.id.to_string())
            .bind(reward.user_id.to_string())
            .bind(reward.absence_log_id.to_string())
            .bind(i64::from(reward.day_index))
            .bind(format_date(reward.estimated_date))
            .bind(to_i64(reward.base_estimated_xp))
            .bind(reward.multiplier)
            .bind(to_i64(reward.final_xp))
            .bind(reward.status.as_str())
            .bind(format_timestamp(reward.created_at))
            .bind(reward.awarded_at.map(format_timestamp))
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to insert pending reward: {e}")))?;
            inserted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit rewards: {e}")))?;
        Ok(inserted)
    }

    /// Rewards of one absence, by day
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_rewards_for_absence(
        &self,
        absence_log_id: Uuid,
    ) -> AppResult<Vec<PendingXpReward>> {
        let rows = sqlx::query(&format!(
            "SELECT {REWARD_COLUMNS} FROM pending_xp_rewards \
             WHERE absence_log_id = $1 ORDER BY day_index ASC"
        ))
        .bind(absence_log_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list pending rewards: {e}")))?;

        rows.iter().map(Self::row_to_reward).collect()
    }

    /// Flip every pending reward of the absence to awarded
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn mark_rewards_awarded(
        &self,
        absence_log_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r"
            UPDATE pending_xp_rewards
            SET status = 'awarded', awarded_at = $2
            WHERE absence_log_id = $1 AND status = 'pending'
            ",
        )
        .bind(absence_log_id.to_string())
        .bind(format_timestamp(now))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to mark rewards awarded: {e}")))?;

        Ok(result.rows_affected())
    }

    fn row_to_reward(row: &SqliteRow) -> AppResult<PendingXpReward> {
        let id: String = row.get("id");
        let user_id: String = row.get("user_id");
        let absence_log_id: String = row.get("absence_log_id");
        let estimated_date: String = row.get("estimated_date");
        let status: String = row.get("status");
        let created_at: String = row.get("created_at");

        Ok(PendingXpReward {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            absence_log_id: parse_uuid(&absence_log_id)?,
            day_index: to_u32(row.get("day_index")),
            estimated_date: parse_date(&estimated_date)?,
            base_estimated_xp: to_u64(row.get("base_estimated_xp")),
            multiplier: row.get("multiplier"),
            final_xp: to_u64(row.get("final_xp")),
            status: status
                .parse()
                .map_err(|e: AppError| AppError::database(e.to_string()))?,
            created_at: parse_timestamp(&created_at)?,
            awarded_at: parse_optional_timestamp(row.get("awarded_at"))?,
        })
    }

    // ========================================================================
    // Reconciliation records
    // ========================================================================

    /// Insert the audit record; false when the absence already has one
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database query fails
    pub async fn insert_reconciliation(
        &self,
        reconciliation: &AbsenceReconciliation,
    ) -> AppResult<bool> {
        let flags = serde_json::to_string(&reconciliation.validation_flags)?;

        let result = sqlx::query(
            r"
            INSERT INTO absence_reconciliations (id, user_id, absence_log_id, previous_weight,
                new_weight, weight_delta, days_absent, coherence_score, validation_flags,
                adjusted_multiplier, pending_xp, xp_awarded, bonus_xp, reconciled_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT(absence_log_id) DO NOTHING
            ",
        )
        .bind(reconciliation.id.to_string())
        .bind(reconciliation.user_id.to_string())
        .bind(reconciliation.absence_log_id.to_string())
        .bind(reconciliation.previous_weight)
        .bind(reconciliation.new_weight)
        .bind(reconciliation.weight_delta)
        .bind(i64::from(reconciliation.days_absent))
        .bind(reconciliation.coherence_score)
        .bind(flags)
        .bind(reconciliation.adjusted_multiplier)
        .bind(to_i64(reconciliation.pending_xp))
        .bind(to_i64(reconciliation.xp_awarded))
        .bind(to_i64(reconciliation.bonus_xp))
        .bind(format_timestamp(reconciliation.reconciled_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert reconciliation: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// The audit record of an absence
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the row is malformed
    pub async fn get_reconciliation_for_absence(
        &self,
        absence_log_id: Uuid,
    ) -> AppResult<Option<AbsenceReconciliation>> {
        let row = sqlx::query(&format!(
            "SELECT {RECONCILIATION_COLUMNS} FROM absence_reconciliations WHERE absence_log_id = $1"
        ))
        .bind(absence_log_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load reconciliation: {e}")))?;

        row.as_ref().map(Self::row_to_reconciliation).transpose()
    }

    /// Reconciliations at or after `since`, newest first, at most `limit`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_recent_reconciliations(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<AbsenceReconciliation>> {
        let rows = sqlx::query(&format!(
            "SELECT {RECONCILIATION_COLUMNS} FROM absence_reconciliations \
             WHERE user_id = $1 AND reconciled_at >= $2 \
             ORDER BY reconciled_at DESC LIMIT $3"
        ))
        .bind(user_id.to_string())
        .bind(format_timestamp(since))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list reconciliations: {e}")))?;

        rows.iter().map(Self::row_to_reconciliation).collect()
    }

    fn row_to_reconciliation(row: &SqliteRow) -> AppResult<AbsenceReconciliation> {
        let id: String = row.get("id");
        let user_id: String = row.get("user_id");
        let absence_log_id: String = row.get("absence_log_id");
        let flags: String = row.get("validation_flags");
        let reconciled_at: String = row.get("reconciled_at");

        Ok(AbsenceReconciliation {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            absence_log_id: parse_uuid(&absence_log_id)?,
            previous_weight: row.get("previous_weight"),
            new_weight: row.get("new_weight"),
            weight_delta: row.get("weight_delta"),
            days_absent: to_u32(row.get("days_absent")),
            coherence_score: row.get("coherence_score"),
            validation_flags: serde_json::from_str(&flags)?,
            adjusted_multiplier: row.get("adjusted_multiplier"),
            pending_xp: to_u64(row.get("pending_xp")),
            xp_awarded: to_u64(row.get("xp_awarded")),
            bonus_xp: to_u64(row.get("bonus_xp")),
            reconciled_at: parse_timestamp(&reconciled_at)?,
        })
    }

    // ========================================================================
    // Reconciliation intents
    // ========================================================================

    /// Persist a new intent, or return the one already stored for the absence
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn begin_intent(
        &self,
        intent: &ReconciliationIntent,
    ) -> AppResult<ReconciliationIntent> {
        sqlx::query(
            r"
            INSERT INTO reconciliation_intents (id, user_id, absence_log_id, new_weight_kg, status,
                                                completed_steps, last_error, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT(absence_log_id) DO NOTHING
            ",
        )
        .bind(intent.id.to_string())
        .bind(intent.user_id.to_string())
        .bind(intent.absence_log_id.to_string())
        .bind(intent.new_weight_kg)
        .bind(intent.status.as_str())
        .bind(serde_json::to_string(&intent.completed_steps)?)
        .bind(intent.last_error.as_deref())
        .bind(format_timestamp(intent.created_at))
        .bind(format_timestamp(intent.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create intent: {e}")))?;

        let row = sqlx::query(&format!(
            "SELECT {INTENT_COLUMNS} FROM reconciliation_intents WHERE absence_log_id = $1"
        ))
        .bind(intent.absence_log_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load intent: {e}")))?;

        Self::row_to_intent(&row)
    }

    /// Save step progress and status
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn update_intent(&self, intent: &ReconciliationIntent) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE reconciliation_intents
            SET status = $2, completed_steps = $3, last_error = $4, updated_at = $5
            WHERE id = $1
            ",
        )
        .bind(intent.id.to_string())
        .bind(intent.status.as_str())
        .bind(serde_json::to_string(&intent.completed_steps)?)
        .bind(intent.last_error.as_deref())
        .bind(format_timestamp(intent.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update intent: {e}")))?;

        Ok(())
    }

    /// Intents of the user that have not committed, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_pending_intents(&self, user_id: Uuid) -> AppResult<Vec<ReconciliationIntent>> {
        let rows = sqlx::query(&format!(
            "SELECT {INTENT_COLUMNS} FROM reconciliation_intents \
             WHERE user_id = $1 AND status = 'pending' ORDER BY created_at ASC"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list intents: {e}")))?;

        rows.iter().map(Self::row_to_intent).collect()
    }

    fn row_to_intent(row: &SqliteRow) -> AppResult<ReconciliationIntent> {
        let id: String = row.get("id");
        let user_id: String = row.get("user_id");
        let absence_log_id: String = row.get("absence_log_id");
        let status: String = row.get("status");
        let steps: String = row.get("completed_steps");
        let created_at: String = row.get("created_at");
        let updated_at: String = row.get("updated_at");

        Ok(ReconciliationIntent {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            absence_log_id: parse_uuid(&absence_log_id)?,
            new_weight_kg: row.get("new_weight_kg"),
            status: status
                .parse()
                .map_err(|e: AppError| AppError::database(e.to_string()))?,
            completed_steps: serde_json::from_str(&steps)?,
            last_error: row.get("last_error"),
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }
}
