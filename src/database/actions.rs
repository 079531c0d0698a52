// ABOUTME: Dashboard action queue storage
// ABOUTME: A partial unique index keeps one incomplete action per (user, title), dismissed included
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use super::{
    format_timestamp, parse_optional_timestamp, parse_timestamp, parse_uuid, to_u32, Database,
};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use twinforge_core::models::DashboardAction;
use uuid::Uuid;

const ACTION_COLUMNS: &str = "id, user_id, action_type, category, title, description, \
     priority_score, estimated_impact, tokens_required, expires_at, is_completed, is_dismissed, \
     completed_at, source, created_at";

impl Database {
    pub(super) async fn migrate_actions(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS dashboard_actions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                action_type TEXT NOT NULL,
                category TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                priority_score INTEGER NOT NULL,
                estimated_impact TEXT NOT NULL,
                tokens_required INTEGER NOT NULL DEFAULT 0,
                expires_at TEXT NOT NULL,
                is_completed BOOLEAN NOT NULL DEFAULT 0,
                is_dismissed BOOLEAN NOT NULL DEFAULT 0,
                completed_at TEXT,
                source TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .await?;
        // Dismissed rows keep their title until they expire
        self.execute_ddl("DROP INDEX IF EXISTS idx_actions_live_title").await?;
        self.execute_ddl(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_actions_open_title ON dashboard_actions(user_id, title) WHERE is_completed = 0",
        )
        .await?;
        self.execute_ddl(
            "CREATE INDEX IF NOT EXISTS idx_actions_user_expiry ON dashboard_actions(user_id, expires_at)",
        )
        .await
    }

    /// Delete the user's incomplete actions that expired at or before `now`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn delete_expired_actions(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r"
            DELETE FROM dashboard_actions
            WHERE user_id = $1 AND expires_at <= $2 AND is_completed = 0
            ",
        )
        .bind(user_id.to_string())
        .bind(format_timestamp(now))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to delete expired actions: {e}")))?;

        Ok(result.rows_affected())
    }

    /// Live actions (not completed, not dismissed, not expired), highest priority first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_live_actions(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<DashboardAction>> {
        let rows = sqlx::query(&format!(
            "SELECT {ACTION_COLUMNS} FROM dashboard_actions \
             WHERE user_id = $1 AND is_completed = 0 AND is_dismissed = 0 AND expires_at > $2 \
             ORDER BY priority_score DESC, created_at ASC"
        ))
        .bind(user_id.to_string())
        .bind(format_timestamp(now))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list actions: {e}")))?;

        rows.iter().map(Self::row_to_action).collect()
    }

    /// Titles of the user's unexpired, incomplete actions, dismissed ones included
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_open_action_titles(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<String>> {
        sqlx::query_scalar(
            r"
            SELECT title FROM dashboard_actions
            WHERE user_id = $1 AND is_completed = 0 AND expires_at > $2
            ",
        )
        .bind(user_id.to_string())
        .bind(format_timestamp(now))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list action titles: {e}")))
    }

    /// Insert actions, skipping titles that already have an incomplete row
    ///
    /// Returns the number of rows actually inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails
    pub async fn insert_actions(&self, actions: &[DashboardAction]) -> AppResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let mut inserted = 0;
        for action in actions {
            let result = sqlx::query(
                r"
                INSERT INTO dashboard_actions (id, user_id, action_type, category, title, description,
                    priority_score, estimated_impact, tokens_required, expires_at, is_completed,
                    is_dismissed, completed_at, source, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                ON CONFLICT DO NOTHING
                ",
            )
            .bind(action.id.to_string())
            .bind(action.user_id.to_string())
            .bind(action.action_type.as_str())
            .bind(action.category.as_str())
            .bind(&action.title)
            .bind(&action.description)
            .bind(i64::from(action.priority_score))
            .bind(action.estimated_impact.as_str())
            .bind(i64::from(action.tokens_required))
            .bind(format_timestamp(action.expires_at))
            .bind(action.is_completed)
            .bind(action.is_dismissed)
            .bind(action.completed_at.map(format_timestamp))
            .bind(action.source.as_str())
            .bind(format_timestamp(action.created_at))
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to insert action: {e}")))?;
            inserted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit actions: {e}")))?;
        Ok(inserted)
    }

    /// Mark a live action completed; false when it was not live
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn complete_action(
        &self,
        user_id: Uuid,
        action_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE dashboard_actions
            SET is_completed = 1, completed_at = $3
            WHERE id = $1 AND user_id = $2 AND is_completed = 0 AND is_dismissed = 0
            ",
        )
        .bind(action_id.to_string())
        .bind(user_id.to_string())
        .bind(format_timestamp(now))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to complete action: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark a live action dismissed; false when it was not live
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn dismiss_action(&self, user_id: Uuid, action_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE dashboard_actions
            SET is_dismissed = 1
            WHERE id = $1 AND user_id = $2 AND is_completed = 0 AND is_dismissed = 0
            ",
        )
        .bind(action_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to dismiss action: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_action(row: &SqliteRow) -> AppResult<DashboardAction> {
        let id: String = row.get("id");
        let user_id: String = row.get("user_id");
        let action_type: String = row.get("action_type");
        let category: String = row.get("category");
        let impact: String = row.get("estimated_impact");
        let source: String = row.get("source");
        let expires_at: String = row.get("expires_at");
        let created_at: String = row.get("created_at");

        Ok(DashboardAction {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            action_type: action_type.parse()?,
            category: category.parse()?,
            title: row.get("title"),
            description: row.get("description"),
            priority_score: to_u32(row.get("priority_score")),
            estimated_impact: impact.parse()?,
            tokens_required: to_u32(row.get("tokens_required")),
            expires_at: parse_timestamp(&expires_at)?,
            is_completed: row.get("is_completed"),
            is_dismissed: row.get("is_dismissed"),
            completed_at: parse_optional_timestamp(row.get("completed_at"))?,
            source: source.parse()?,
            created_at: parse_timestamp(&created_at)?,
        })
    }
}
