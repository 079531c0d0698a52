// ABOUTME: XP event log with the idempotent award primitive
// ABOUTME: A unique (user, source key) index turns replayed awards into no-ops
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use super::{format_timestamp, parse_timestamp, parse_uuid, to_i64, to_u32, to_u64, Database};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use twinforge_core::models::{XpAward, XpEvent, XpSummary};
use uuid::Uuid;

impl Database {
    pub(super) async fn migrate_xp(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS xp_events (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                source_key TEXT NOT NULL,
                amount INTEGER NOT NULL CHECK (amount >= 0),
                occurred_at TEXT NOT NULL
            )
            ",
        )
        .await?;
        self.execute_ddl(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_xp_events_source ON xp_events(user_id, source_key)",
        )
        .await?;
        self.execute_ddl(
            "CREATE INDEX IF NOT EXISTS idx_xp_events_user_time ON xp_events(user_id, occurred_at)",
        )
        .await
    }

    /// Award XP exactly once per `(user, source_key)`
    ///
    /// Replaying an award returns the stored event with `newly_awarded = false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn award_xp(&self, event: &XpEvent) -> AppResult<XpAward> {
        let result = sqlx::query(
            r"
            INSERT INTO xp_events (id, user_id, source_key, amount, occurred_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT(user_id, source_key) DO NOTHING
            ",
        )
        .bind(event.id.to_string())
        .bind(event.user_id.to_string())
        .bind(&event.source_key)
        .bind(to_i64(event.amount))
        .bind(format_timestamp(event.occurred_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to award XP: {e}")))?;

        let row = sqlx::query(
            r"
            SELECT id, user_id, source_key, amount, occurred_at
            FROM xp_events WHERE user_id = $1 AND source_key = $2
            ",
        )
        .bind(event.user_id.to_string())
        .bind(&event.source_key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load XP event: {e}")))?;

        Ok(XpAward {
            event: Self::row_to_xp_event(&row)?,
            newly_awarded: result.rows_affected() > 0,
            total_xp: self.total_xp(event.user_id).await?,
        })
    }

    /// Cumulative XP
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn total_xp(&self, user_id: Uuid) -> AppResult<u64> {
        let total: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0) FROM xp_events WHERE user_id = $1")
                .bind(user_id.to_string())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to sum XP: {e}")))?;
        Ok(to_u64(total))
    }

    /// Totals for the level forecast
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn xp_summary(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<XpSummary> {
        let row = sqlx::query(
            r"
            SELECT COALESCE(SUM(amount), 0) AS total,
                   COUNT(*) AS events,
                   COALESCE(SUM(CASE WHEN occurred_at >= $2 THEN amount ELSE 0 END), 0) AS last_30,
                   COALESCE(SUM(CASE WHEN occurred_at >= $3 THEN amount ELSE 0 END), 0) AS last_7
            FROM xp_events
            WHERE user_id = $1
            ",
        )
        .bind(user_id.to_string())
        .bind(format_timestamp(now - Duration::days(30)))
        .bind(format_timestamp(now - Duration::days(7)))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to summarize XP: {e}")))?;

        Ok(XpSummary {
            total_xp: to_u64(row.get("total")),
            event_count: to_u32(row.get("events")),
            xp_last_30_days: to_u64(row.get("last_30")),
            xp_last_7_days: to_u64(row.get("last_7")),
        })
    }

    /// XP events at or after `since`, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_xp_events(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<XpEvent>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, source_key, amount, occurred_at
            FROM xp_events
            WHERE user_id = $1 AND occurred_at >= $2
            ORDER BY occurred_at ASC
            ",
        )
        .bind(user_id.to_string())
        .bind(format_timestamp(since))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list XP events: {e}")))?;

        rows.iter().map(Self::row_to_xp_event).collect()
    }

    fn row_to_xp_event(row: &SqliteRow) -> AppResult<XpEvent> {
        let id: String = row.get("id");
        let user_id: String = row.get("user_id");
        let occurred_at: String = row.get("occurred_at");

        Ok(XpEvent {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            source_key: row.get("source_key"),
            amount: to_u64(row.get("amount")),
            occurred_at: parse_timestamp(&occurred_at)?,
        })
    }
}
