// ABOUTME: Activity log, user context flags, and daily consistency storage
// ABOUTME: Feeds snapshot assembly, weight history, absence detection, and estimation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use super::{
    format_date, format_timestamp, parse_date, parse_timestamp, parse_uuid, to_u32, Database,
};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use twinforge_core::models::{
    ActivityKind, ActivityRecord, DomainAggregate, UserContext, WeightPoint, WeightSource,
};
use uuid::Uuid;

const ACTIVITY_COLUMNS: &str = "id, user_id, kind, occurred_at, calories, protein_g, carbs_g, \
     fat_g, weight_kg, heart_rate_avg, duration_minutes, succeeded";

impl Database {
    pub(super) async fn migrate_activities(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS activities (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('meal', 'training', 'weight_update', 'body_scan', 'wearable', 'fasting')),
                occurred_at TEXT NOT NULL,
                calories REAL,
                protein_g REAL,
                carbs_g REAL,
                fat_g REAL,
                weight_kg REAL,
                heart_rate_avg REAL,
                duration_minutes REAL,
                succeeded BOOLEAN
            )
            ",
        )
        .await?;
        self.execute_ddl(
            "CREATE INDEX IF NOT EXISTS idx_activities_user_time ON activities(user_id, occurred_at)",
        )
        .await?;
        self.execute_ddl(
            "CREATE INDEX IF NOT EXISTS idx_activities_user_kind ON activities(user_id, kind, occurred_at)",
        )
        .await?;

        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS user_context (
                user_id TEXT PRIMARY KEY,
                has_active_meal_plan BOOLEAN NOT NULL DEFAULT 0,
                pantry_item_count INTEGER NOT NULL DEFAULT 0,
                has_projections BOOLEAN NOT NULL DEFAULT 0
            )
            ",
        )
        .await?;

        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS daily_consistency (
                user_id TEXT NOT NULL,
                day TEXT NOT NULL,
                score REAL NOT NULL,
                PRIMARY KEY (user_id, day)
            )
            ",
        )
        .await
    }

    /// Append an activity record
    ///
    /// Recording the same record id again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn record_activity(&self, record: &ActivityRecord) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO activities (id, user_id, kind, occurred_at, calories, protein_g, carbs_g,
                                    fat_g, weight_kg, heart_rate_avg, duration_minutes, succeeded)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT(id) DO NOTHING
            ",
        )
        .bind(record.id.to_string())
        .bind(record.user_id.to_string())
        .bind(record.kind.as_str())
        .bind(format_timestamp(record.occurred_at))
        .bind(record.calories)
        .bind(record.protein_g)
        .bind(record.carbs_g)
        .bind(record.fat_g)
        .bind(record.weight_kg)
        .bind(record.heart_rate_avg)
        .bind(record.duration_minutes)
        .bind(record.succeeded)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to record activity: {e}")))?;

        Ok(())
    }

    /// Activities at or after `since`, oldest first; an empty `kinds` slice means all kinds
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a row is malformed
    pub async fn list_activities(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        kinds: &[ActivityKind],
    ) -> AppResult<Vec<ActivityRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities \
             WHERE user_id = $1 AND occurred_at >= $2 ORDER BY occurred_at ASC"
        ))
        .bind(user_id.to_string())
        .bind(format_timestamp(since))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list activities: {e}")))?;

        let records = rows
            .iter()
            .map(Self::row_to_activity)
            .collect::<AppResult<Vec<_>>>()?;
        Ok(records
            .into_iter()
            .filter(|r| kinds.is_empty() || kinds.contains(&r.kind))
            .collect())
    }

    /// Most recent activity of any kind
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn latest_activity_at(&self, user_id: Uuid) -> AppResult<Option<DateTime<Utc>>> {
        let latest: Option<String> =
            sqlx::query_scalar("SELECT MAX(occurred_at) FROM activities WHERE user_id = $1")
                .bind(user_id.to_string())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to load latest activity: {e}")))?;

        latest.as_deref().map(parse_timestamp).transpose()
    }

    /// Total count, count since `recent_since`, and latest timestamp for one kind
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn domain_aggregate(
        &self,
        user_id: Uuid,
        kind: ActivityKind,
        recent_since: DateTime<Utc>,
    ) -> AppResult<DomainAggregate> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) AS total,
                   COALESCE(SUM(CASE WHEN occurred_at >= $3 THEN 1 ELSE 0 END), 0) AS recent,
                   MAX(occurred_at) AS last_at
            FROM activities
            WHERE user_id = $1 AND kind = $2
            ",
        )
        .bind(user_id.to_string())
        .bind(kind.as_str())
        .bind(format_timestamp(recent_since))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to aggregate {}: {e}", kind.as_str())))?;

        let total: i64 = row.get("total");
        let recent: i64 = row.get("recent");
        let last_at: Option<String> = row.get("last_at");

        Ok(DomainAggregate::new(
            to_u32(total),
            to_u32(recent),
            last_at.as_deref().map(parse_timestamp).transpose()?,
        ))
    }

    /// Calendar days (UTC) with at least one activity since `since`, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn active_days(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<NaiveDate>> {
        let days: Vec<String> = sqlx::query_scalar(
            r"
            SELECT DISTINCT substr(occurred_at, 1, 10) AS day
            FROM activities
            WHERE user_id = $1 AND occurred_at >= $2
            ORDER BY day DESC
            ",
        )
        .bind(user_id.to_string())
        .bind(format_timestamp(since))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load active days: {e}")))?;

        days.iter().map(|d| parse_date(d)).collect()
    }

    /// Weight readings from weight updates and body scans since `since`, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn weight_points(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<WeightPoint>> {
        let rows = sqlx::query(
            r"
            SELECT kind, occurred_at, weight_kg
            FROM activities
            WHERE user_id = $1 AND occurred_at >= $2
              AND kind IN ('weight_update', 'body_scan') AND weight_kg IS NOT NULL
            ORDER BY occurred_at ASC
            ",
        )
        .bind(user_id.to_string())
        .bind(format_timestamp(since))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load weight history: {e}")))?;

        rows.iter()
            .map(|row| {
                let kind: String = row.get("kind");
                let occurred_at: String = row.get("occurred_at");
                Ok(WeightPoint {
                    recorded_at: parse_timestamp(&occurred_at)?,
                    weight_kg: row.get("weight_kg"),
                    source: if kind == "body_scan" {
                        WeightSource::BodyScan
                    } else {
                        WeightSource::WeightUpdate
                    },
                })
            })
            .collect()
    }

    /// Insert or replace the user's context flags
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn upsert_user_context(&self, context: &UserContext) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO user_context (user_id, has_active_meal_plan, pantry_item_count, has_projections)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT(user_id) DO UPDATE SET
                has_active_meal_plan = excluded.has_active_meal_plan,
                pantry_item_count = excluded.pantry_item_count,
                has_projections = excluded.has_projections
            ",
        )
        .bind(context.user_id.to_string())
        .bind(context.has_active_meal_plan)
        .bind(i64::from(context.pantry_item_count))
        .bind(context.has_projections)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to save user context: {e}")))?;

        Ok(())
    }

    /// The user's context flags, if any were stored
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user_context(&self, user_id: Uuid) -> AppResult<Option<UserContext>> {
        let row = sqlx::query(
            r"
            SELECT has_active_meal_plan, pantry_item_count, has_projections
            FROM user_context WHERE user_id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load user context: {e}")))?;

        Ok(row.map(|row| UserContext {
            user_id,
            has_active_meal_plan: row.get("has_active_meal_plan"),
            pantry_item_count: to_u32(row.get("pantry_item_count")),
            has_projections: row.get("has_projections"),
        }))
    }

    /// Store the consistency score for one day
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn upsert_daily_consistency(
        &self,
        user_id: Uuid,
        day: NaiveDate,
        score: f64,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO daily_consistency (user_id, day, score) VALUES ($1, $2, $3)
            ON CONFLICT(user_id, day) DO UPDATE SET score = excluded.score
            ",
        )
        .bind(user_id.to_string())
        .bind(format_date(day))
        .bind(score)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to save daily consistency: {e}")))?;

        Ok(())
    }

    /// Stored consistency score for one day
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_daily_consistency(
        &self,
        user_id: Uuid,
        day: NaiveDate,
    ) -> AppResult<Option<f64>> {
        sqlx::query_scalar("SELECT score FROM daily_consistency WHERE user_id = $1 AND day = $2")
            .bind(user_id.to_string())
            .bind(format_date(day))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to load daily consistency: {e}")))
    }

    fn row_to_activity(row: &SqliteRow) -> AppResult<ActivityRecord> {
        let id: String = row.get("id");
        let user_id: String = row.get("user_id");
        let kind: String = row.get("kind");
        let occurred_at: String = row.get("occurred_at");

        Ok(ActivityRecord {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            kind: kind
                .parse()
                .map_err(|e: AppError| AppError::database(e.to_string()))?,
            occurred_at: parse_timestamp(&occurred_at)?,
            calories: row.get("calories"),
            protein_g: row.get("protein_g"),
            carbs_g: row.get("carbs_g"),
            fat_g: row.get("fat_g"),
            weight_kg: row.get("weight_kg"),
            heart_rate_avg: row.get("heart_rate_avg"),
            duration_minutes: row.get("duration_minutes"),
            succeeded: row.get("succeeded"),
        })
    }
}
