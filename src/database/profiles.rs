// ABOUTME: User weight profile and transformation objective storage
// ABOUTME: At most one active objective per user, enforced by a partial unique index
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use super::{format_date, format_timestamp, parse_date, parse_timestamp, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use twinforge_core::models::{TransformationObjective, UserProfile};
use uuid::Uuid;

impl Database {
    pub(super) async fn migrate_profiles(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS profiles (
                user_id TEXT PRIMARY KEY,
                current_weight_kg REAL,
                target_weight_kg REAL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .await?;

        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS objectives (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                objective_type TEXT NOT NULL,
                target_value REAL,
                target_unit TEXT,
                target_date TEXT,
                priority INTEGER NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )
            ",
        )
        .await?;
        self.execute_ddl(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_objectives_one_active ON objectives(user_id) WHERE is_active = 1",
        )
        .await
    }

    /// Insert or replace the user's weight profile
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn upsert_profile(&self, profile: &UserProfile) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO profiles (user_id, current_weight_kg, target_weight_kg, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT(user_id) DO UPDATE SET
                current_weight_kg = excluded.current_weight_kg,
                target_weight_kg = excluded.target_weight_kg,
                updated_at = excluded.updated_at
            ",
        )
        .bind(profile.user_id.to_string())
        .bind(profile.current_weight_kg)
        .bind(profile.target_weight_kg)
        .bind(format_timestamp(profile.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to save profile: {e}")))?;

        Ok(())
    }

    /// The user's weight profile
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query(
            r"
            SELECT current_weight_kg, target_weight_kg, updated_at
            FROM profiles WHERE user_id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load profile: {e}")))?;

        row.map(|row| {
            let updated_at: String = row.get("updated_at");
            Ok(UserProfile {
                user_id,
                current_weight_kg: row.get("current_weight_kg"),
                target_weight_kg: row.get("target_weight_kg"),
                updated_at: parse_timestamp(&updated_at)?,
            })
        })
        .transpose()
    }

    /// Set the current weight, creating the profile if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn update_current_weight(
        &self,
        user_id: Uuid,
        weight_kg: f64,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO profiles (user_id, current_weight_kg, updated_at) VALUES ($1, $2, $3)
            ON CONFLICT(user_id) DO UPDATE SET
                current_weight_kg = excluded.current_weight_kg,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user_id.to_string())
        .bind(weight_kg)
        .bind(format_timestamp(at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update weight: {e}")))?;

        Ok(())
    }

    /// Make `objective` the user's only active objective
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails
    pub async fn set_active_objective(&self, objective: &TransformationObjective) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query("UPDATE objectives SET is_active = 0 WHERE user_id = $1 AND is_active = 1")
            .bind(objective.user_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to deactivate objectives: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO objectives (id, user_id, objective_type, target_value, target_unit,
                                    target_date, priority, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 1, $8)
            ",
        )
        .bind(objective.id.to_string())
        .bind(objective.user_id.to_string())
        .bind(objective.objective_type.as_str())
        .bind(objective.target_value)
        .bind(objective.target_unit.as_deref())
        .bind(objective.target_date.map(format_date))
        .bind(objective.priority)
        .bind(format_timestamp(objective.created_at))
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit objective: {e}")))?;
        Ok(())
    }

    /// The user's active objective
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the row is malformed
    pub async fn get_active_objective(
        &self,
        user_id: Uuid,
    ) -> AppResult<Option<TransformationObjective>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, objective_type, target_value, target_unit, target_date,
                   priority, is_active, created_at
            FROM objectives
            WHERE user_id = $1 AND is_active = 1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load objective: {e}")))?;

        row.as_ref().map(Self::row_to_objective).transpose()
    }

    fn row_to_objective(row: &SqliteRow) -> AppResult<TransformationObjective> {
        let id: String = row.get("id");
        let user_id: String = row.get("user_id");
        let objective_type: String = row.get("objective_type");
        let target_date: Option<String> = row.get("target_date");
        let created_at: String = row.get("created_at");

        Ok(TransformationObjective {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            objective_type: objective_type
                .parse()
                .map_err(|e: AppError| AppError::database(e.to_string()))?,
            target_value: row.get("target_value"),
            target_unit: row.get("target_unit"),
            target_date: target_date.as_deref().map(parse_date).transpose()?,
            priority: row.get("priority"),
            is_active: row.get("is_active"),
            created_at: parse_timestamp(&created_at)?,
        })
    }
}
