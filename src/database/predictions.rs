// ABOUTME: Transformation prediction storage
// ABOUTME: Each generation inserts a new row and flips earlier rows inactive
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use super::{format_timestamp, Database};
use crate::errors::{AppError, AppResult};
use sqlx::Row;
use twinforge_core::models::TransformationPrediction;
use uuid::Uuid;

impl Database {
    pub(super) async fn migrate_predictions(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS transformation_predictions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                weekly_trend REAL NOT NULL,
                days_to_target INTEGER NOT NULL,
                confidence_score REAL NOT NULL,
                payload TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )
            ",
        )
        .await?;
        self.execute_ddl(
            "CREATE INDEX IF NOT EXISTS idx_predictions_user_active ON transformation_predictions(user_id, is_active)",
        )
        .await
    }

    /// Insert a prediction as the user's active one, superseding earlier rows
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the transaction fails
    pub async fn save_prediction(&self, prediction: &TransformationPrediction) -> AppResult<()> {
        let payload = serde_json::to_string(prediction)?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query(
            "UPDATE transformation_predictions SET is_active = 0 WHERE user_id = $1 AND is_active = 1",
        )
        .bind(prediction.user_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to supersede predictions: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO transformation_predictions
                (id, user_id, weekly_trend, days_to_target, confidence_score, payload, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, 1, $7)
            ",
        )
        .bind(prediction.id.to_string())
        .bind(prediction.user_id.to_string())
        .bind(prediction.weekly_trend)
        .bind(prediction.days_to_target)
        .bind(prediction.confidence_score)
        .bind(payload)
        .bind(format_timestamp(prediction.created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to save prediction: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit prediction: {e}")))?;
        Ok(())
    }

    /// The user's current prediction
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the payload is malformed
    pub async fn get_active_prediction(
        &self,
        user_id: Uuid,
    ) -> AppResult<Option<TransformationPrediction>> {
        let row = sqlx::query(
            r"
            SELECT payload FROM transformation_predictions
            WHERE user_id = $1 AND is_active = 1
            ORDER BY created_at DESC
            LIMIT 1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load prediction: {e}")))?;

        row.map(|row| {
            let payload: String = row.get("payload");
            serde_json::from_str(&payload).map_err(AppError::from)
        })
        .transpose()
    }

    /// Number of prediction rows ever stored for the user
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn count_predictions(&self, user_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM transformation_predictions WHERE user_id = $1")
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count predictions: {e}")))
    }
}
