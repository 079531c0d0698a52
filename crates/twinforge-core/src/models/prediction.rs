// ABOUTME: Transformation and level prediction records
// ABOUTME: Weight-goal projections with influence factors and XP level projections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Composite 0-100 scores that modulate the raw weight trend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InfluenceFactors {
    /// Logged activity and training volume
    pub activity_score: f64,
    /// Current streak
    pub consistency_score: f64,
    /// Meal logging volume
    pub caloric_balance_score: f64,
    /// Weighted combination of the three
    pub overall_score: f64,
}

/// Projection of when the user reaches the target weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationPrediction {
    /// Row id
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Current weight (kg)
    pub current_weight: f64,
    /// Target weight (kg)
    pub target_weight: f64,
    /// Adjusted weekly trend (kg/week, signed)
    pub weekly_trend: f64,
    /// Raw regression trend before influence adjustment (kg/week)
    pub raw_weekly_trend: f64,
    /// Days until the target at the adjusted trend
    pub days_to_target: i64,
    /// Projected target date
    pub estimated_date: NaiveDate,
    /// Date under the optimistic scenario
    pub optimistic_date: NaiveDate,
    /// Date under the pessimistic scenario
    pub pessimistic_date: NaiveDate,
    /// Confidence in 20-95
    pub confidence_score: f64,
    /// Weight data points used
    pub data_points: u32,
    /// Influence factors
    pub influence_factors: InfluenceFactors,
    /// Human-readable recommendations
    pub recommendations: Vec<String>,
    /// Whether this is the user's current prediction
    pub is_active: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Projection multiplier family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMethod {
    /// 0.8x pace
    Conservative,
    /// 1.0x pace
    Realistic,
    /// 1.2x pace
    Optimistic,
}

/// Quality bucket for a user's history
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    /// Too little history to trust averages
    Poor,
    /// Usable history
    Fair,
    /// Solid history
    Good,
    /// Rich history
    Excellent,
}

impl DataQuality {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Poor => "poor",
            Self::Fair => "fair",
            Self::Good => "good",
            Self::Excellent => "excellent",
        }
    }
}

/// XP/level projection at one horizon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelProjection {
    /// Horizon in days
    pub days: i64,
    /// Multiplier family used
    pub method: ProjectionMethod,
    /// Projected cumulative XP
    pub projected_xp: u64,
    /// Level at the projected XP
    pub projected_level: u32,
    /// Levels gained over the horizon
    pub levels_gained: u32,
}

/// Goal-independent level forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversalLevelPrediction {
    /// Owner
    pub user_id: Uuid,
    /// Cumulative XP now
    pub current_xp: u64,
    /// Level now
    pub current_level: u32,
    /// XP still needed for the next level
    pub xp_to_next_level: u64,
    /// Trailing 30-day XP sum divided by 30
    pub average_xp_per_day: f64,
    /// Trailing 30-day XP sum
    pub xp_last_30_days: u64,
    /// Trailing 7-day XP sum
    pub xp_last_7_days: u64,
    /// 30, 60 and 90 day projections
    pub projections: Vec<LevelProjection>,
    /// Projection selected for display based on pace
    pub primary: LevelProjection,
    /// History quality bucket
    pub data_quality: DataQuality,
    /// Confidence in 0-100
    pub confidence_score: f64,
    /// Whether this is the low-confidence conservative fallback
    pub is_fallback: bool,
    /// Generation time
    pub generated_at: DateTime<Utc>,
}
