// ABOUTME: Adaptive score records produced by the scoring calculator
// ABOUTME: Per-category forge scores, overall score, trend, and confidence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use super::objective::ScoreCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Score for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForgeScore {
    /// Score in 0-100
    pub score: f64,
    /// Weight of this category in the overall score (0-1)
    pub weight: f64,
    /// Human-readable explanation of the score
    pub details: String,
    /// Raw entries behind the score
    pub data_points: u32,
    /// Most recent entry in the category
    pub last_activity: Option<DateTime<Utc>>,
}

impl ForgeScore {
    /// Zero score with an explanation
    #[must_use]
    pub fn zero(weight: f64, details: impl Into<String>) -> Self {
        Self {
            score: 0.0,
            weight,
            details: details.into(),
            data_points: 0,
            last_activity: None,
        }
    }
}

/// Direction the user's engagement is heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTrend {
    /// High score and recent activity
    Improving,
    /// Moderate score or moderate recency
    Stable,
    /// Low score or long inactivity
    Declining,
}

impl ScoreTrend {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Stable => "stable",
            Self::Declining => "declining",
        }
    }
}

/// Complete adaptive score result; always derived, never a source of truth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveScores {
    /// Training score
    pub training: ForgeScore,
    /// Nutrition score
    pub nutrition: ForgeScore,
    /// Body-scan score
    pub body_scan: ForgeScore,
    /// Fasting score
    pub fasting: ForgeScore,
    /// Wearable score
    pub wearable: ForgeScore,
    /// Consistency score
    pub consistency: ForgeScore,
    /// Weighted sum of the six category scores (0-100)
    pub overall_score: f64,
    /// Progress on the active objective's primary categories (0-100)
    pub objective_progress: f64,
    /// Engagement trend
    pub trend: ScoreTrend,
    /// Confidence from data volume (0-100)
    pub confidence: f64,
}

impl AdaptiveScores {
    /// Score record for one category
    #[must_use]
    pub const fn category(&self, category: ScoreCategory) -> &ForgeScore {
        match category {
            ScoreCategory::Training => &self.training,
            ScoreCategory::Nutrition => &self.nutrition,
            ScoreCategory::BodyScan => &self.body_scan,
            ScoreCategory::Fasting => &self.fasting,
            ScoreCategory::Wearable => &self.wearable,
            ScoreCategory::Consistency => &self.consistency,
        }
    }
}
