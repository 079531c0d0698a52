// ABOUTME: Dashboard action records produced by the action queue generator
// ABOUTME: Action types, categories, impact levels, and the expiring action row
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use crate::errors::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Kind of suggested action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Small task completable in minutes
    QuickWin,
    /// Step toward a larger goal
    Milestone,
    /// Recurring habit
    Routine,
    /// Stretch task
    Challenge,
    /// Time-sensitive task
    Urgent,
}

impl ActionType {
    /// Every action type
    pub const ALL: [Self; 5] = [
        Self::QuickWin,
        Self::Milestone,
        Self::Routine,
        Self::Challenge,
        Self::Urgent,
    ];

    /// Storage name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QuickWin => "quick_win",
            Self::Milestone => "milestone",
            Self::Routine => "routine",
            Self::Challenge => "challenge",
            Self::Urgent => "urgent",
        }
    }
}

impl FromStr for ActionType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AppError::invalid_input(format!("Unknown action type: {s}")))
    }
}

/// Area an action belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    /// Training sessions
    Training,
    /// Meals and macros
    Nutrition,
    /// Body scans and weight
    BodyScan,
    /// Fasting
    Fasting,
    /// Wearable devices
    Wearable,
    /// Streaks and daily habits
    Consistency,
    /// Objective setup
    Objective,
}

impl ActionCategory {
    /// Every category
    pub const ALL: [Self; 7] = [
        Self::Training,
        Self::Nutrition,
        Self::BodyScan,
        Self::Fasting,
        Self::Wearable,
        Self::Consistency,
        Self::Objective,
    ];

    /// Storage name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Training => "training",
            Self::Nutrition => "nutrition",
            Self::BodyScan => "body_scan",
            Self::Fasting => "fasting",
            Self::Wearable => "wearable",
            Self::Consistency => "consistency",
            Self::Objective => "objective",
        }
    }
}

impl FromStr for ActionCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| AppError::invalid_input(format!("Unknown action category: {s}")))
    }
}

/// Expected effect of completing an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    /// Minor effect
    Low,
    /// Noticeable effect
    Medium,
    /// Major effect
    High,
}

impl ImpactLevel {
    /// Storage name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for ImpactLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(AppError::invalid_input(format!(
                "Unknown impact level: {other}"
            ))),
        }
    }
}

/// Where an action came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSource {
    /// Rule catalogue
    Rule,
    /// Generative-content endpoint
    Generative,
    /// Static fallback list
    Fallback,
}

impl ActionSource {
    /// Storage name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::Generative => "generative",
            Self::Fallback => "fallback",
        }
    }
}

impl FromStr for ActionSource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rule" => Ok(Self::Rule),
            "generative" => Ok(Self::Generative),
            "fallback" => Ok(Self::Fallback),
            other => Err(AppError::invalid_input(format!(
                "Unknown action source: {other}"
            ))),
        }
    }
}

/// A suggested action shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardAction {
    /// Row id
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Action kind
    pub action_type: ActionType,
    /// Area
    pub category: ActionCategory,
    /// Title; unique among a user's live actions
    pub title: String,
    /// Longer description
    pub description: String,
    /// Ranking score, higher first
    pub priority_score: u32,
    /// Expected effect
    pub estimated_impact: ImpactLevel,
    /// Tokens the action costs to run
    pub tokens_required: u32,
    /// Expiry instant
    pub expires_at: DateTime<Utc>,
    /// Whether the user completed it
    pub is_completed: bool,
    /// Whether the user dismissed it
    pub is_dismissed: bool,
    /// Completion time
    pub completed_at: Option<DateTime<Utc>>,
    /// Origin
    pub source: ActionSource,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl DashboardAction {
    /// Whether the action is still shown to the user at `now`
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed && !self.is_dismissed && self.expires_at > now
    }
}
