// ABOUTME: Activity records and the read-only per-domain activity snapshot
// ABOUTME: Inputs for adaptive scoring, absence detection, and activity estimation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use crate::errors::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Kind of tracked activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Logged meal
    Meal,
    /// Training session
    Training,
    /// Explicit weight entry
    WeightUpdate,
    /// Body scan (carries a weight reading)
    BodyScan,
    /// Wearable-recorded activity
    Wearable,
    /// Fasting session
    Fasting,
}

impl ActivityKind {
    /// Every activity kind
    pub const ALL: [Self; 6] = [
        Self::Meal,
        Self::Training,
        Self::WeightUpdate,
        Self::BodyScan,
        Self::Wearable,
        Self::Fasting,
    ];

    /// Storage name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Meal => "meal",
            Self::Training => "training",
            Self::WeightUpdate => "weight_update",
            Self::BodyScan => "body_scan",
            Self::Wearable => "wearable",
            Self::Fasting => "fasting",
        }
    }
}

impl FromStr for ActivityKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AppError::invalid_input(format!("Unknown activity kind: {s}")))
    }
}

/// One tracked activity entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Row id
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Kind of entry
    pub kind: ActivityKind,
    /// When the activity happened
    pub occurred_at: DateTime<Utc>,
    /// Calories consumed (meals) or burned (training, wearable)
    pub calories: Option<f64>,
    /// Protein in grams (meals)
    pub protein_g: Option<f64>,
    /// Carbohydrates in grams (meals)
    pub carbs_g: Option<f64>,
    /// Fat in grams (meals)
    pub fat_g: Option<f64>,
    /// Body weight in kg (weight updates, body scans)
    pub weight_kg: Option<f64>,
    /// Average heart rate (wearable)
    pub heart_rate_avg: Option<f64>,
    /// Duration in minutes (training, fasting hours are stored as minutes too)
    pub duration_minutes: Option<f64>,
    /// Whether a fasting session reached its goal
    pub succeeded: Option<bool>,
}

impl ActivityRecord {
    fn base(user_id: Uuid, kind: ActivityKind, occurred_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            occurred_at,
            calories: None,
            protein_g: None,
            carbs_g: None,
            fat_g: None,
            weight_kg: None,
            heart_rate_avg: None,
            duration_minutes: None,
            succeeded: None,
        }
    }

    /// Logged meal with macros
    #[must_use]
    pub fn meal(
        user_id: Uuid,
        occurred_at: DateTime<Utc>,
        calories: f64,
        protein_g: f64,
        carbs_g: f64,
        fat_g: f64,
    ) -> Self {
        Self {
            calories: Some(calories),
            protein_g: Some(protein_g),
            carbs_g: Some(carbs_g),
            fat_g: Some(fat_g),
            ..Self::base(user_id, ActivityKind::Meal, occurred_at)
        }
    }

    /// Training session
    #[must_use]
    pub fn training(
        user_id: Uuid,
        occurred_at: DateTime<Utc>,
        duration_minutes: f64,
        calories_burned: f64,
    ) -> Self {
        Self {
            calories: Some(calories_burned),
            duration_minutes: Some(duration_minutes),
            ..Self::base(user_id, ActivityKind::Training, occurred_at)
        }
    }

    /// Explicit weight entry
    #[must_use]
    pub fn weight_update(user_id: Uuid, occurred_at: DateTime<Utc>, weight_kg: f64) -> Self {
        Self {
            weight_kg: Some(weight_kg),
            ..Self::base(user_id, ActivityKind::WeightUpdate, occurred_at)
        }
    }

    /// Body scan with its weight reading
    #[must_use]
    pub fn body_scan(user_id: Uuid, occurred_at: DateTime<Utc>, weight_kg: f64) -> Self {
        Self {
            weight_kg: Some(weight_kg),
            ..Self::base(user_id, ActivityKind::BodyScan, occurred_at)
        }
    }

    /// Wearable-recorded activity
    #[must_use]
    pub fn wearable(
        user_id: Uuid,
        occurred_at: DateTime<Utc>,
        calories_burned: f64,
        heart_rate_avg: Option<f64>,
    ) -> Self {
        Self {
            calories: Some(calories_burned),
            heart_rate_avg,
            ..Self::base(user_id, ActivityKind::Wearable, occurred_at)
        }
    }

    /// Fasting session
    #[must_use]
    pub fn fasting(
        user_id: Uuid,
        occurred_at: DateTime<Utc>,
        duration_minutes: f64,
        succeeded: bool,
    ) -> Self {
        Self {
            duration_minutes: Some(duration_minutes),
            succeeded: Some(succeeded),
            ..Self::base(user_id, ActivityKind::Fasting, occurred_at)
        }
    }
}

/// Which record a weight data point came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightSource {
    /// Explicit weight entry
    WeightUpdate,
    /// Body scan reading
    BodyScan,
}

/// A dated weight reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightPoint {
    /// When the weight was recorded
    pub recorded_at: DateTime<Utc>,
    /// Weight in kg
    pub weight_kg: f64,
    /// Origin of the reading
    pub source: WeightSource,
}

/// Aggregate counts for one tracked domain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainAggregate {
    /// Whether the user ever logged this domain
    pub has_data: bool,
    /// All-time entry count
    pub total_count: u32,
    /// Entries in the domain's rolling window
    pub recent_count: u32,
    /// Most recent entry
    pub last_activity: Option<DateTime<Utc>>,
}

impl DomainAggregate {
    /// Aggregate from counts, setting `has_data` from the total
    #[must_use]
    pub const fn new(
        total_count: u32,
        recent_count: u32,
        last_activity: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            has_data: total_count > 0,
            total_count,
            recent_count,
            last_activity,
        }
    }
}

/// Nutrition-specific snapshot fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionExtras {
    /// Average protein per logged day (g)
    pub avg_daily_protein_g: Option<f64>,
    /// Whether an active meal plan exists
    pub has_active_meal_plan: bool,
    /// Pantry/fridge inventory size
    pub pantry_item_count: u32,
}

/// Body-scan-specific snapshot fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyScanExtras {
    /// Whether forward projections were generated from scans
    pub has_projections: bool,
}

/// Fasting-specific snapshot fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FastingExtras {
    /// Consecutive days with a fasting session
    pub current_streak_days: u32,
    /// Share of sessions that reached their goal (0-100)
    pub success_rate_percent: f64,
}

/// Wearable-specific snapshot fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WearableExtras {
    /// Average heart rate across recorded activities
    pub avg_heart_rate: Option<f64>,
    /// Total calories burned in the window
    pub total_calories_burned: f64,
}

/// Context flags maintained by other parts of the product (meal planner,
/// pantry, body projections) and folded into the snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    /// Owner
    pub user_id: Uuid,
    /// A meal plan is currently active
    pub has_active_meal_plan: bool,
    /// Items in the pantry or fridge inventory
    pub pantry_item_count: u32,
    /// Forward body projections exist
    pub has_projections: bool,
}

/// Read-only activity snapshot across all tracked domains
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivitySnapshot {
    /// Training sessions (recent window: 7 days)
    pub training: DomainAggregate,
    /// Meals (recent window: 10 days)
    pub nutrition: DomainAggregate,
    /// Body scans (recent window: 30 days)
    pub body_scan: DomainAggregate,
    /// Fasting sessions (recent window: 30 days)
    pub fasting: DomainAggregate,
    /// Wearable activities (recent window: 7 days)
    pub wearable: DomainAggregate,
    /// Nutrition extras
    pub nutrition_extras: NutritionExtras,
    /// Body-scan extras
    pub body_scan_extras: BodyScanExtras,
    /// Fasting extras
    pub fasting_extras: FastingExtras,
    /// Wearable extras
    pub wearable_extras: WearableExtras,
}

impl ActivitySnapshot {
    /// Aggregates of all domains that feed the trend, in a fixed order
    #[must_use]
    pub fn domains(&self) -> [&DomainAggregate; 5] {
        [
            &self.training,
            &self.nutrition,
            &self.body_scan,
            &self.fasting,
            &self.wearable,
        ]
    }

    /// Whether no domain has any data
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains().iter().all(|d| !d.has_data)
    }

    /// Sum of all-time entry counts
    #[must_use]
    pub fn total_data_points(&self) -> u32 {
        self.domains().iter().map(|d| d.total_count).sum()
    }
}
