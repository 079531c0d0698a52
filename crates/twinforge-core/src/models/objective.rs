// ABOUTME: Transformation objective types with per-objective scoring weights and validation bands
// ABOUTME: Single source of truth for everything keyed by the six objective kinds
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use crate::errors::AppError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Scoring categories combined into the overall adaptive score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    /// Training sessions
    Training,
    /// Meals and nutrition tracking
    Nutrition,
    /// Body scans and measurements
    BodyScan,
    /// Fasting sessions
    Fasting,
    /// Wearable activity data
    Wearable,
    /// Daily consistency and streaks
    Consistency,
}

impl ScoreCategory {
    /// All categories in scoring order
    pub const ALL: [Self; 6] = [
        Self::Training,
        Self::Nutrition,
        Self::BodyScan,
        Self::Fasting,
        Self::Wearable,
        Self::Consistency,
    ];
}

/// Weight vector across the six scoring categories
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    /// Training weight
    pub training: f64,
    /// Nutrition weight
    pub nutrition: f64,
    /// Body-scan weight
    pub body_scan: f64,
    /// Fasting weight
    pub fasting: f64,
    /// Wearable weight
    pub wearable: f64,
    /// Consistency weight
    pub consistency: f64,
}

impl CategoryWeights {
    /// Weights used when the user has no active objective
    pub const DEFAULT: Self = Self {
        training: 0.20,
        nutrition: 0.20,
        body_scan: 0.15,
        fasting: 0.15,
        wearable: 0.15,
        consistency: 0.15,
    };

    /// Weight for one category
    #[must_use]
    pub const fn get(&self, category: ScoreCategory) -> f64 {
        match category {
            ScoreCategory::Training => self.training,
            ScoreCategory::Nutrition => self.nutrition,
            ScoreCategory::BodyScan => self.body_scan,
            ScoreCategory::Fasting => self.fasting,
            ScoreCategory::Wearable => self.wearable,
            ScoreCategory::Consistency => self.consistency,
        }
    }

    /// Sum of all six weights
    #[must_use]
    pub fn sum(&self) -> f64 {
        ScoreCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }

    /// The two highest-weighted categories, ties broken by scoring order
    #[must_use]
    pub fn primary_categories(&self) -> [ScoreCategory; 2] {
        let mut ranked = ScoreCategory::ALL;
        ranked.sort_by(|a, b| {
            self.get(*b)
                .partial_cmp(&self.get(*a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        [ranked[0], ranked[1]]
    }
}

/// Weight change an objective expects, with its optimal weekly rate band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "direction", rename_all = "snake_case")]
pub enum ExpectedChange {
    /// Weight should go down at a rate within the band (kg/week)
    Decrease {
        /// Lower edge of the optimal band
        optimal_min: f64,
        /// Upper edge of the optimal band
        optimal_max: f64,
    },
    /// Weight should go up at a rate within the band (kg/week)
    Increase {
        /// Lower edge of the optimal band
        optimal_min: f64,
        /// Upper edge of the optimal band
        optimal_max: f64,
    },
    /// Weight should hold within a weekly tolerance (kg/week)
    Stable {
        /// Maximum weekly drift considered maintenance
        tolerance: f64,
    },
}

/// Plausibility band used by weight-change validation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationBand {
    /// Expected direction and optimal rate
    pub expected: ExpectedChange,
    /// Coherence multiplier when the change lands inside the optimal band
    pub alignment_multiplier: f64,
}

/// The user's declared transformation goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveType {
    /// Lose body fat (`weight_loss` on the wire as well)
    #[serde(alias = "weight_loss")]
    FatLoss,
    /// Gain lean mass
    MuscleGain,
    /// Improve endurance capacity
    Endurance,
    /// Increase strength
    Strength,
    /// General health; weight maintenance (`maintenance` on the wire as well)
    #[serde(alias = "maintenance")]
    HealthOptimization,
    /// Lose fat while gaining muscle at stable weight
    BodyRecomposition,
}

impl ObjectiveType {
    /// Every objective kind
    pub const ALL: [Self; 6] = [
        Self::FatLoss,
        Self::MuscleGain,
        Self::Endurance,
        Self::Strength,
        Self::HealthOptimization,
        Self::BodyRecomposition,
    ];

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FatLoss => "fat_loss",
            Self::MuscleGain => "muscle_gain",
            Self::Endurance => "endurance",
            Self::Strength => "strength",
            Self::HealthOptimization => "health_optimization",
            Self::BodyRecomposition => "body_recomposition",
        }
    }

    /// Scoring weights across the six categories; each vector sums to 1.0
    #[must_use]
    pub const fn weights(self) -> CategoryWeights {
        match self {
            Self::FatLoss => CategoryWeights {
                training: 0.20,
                nutrition: 0.30,
                body_scan: 0.15,
                fasting: 0.15,
                wearable: 0.10,
                consistency: 0.10,
            },
            Self::MuscleGain => CategoryWeights {
                training: 0.35,
                nutrition: 0.30,
                body_scan: 0.15,
                fasting: 0.05,
                wearable: 0.05,
                consistency: 0.10,
            },
            Self::Endurance => CategoryWeights {
                training: 0.35,
                nutrition: 0.20,
                body_scan: 0.05,
                fasting: 0.05,
                wearable: 0.25,
                consistency: 0.10,
            },
            Self::Strength => CategoryWeights {
                training: 0.40,
                nutrition: 0.25,
                body_scan: 0.10,
                fasting: 0.05,
                wearable: 0.10,
                consistency: 0.10,
            },
            Self::HealthOptimization => CategoryWeights {
                training: 0.15,
                nutrition: 0.25,
                body_scan: 0.15,
                fasting: 0.15,
                wearable: 0.15,
                consistency: 0.15,
            },
            Self::BodyRecomposition => CategoryWeights {
                training: 0.30,
                nutrition: 0.30,
                body_scan: 0.20,
                fasting: 0.05,
                wearable: 0.05,
                consistency: 0.10,
            },
        }
    }

    /// Weight-change plausibility band
    #[must_use]
    pub const fn validation_band(self) -> ValidationBand {
        match self {
            Self::FatLoss => ValidationBand {
                expected: ExpectedChange::Decrease {
                    optimal_min: 0.25,
                    optimal_max: 1.0,
                },
                alignment_multiplier: 1.2,
            },
            Self::MuscleGain => ValidationBand {
                expected: ExpectedChange::Increase {
                    optimal_min: 0.1,
                    optimal_max: 0.5,
                },
                alignment_multiplier: 1.15,
            },
            Self::Endurance => ValidationBand {
                expected: ExpectedChange::Decrease {
                    optimal_min: 0.0,
                    optimal_max: 0.5,
                },
                alignment_multiplier: 1.1,
            },
            Self::Strength => ValidationBand {
                expected: ExpectedChange::Increase {
                    optimal_min: 0.0,
                    optimal_max: 0.4,
                },
                alignment_multiplier: 1.1,
            },
            Self::HealthOptimization => ValidationBand {
                expected: ExpectedChange::Stable { tolerance: 0.75 },
                alignment_multiplier: 1.1,
            },
            Self::BodyRecomposition => ValidationBand {
                expected: ExpectedChange::Stable { tolerance: 0.5 },
                alignment_multiplier: 1.15,
            },
        }
    }

    /// Whether a weight gain works against this objective
    #[must_use]
    pub const fn penalizes_gain(self) -> bool {
        matches!(self, Self::FatLoss | Self::Endurance)
    }

    /// Whether a weight loss works against this objective
    #[must_use]
    pub const fn penalizes_loss(self) -> bool {
        matches!(self, Self::MuscleGain | Self::Strength)
    }
}

impl fmt::Display for ObjectiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectiveType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fat_loss" | "weight_loss" => Ok(Self::FatLoss),
            "muscle_gain" => Ok(Self::MuscleGain),
            "endurance" => Ok(Self::Endurance),
            "strength" => Ok(Self::Strength),
            "health_optimization" | "maintenance" => Ok(Self::HealthOptimization),
            "body_recomposition" => Ok(Self::BodyRecomposition),
            other => Err(AppError::invalid_input(format!(
                "Unknown objective type: {other}"
            ))),
        }
    }
}

/// A user's transformation objective; at most one is active per user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationObjective {
    /// Row id
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Objective kind
    pub objective_type: ObjectiveType,
    /// Target value (e.g. target weight)
    pub target_value: Option<f64>,
    /// Unit of `target_value`
    pub target_unit: Option<String>,
    /// Date the user wants to reach the target
    pub target_date: Option<NaiveDate>,
    /// User-assigned priority
    pub priority: i32,
    /// Whether this is the current objective
    pub is_active: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl TransformationObjective {
    /// New active objective
    #[must_use]
    pub fn new(user_id: Uuid, objective_type: ObjectiveType) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            objective_type,
            target_value: None,
            target_unit: None,
            target_date: None,
            priority: 1,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// Weight-related profile fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Owner
    pub user_id: Uuid,
    /// Most recent known weight (kg)
    pub current_weight_kg: Option<f64>,
    /// Target weight (kg)
    pub target_weight_kg: Option<f64>,
    /// Last profile update
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one_for_every_objective() {
        for objective in ObjectiveType::ALL {
            let sum = objective.weights().sum();
            assert!(
                (sum - 1.0).abs() < 1e-9,
                "{objective} weights sum to {sum}"
            );
        }
        assert!((CategoryWeights::DEFAULT.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_objective_aliases_parse() {
        assert_eq!(
            "weight_loss".parse::<ObjectiveType>().unwrap(),
            ObjectiveType::FatLoss
        );
        assert_eq!(
            "maintenance".parse::<ObjectiveType>().unwrap(),
            ObjectiveType::HealthOptimization
        );
        let from_json: ObjectiveType = serde_json::from_str("\"weight_loss\"").unwrap();
        assert_eq!(from_json, ObjectiveType::FatLoss);
        assert!("couch_potato".parse::<ObjectiveType>().is_err());
    }

    #[test]
    fn test_primary_categories_follow_weights() {
        let primary = ObjectiveType::Strength.weights().primary_categories();
        assert_eq!(primary, [ScoreCategory::Training, ScoreCategory::Nutrition]);
    }
}
