// ABOUTME: Engagement scoring, prediction, and anti-abuse algorithms for TwinForge
// ABOUTME: Pure computation over domain models; storage and HTTP live in the service crate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

#![deny(unsafe_code)]

//! # TwinForge Intelligence
//!
//! Algorithms behind the engagement dashboard. Every function here is a pure
//! computation over values loaded by the caller, so the same inputs always
//! produce the same outputs (randomness in activity estimation comes from an
//! injected RNG).
//!
//! ## Modules
//!
//! - **config**: Tunable thresholds with environment overrides
//! - **level_curve**: XP to level conversion
//! - **adaptive_scores**: Objective-weighted per-domain scores
//! - **transformation_prediction**: Weight trajectory projection
//! - **level_prediction**: Goal-independent level forecast
//! - **action_rules**: Declarative dashboard action catalogue
//! - **absence**: Absence tiers and episode transitions
//! - **activity_estimation**: Baselines and per-day estimates during absences
//! - **anti_cheat**: Plausibility checks on reported weight changes
//! - **coaching**: Messages shown after reconciliation

/// Engagement configuration
pub mod config;

/// Level curve
pub mod level_curve;

/// Regression and summary statistics
pub mod statistical_analysis;

/// Adaptive score calculator
pub mod adaptive_scores;

/// Transformation prediction engine
pub mod transformation_prediction;

/// Universal level prediction
pub mod level_prediction;

/// Dashboard action rules
pub mod action_rules;

/// Absence state machine
pub mod absence;

/// Activity estimation during absences
pub mod activity_estimation;

/// Anti-cheat weight validation
pub mod anti_cheat;

/// Coaching messages
pub mod coaching;

pub use absence::{AbsenceClassifier, AbsenceTransition};
pub use action_rules::{
    default_catalogue, fallback_catalogue, select_rules, ActionCondition, ActionContext,
    ActionRule, Domain,
};
pub use activity_estimation::{estimation_rng, ActivityEstimator};
pub use adaptive_scores::{calculate_adaptive_scores, AdaptiveScoreCalculator, ScoringInputs};
pub use anti_cheat::{
    validate_weight_change, AntiCheatValidator, ValidationHistory, WeightChangeInput,
};
pub use coaching::{coaching_messages, CoachingContext};
pub use config::{ConfigError, EngagementConfig};
pub use level_curve::{level_for_xp, xp_for_level, xp_to_next_level, LevelProgress};
pub use level_prediction::{LevelPredictor, XpHistory};
pub use statistical_analysis::{RegressionResult, StatisticalAnalyzer};
pub use transformation_prediction::{
    project_transformation, PredictionInput, TransformationPredictor,
};
