// ABOUTME: Domain models for the TwinForge engagement engine
// ABOUTME: Objectives, activity snapshots, scores, predictions, absences, actions, XP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! # Data Models
//!
//! Plain serializable records shared by the algorithm crate and the service
//! layer. Models hold no I/O; persistence lives behind the store trait.

/// Absence episodes, estimates, rewards, and reconciliation records
pub mod absence;
/// Dashboard actions
pub mod action;
/// Activity records and snapshots
pub mod activity;
/// Transformation objectives, weight tables, and validation bands
pub mod objective;
/// Transformation and level predictions
pub mod prediction;
/// Adaptive score records
pub mod scores;
/// XP events
pub mod xp;

pub use absence::{
    AbsenceLog, AbsenceReconciliation, AbsenceStatus, AbsenceTier, ActivityBaseline,
    DailyEstimate, EstimatedActivity, IntentStatus, PendingXpReward, ReconciliationIntent,
    ReconciliationStep, RewardStatus, ValidationResult,
};
pub use action::{ActionCategory, ActionSource, ActionType, DashboardAction, ImpactLevel};
pub use activity::{
    ActivityKind, ActivityRecord, ActivitySnapshot, BodyScanExtras, DomainAggregate,
    FastingExtras, NutritionExtras, UserContext, WearableExtras, WeightPoint, WeightSource,
};
pub use objective::{
    CategoryWeights, ExpectedChange, ObjectiveType, ScoreCategory, TransformationObjective,
    UserProfile, ValidationBand,
};
pub use prediction::{
    DataQuality, InfluenceFactors, LevelProjection, ProjectionMethod, TransformationPrediction,
    UniversalLevelPrediction,
};
pub use scores::{AdaptiveScores, ForgeScore, ScoreTrend};
pub use xp::{source_key, XpAward, XpEvent, XpSummary};
