// ABOUTME: Domain service layer orchestrating the store, the algorithms, and the generative provider
// ABOUTME: Each service owns one engagement workflow and is reusable from the CLI and tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! Domain service layer
//!
//! Services hold `Arc<dyn EngagementStore>` (and, where needed, an optional
//! `Arc<dyn GenerativeContentProvider>`). Algorithms stay pure in
//! `twinforge_intelligence`; services load their inputs, call them, and
//! persist the results.

/// Activity logging with per-activity XP
pub mod activity;

/// Activity snapshot, streak, and daily consistency assembly
pub mod snapshot;

/// Adaptive score computation
pub mod scoring;

/// Transformation prediction generation
pub mod prediction;

/// Universal level prediction
pub mod level;

/// Dashboard action queue generation
pub mod action_queue;

/// Absence detection and activity estimation
pub mod absence_detection;

/// Reconciliation saga
pub mod reconciliation;

/// Wiring of every service over one store
pub mod engine;

pub use absence_detection::{AbsenceCheck, AbsenceDetectionService};
pub use action_queue::{ActionGeneration, ActionQueueService};
pub use activity::ActivityService;
pub use engine::EngagementEngine;
pub use level::LevelPredictionService;
pub use prediction::TransformationPredictionService;
pub use reconciliation::{ReconciliationOutcome, ReconciliationReport, ReconciliationService};
pub use scoring::{ScoreReport, ScoringService};
pub use snapshot::{current_streak, local_consistency_score, EngagementContext, SnapshotService};
