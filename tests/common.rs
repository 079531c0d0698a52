// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: In-memory stores, engines, a scripted generative provider, and seeding helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
//! Shared test utilities for `twinforge_engagement`
//!
//! This module provides common test setup functions to reduce duplication
//! across integration tests.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use tracing::Level;
use twinforge_core::models::{
    ActionCategory, ActionType, ActivityRecord, ImpactLevel, ObjectiveType,
    TransformationObjective, UserProfile,
};
use twinforge_engagement::errors::{AppError, AppResult};
use twinforge_engagement::external::{
    ActionSuggestionRequest, AnalysisRequest, GeneratedAction, GenerativeContentProvider,
};
use twinforge_engagement::services::EngagementEngine;
use twinforge_engagement::{EngagementStore, SqliteEngagementStore};
use uuid::Uuid;

/// Seed used by every engine built here so estimates are reproducible
pub const TEST_ESTIMATION_SEED: u64 = 42;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Fixed reference instant so day boundaries are stable across runs
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Fresh in-memory store
pub async fn create_test_store() -> Result<Arc<dyn EngagementStore>> {
    init_test_logging();
    let store = SqliteEngagementStore::new("sqlite::memory:").await?;
    Ok(Arc::new(store))
}

/// Engine over a fresh in-memory store, without generative content
pub async fn create_test_engine() -> Result<EngagementEngine> {
    let store = create_test_store().await?;
    Ok(EngagementEngine::new(store, None, Some(TEST_ESTIMATION_SEED)))
}

/// Engine over a fresh in-memory store with `provider`
pub async fn create_test_engine_with(
    provider: Arc<dyn GenerativeContentProvider>,
) -> Result<EngagementEngine> {
    let store = create_test_store().await?;
    Ok(EngagementEngine::new(
        store,
        Some(provider),
        Some(TEST_ESTIMATION_SEED),
    ))
}

/// Store a profile weight and target
pub async fn seed_profile(
    store: &Arc<dyn EngagementStore>,
    user_id: Uuid,
    current_weight_kg: Option<f64>,
    target_weight_kg: Option<f64>,
    now: DateTime<Utc>,
) -> Result<()> {
    store
        .upsert_profile(&UserProfile {
            user_id,
            current_weight_kg,
            target_weight_kg,
            updated_at: now,
        })
        .await?;
    Ok(())
}

/// Make `objective_type` the active objective
pub async fn seed_objective(
    store: &Arc<dyn EngagementStore>,
    user_id: Uuid,
    objective_type: ObjectiveType,
    now: DateTime<Utc>,
) -> Result<()> {
    let mut objective = TransformationObjective::new(user_id, objective_type);
    objective.created_at = now;
    store.set_active_objective(&objective).await?;
    Ok(())
}

/// Log a meal and a training session on each of the `days` days ending at `last_day`
pub async fn seed_daily_routine(
    engine: &EngagementEngine,
    user_id: Uuid,
    last_day: DateTime<Utc>,
    days: i64,
) -> Result<()> {
    for offset in (0..days).rev() {
        let at = last_day - Duration::days(offset);
        engine
            .activity
            .log_activity(ActivityRecord::meal(user_id, at, 650.0, 45.0, 70.0, 20.0))
            .await?;
        engine
            .activity
            .log_activity(ActivityRecord::training(user_id, at, 45.0, 380.0))
            .await?;
    }
    Ok(())
}

/// Generative provider answering from a script and counting calls
pub struct ScriptedGenerativeProvider {
    analysis: Option<String>,
    actions: Option<Vec<GeneratedAction>>,
    analysis_calls: AtomicUsize,
    action_calls: AtomicUsize,
}

impl ScriptedGenerativeProvider {
    /// Provider returning `actions` and `analysis`
    pub fn new(analysis: Option<&str>, actions: Option<Vec<GeneratedAction>>) -> Self {
        Self {
            analysis: analysis.map(str::to_owned),
            actions,
            analysis_calls: AtomicUsize::new(0),
            action_calls: AtomicUsize::new(0),
        }
    }

    /// Provider failing every call
    pub fn failing() -> Self {
        Self::new(None, None)
    }

    /// Number of analysis requests received
    pub fn analysis_calls(&self) -> usize {
        self.analysis_calls.load(Ordering::SeqCst)
    }

    /// Number of action requests received
    pub fn action_calls(&self) -> usize {
        self.action_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeContentProvider for ScriptedGenerativeProvider {
    async fn generate_analysis(&self, _request: &AnalysisRequest) -> AppResult<String> {
        self.analysis_calls.fetch_add(1, Ordering::SeqCst);
        self.analysis
            .clone()
            .ok_or_else(|| AppError::external_service("generative content", "scripted failure"))
    }

    async fn generate_actions(
        &self,
        _request: &ActionSuggestionRequest,
    ) -> AppResult<Vec<GeneratedAction>> {
        self.action_calls.fetch_add(1, Ordering::SeqCst);
        self.actions
            .clone()
            .ok_or_else(|| AppError::external_service("generative content", "scripted failure"))
    }
}

/// Generated action with defaults for the fields tests do not care about
pub fn generated_action(title: &str) -> GeneratedAction {
    GeneratedAction {
        title: title.to_owned(),
        description: format!("{title} today"),
        category: ActionCategory::Nutrition,
        action_type: ActionType::QuickWin,
        priority: 40,
        impact: ImpactLevel::Medium,
        tokens_required: 0,
    }
}
