// ABOUTME: End-to-end test of one user's engagement lifecycle through a configured engine
// ABOUTME: Logs a routine, scores, queues actions, goes absent, returns, and reconciles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::Duration;
use std::sync::Arc;
use twinforge_core::models::{AbsenceStatus, AbsenceTier, ActivityRecord, ObjectiveType};
use twinforge_engagement::config::ServerConfig;
use twinforge_engagement::constants::xp_sources::MEAL_XP;
use twinforge_engagement::logging::LoggingConfig;
use twinforge_engagement::services::{EngagementEngine, ReconciliationOutcome};
use twinforge_engagement::SqliteEngagementStore;
use uuid::Uuid;

#[tokio::test]
async fn test_full_engagement_lifecycle() {
    common::init_test_logging();
    let config = ServerConfig {
        database_url: "sqlite::memory:".to_owned(),
        generative: None,
        estimation_seed: Some(common::TEST_ESTIMATION_SEED),
        logging: LoggingConfig::default(),
    };
    config.validate().unwrap();
    let engine = EngagementEngine::from_config(&config).await.unwrap();
    let store = engine.store();

    let user_id = Uuid::new_v4();
    let now = common::fixed_now();
    let last_day = now - Duration::days(12);

    common::seed_profile(&store, user_id, Some(95.0), Some(85.0), last_day - Duration::days(30))
        .await
        .unwrap();
    common::seed_objective(&store, user_id, ObjectiveType::FatLoss, last_day - Duration::days(30))
        .await
        .unwrap();
    common::seed_daily_routine(&engine, user_id, last_day, 30)
        .await
        .unwrap();
    engine
        .activity
        .log_activity(ActivityRecord::weight_update(user_id, last_day - Duration::days(29), 95.0))
        .await
        .unwrap();
    engine
        .activity
        .log_activity(ActivityRecord::weight_update(user_id, last_day, 93.0))
        .await
        .unwrap();

    let scores = engine.scoring.compute_scores(user_id, last_day).await.unwrap();
    assert_eq!(scores.streak_days, 30);
    assert_eq!(scores.objective, Some(ObjectiveType::FatLoss));

    let queue = engine.actions.generate_actions(user_id, last_day).await.unwrap();
    assert!(!queue.live.is_empty());

    let prediction = engine
        .predictions
        .generate_prediction(user_id, last_day)
        .await
        .unwrap();
    assert!(prediction.is_some_and(|p| p.weekly_trend < 0.0));

    let check = engine.absences.check_absence(user_id, now).await.unwrap();
    assert_eq!(check.tier, AbsenceTier::MaxReached);
    let log = check.log.unwrap();
    assert_eq!(log.days_absent, 12);
    assert_eq!(check.rewards_created, 12);

    let xp_before = store.total_xp(user_id).await.unwrap();
    let outcome = engine
        .reconciliation
        .reconcile(user_id, 92.2, now + Duration::minutes(5))
        .await
        .unwrap();
    let ReconciliationOutcome::Completed(report) = outcome else {
        panic!("reconciliation should complete");
    };
    assert!(report.reconciliation.xp_awarded > 0);
    assert_eq!(
        store.total_xp(user_id).await.unwrap(),
        xp_before + report.reconciliation.xp_awarded
    );
    assert_eq!(
        store.get_absence_log(log.id).await.unwrap().unwrap().status,
        AbsenceStatus::Reconciled
    );

    let level = engine
        .levels
        .predict_level(user_id, now + Duration::minutes(10))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(level.current_xp, xp_before + report.reconciliation.xp_awarded);

    let back = engine
        .absences
        .check_absence(user_id, now + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(back.tier, AbsenceTier::None);
    assert!(back.log.is_none());
}

#[tokio::test]
async fn test_file_database_survives_reopen() {
    common::init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("engagement.db").display());
    let user_id = Uuid::new_v4();
    let meal = ActivityRecord::meal(user_id, common::fixed_now(), 600.0, 40.0, 60.0, 20.0);

    {
        let store = SqliteEngagementStore::new(&url).await.unwrap();
        let engine = EngagementEngine::new(Arc::new(store), None, None);
        engine.activity.log_activity(meal.clone()).await.unwrap();
    }

    let store = SqliteEngagementStore::new(&url).await.unwrap();
    let engine = EngagementEngine::new(Arc::new(store), None, None);
    let replay = engine.activity.log_activity(meal).await.unwrap();
    assert!(!replay.xp.unwrap().newly_awarded);
    assert_eq!(
        engine.store().total_xp(user_id).await.unwrap(),
        MEAL_XP
    );
}
