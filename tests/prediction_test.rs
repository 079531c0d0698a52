// ABOUTME: Integration tests for scores, transformation predictions, and level forecasts
// ABOUTME: Seeds weight and activity histories and checks the persisted projections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::Duration;
use twinforge_core::models::{ActivityRecord, ObjectiveType};
use twinforge_engagement::constants::xp_sources::{MEAL_XP, TRAINING_XP};
use uuid::Uuid;

#[tokio::test]
async fn test_steady_loss_projects_a_target_date() {
    let engine = common::create_test_engine().await.unwrap();
    let store = engine.store();
    let user_id = Uuid::new_v4();
    let now = common::fixed_now();
    let start = now - Duration::days(14);

    common::seed_profile(&store, user_id, Some(90.0), Some(80.0), start)
        .await
        .unwrap();
    common::seed_objective(&store, user_id, ObjectiveType::FatLoss, start)
        .await
        .unwrap();
    for day in 0..=14_i32 {
        let weight = 0.1_f64.mul_add(-f64::from(day), 90.0);
        engine
            .activity
            .log_activity(ActivityRecord::weight_update(
                user_id,
                start + Duration::days(i64::from(day)),
                weight,
            ))
            .await
            .unwrap();
    }

    let prediction = engine
        .predictions
        .generate_prediction(user_id, now)
        .await
        .unwrap()
        .unwrap();

    assert!((prediction.current_weight - 88.6).abs() < 1e-9);
    assert!((prediction.target_weight - 80.0).abs() < f64::EPSILON);
    assert!(prediction.raw_weekly_trend < 0.0);
    assert!(prediction.weekly_trend < 0.0);
    assert_eq!(prediction.data_points, 15);
    assert!(prediction.days_to_target > 30 && prediction.days_to_target < 400);
    assert!(prediction.optimistic_date <= prediction.estimated_date);
    assert!(prediction.estimated_date <= prediction.pessimistic_date);
    assert!((20.0..=95.0).contains(&prediction.confidence_score));

    let active = engine
        .predictions
        .active_prediction(user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(active.id, prediction.id);

    let newer = engine
        .predictions
        .generate_prediction(user_id, now + Duration::hours(1))
        .await
        .unwrap()
        .unwrap();
    let active = engine
        .predictions
        .active_prediction(user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(active.id, newer.id);
}

#[tokio::test]
async fn test_single_weight_reading_is_not_projected() {
    let engine = common::create_test_engine().await.unwrap();
    let store = engine.store();
    let user_id = Uuid::new_v4();
    let now = common::fixed_now();

    common::seed_profile(&store, user_id, Some(90.0), Some(80.0), now)
        .await
        .unwrap();
    engine
        .activity
        .log_activity(ActivityRecord::weight_update(user_id, now, 90.0))
        .await
        .unwrap();

    let prediction = engine
        .predictions
        .generate_prediction(user_id, now)
        .await
        .unwrap();
    assert!(prediction.is_none());
    assert!(engine
        .predictions
        .active_prediction(user_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_level_forecast_from_daily_routine() {
    let engine = common::create_test_engine().await.unwrap();
    let user_id = Uuid::new_v4();
    let now = common::fixed_now();

    assert!(engine
        .levels
        .predict_level(user_id, now)
        .await
        .unwrap()
        .is_none());

    common::seed_daily_routine(&engine, user_id, now, 20)
        .await
        .unwrap();
    let prediction = engine
        .levels
        .predict_level(user_id, now)
        .await
        .unwrap()
        .unwrap();

    let expected = 20 * (MEAL_XP + TRAINING_XP);
    assert_eq!(prediction.current_xp, expected);
    assert_eq!(prediction.xp_last_30_days, expected);
    assert_eq!(prediction.projections.len(), 3);
    assert!(prediction
        .projections
        .windows(2)
        .all(|pair| pair[0].projected_xp <= pair[1].projected_xp));
    assert!(prediction.average_xp_per_day > 0.0);
}

#[tokio::test]
async fn test_scores_stay_in_range_for_active_and_new_users() {
    let engine = common::create_test_engine().await.unwrap();
    let now = common::fixed_now();

    let newcomer = engine.scoring.compute_scores(Uuid::new_v4(), now).await.unwrap();
    assert_eq!(newcomer.streak_days, 0);
    assert!((0.0..=100.0).contains(&newcomer.scores.overall_score));

    let user_id = Uuid::new_v4();
    common::seed_daily_routine(&engine, user_id, now, 10)
        .await
        .unwrap();
    let report = engine.scoring.compute_scores(user_id, now).await.unwrap();
    assert_eq!(report.streak_days, 10);
    assert!((0.0..=100.0).contains(&report.scores.overall_score));
}
