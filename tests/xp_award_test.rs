// ABOUTME: Integration tests for keyed, idempotent XP awards
// ABOUTME: Covers activity XP, replayed records, and explicit source-key grants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::Duration;
use twinforge_core::models::{source_key, ActivityRecord, XpEvent};
use twinforge_engagement::constants::xp_sources::{
    ABSENCE_RECONCILIATION, FASTING_XP, MEAL_XP, TRAINING_XP, WEIGHT_UPDATE_XP,
};
use uuid::Uuid;

#[tokio::test]
async fn test_relogging_the_same_record_awards_once() {
    let engine = common::create_test_engine().await.unwrap();
    let store = engine.store();
    let user_id = Uuid::new_v4();
    let meal = ActivityRecord::meal(user_id, common::fixed_now(), 520.0, 35.0, 50.0, 18.0);

    let first = engine.activity.log_activity(meal.clone()).await.unwrap();
    let award = first.xp.unwrap();
    assert!(award.newly_awarded);
    assert_eq!(award.total_xp, MEAL_XP);

    let replay = engine.activity.log_activity(meal).await.unwrap();
    let award = replay.xp.unwrap();
    assert!(!award.newly_awarded);
    assert_eq!(award.total_xp, MEAL_XP);
    assert_eq!(store.total_xp(user_id).await.unwrap(), MEAL_XP);
}

#[tokio::test]
async fn test_each_activity_kind_earns_its_amount() {
    let engine = common::create_test_engine().await.unwrap();
    let store = engine.store();
    let user_id = Uuid::new_v4();
    let now = common::fixed_now();

    let records = [
        ActivityRecord::meal(user_id, now, 600.0, 40.0, 60.0, 20.0),
        ActivityRecord::training(user_id, now + Duration::hours(1), 45.0, 380.0),
        ActivityRecord::weight_update(user_id, now + Duration::hours(2), 78.4),
        ActivityRecord::fasting(user_id, now + Duration::hours(3), 960.0, true),
        ActivityRecord::fasting(user_id, now + Duration::hours(4), 300.0, false),
    ];
    for record in records {
        engine.activity.log_activity(record).await.unwrap();
    }

    assert_eq!(
        store.total_xp(user_id).await.unwrap(),
        MEAL_XP + TRAINING_XP + WEIGHT_UPDATE_XP + FASTING_XP
    );
    let events = store
        .list_xp_events(user_id, now - Duration::days(1))
        .await
        .unwrap();
    assert_eq!(events.len(), 4);

    let profile = store.get_profile(user_id).await.unwrap().unwrap();
    assert_eq!(profile.current_weight_kg, Some(78.4));
}

#[tokio::test]
async fn test_repeated_source_key_keeps_the_first_amount() {
    let store = common::create_test_store().await.unwrap();
    let user_id = Uuid::new_v4();
    let key = source_key(ABSENCE_RECONCILIATION, Uuid::new_v4());

    let first = store
        .award_xp(&XpEvent::new(user_id, key.clone(), 140))
        .await
        .unwrap();
    assert!(first.newly_awarded);

    let second_event = XpEvent::new(user_id, key.clone(), 999);
    let third_event = XpEvent::new(user_id, key.clone(), 140);
    let (second, third) = tokio::join!(
        store.award_xp(&second_event),
        store.award_xp(&third_event),
    );
    let second = second.unwrap();
    let third = third.unwrap();
    assert!(!second.newly_awarded);
    assert!(!third.newly_awarded);
    assert_eq!(second.event.amount, 140);
    assert_eq!(second.event.id, first.event.id);
    assert_eq!(store.total_xp(user_id).await.unwrap(), 140);
}

#[tokio::test]
async fn test_invalid_weight_is_not_logged() {
    let engine = common::create_test_engine().await.unwrap();
    let user_id = Uuid::new_v4();
    let result = engine
        .activity
        .log_activity(ActivityRecord::weight_update(
            user_id,
            common::fixed_now(),
            f64::NAN,
        ))
        .await;

    assert!(result.is_err());
    assert_eq!(engine.store().total_xp(user_id).await.unwrap(), 0);
}
