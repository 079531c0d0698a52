// ABOUTME: Integration tests for absence detection over an in-memory SQLite store
// ABOUTME: Covers tier crossings, the single open log under concurrency, and estimation rewards
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::Duration;
use twinforge_core::models::{AbsenceStatus, AbsenceTier, ActivityRecord, RewardStatus};
use uuid::Uuid;

#[tokio::test]
async fn test_user_without_activity_is_not_absent() {
    let engine = common::create_test_engine().await.unwrap();
    let check = engine
        .absences
        .check_absence(Uuid::new_v4(), common::fixed_now())
        .await
        .unwrap();

    assert_eq!(check.tier, AbsenceTier::None);
    assert!(check.log.is_none());
    assert!(check.last_activity.is_none());
}

#[tokio::test]
async fn test_crossing_48_hours_opens_one_log() {
    let engine = common::create_test_engine().await.unwrap();
    let user_id = Uuid::new_v4();
    let last_meal = common::fixed_now();
    engine
        .activity
        .log_activity(ActivityRecord::meal(user_id, last_meal, 600.0, 40.0, 60.0, 20.0))
        .await
        .unwrap();

    let soft = engine
        .absences
        .check_absence(user_id, last_meal + Duration::hours(30))
        .await
        .unwrap();
    assert_eq!(soft.tier, AbsenceTier::SoftReminder);
    assert!(soft.log.is_none());

    let check = engine
        .absences
        .check_absence(user_id, last_meal + Duration::hours(48) + Duration::minutes(2))
        .await
        .unwrap();
    assert_eq!(check.tier, AbsenceTier::Active);
    assert!(check.log_created);
    assert_eq!(check.days_estimated, 0);
    let log = check.log.unwrap();
    assert_eq!(log.status, AbsenceStatus::Active);
    assert_eq!(log.days_absent, 2);
    assert_eq!(log.absence_start_date, last_meal);

    let again = engine
        .absences
        .check_absence(user_id, last_meal + Duration::hours(50))
        .await
        .unwrap();
    assert!(!again.log_created);
    assert_eq!(again.log.unwrap().id, log.id);
}

#[tokio::test]
async fn test_concurrent_checks_share_one_log() {
    let engine = common::create_test_engine().await.unwrap();
    let store = engine.store();
    let user_id = Uuid::new_v4();
    let last_meal = common::fixed_now();
    engine
        .activity
        .log_activity(ActivityRecord::meal(user_id, last_meal, 600.0, 40.0, 60.0, 20.0))
        .await
        .unwrap();

    let now = last_meal + Duration::days(4) + Duration::hours(1);
    let (first, second) = tokio::join!(
        engine.absences.check_absence(user_id, now),
        engine.absences.check_absence(user_id, now),
    );
    let first = first.unwrap();
    let second = second.unwrap();

    assert_eq!(first.log.as_ref().unwrap().id, second.log.as_ref().unwrap().id);
    assert!(!(first.log_created && second.log_created));

    let logs = store
        .list_recent_absences(user_id, last_meal - Duration::days(1), 10)
        .await
        .unwrap();
    assert_eq!(logs.len(), 1);

    let rewards = store.list_rewards_for_absence(logs[0].id).await.unwrap();
    assert_eq!(rewards.len(), 4);
}

#[tokio::test]
async fn test_estimation_creates_one_reward_per_day() {
    let engine = common::create_test_engine().await.unwrap();
    let store = engine.store();
    let user_id = Uuid::new_v4();
    let last_day = common::fixed_now();
    common::seed_daily_routine(&engine, user_id, last_day, 20)
        .await
        .unwrap();

    let check = engine
        .absences
        .check_absence(user_id, last_day + Duration::days(10) + Duration::hours(2))
        .await
        .unwrap();
    assert_eq!(check.tier, AbsenceTier::MaxReached);
    assert_eq!(check.days_estimated, 10);
    assert_eq!(check.rewards_created, 10);

    let log = check.log.unwrap();
    let estimated = log.estimated_activity.as_ref().unwrap();
    assert_eq!(estimated.estimated_day_count(), 10);

    let rewards = store.list_rewards_for_absence(log.id).await.unwrap();
    assert_eq!(rewards.len(), 10);
    assert!(rewards.iter().all(|r| r.status == RewardStatus::Pending));
    assert!(rewards.iter().all(|r| r.final_xp <= r.base_estimated_xp));

    let repeat = engine
        .absences
        .check_absence(user_id, last_day + Duration::days(10) + Duration::hours(5))
        .await
        .unwrap();
    assert_eq!(repeat.rewards_created, 0);
    let unchanged = repeat.log.unwrap();
    assert_eq!(unchanged.estimated_activity.as_ref(), Some(estimated));
}

#[tokio::test]
async fn test_estimation_is_capped_at_fourteen_days() {
    let engine = common::create_test_engine().await.unwrap();
    let store = engine.store();
    let user_id = Uuid::new_v4();
    let last_day = common::fixed_now();
    common::seed_daily_routine(&engine, user_id, last_day, 3)
        .await
        .unwrap();

    let check = engine
        .absences
        .check_absence(user_id, last_day + Duration::days(30))
        .await
        .unwrap();
    assert_eq!(check.tier, AbsenceTier::Hibernation);

    let log = check.log.unwrap();
    assert_eq!(log.days_absent, 30);
    let rewards = store.list_rewards_for_absence(log.id).await.unwrap();
    assert_eq!(rewards.len(), 14);
}

#[tokio::test]
async fn test_return_without_reconciling_starts_new_episode() {
    let engine = common::create_test_engine().await.unwrap();
    let store = engine.store();
    let user_id = Uuid::new_v4();
    let start = common::fixed_now();
    engine
        .activity
        .log_activity(ActivityRecord::meal(user_id, start, 600.0, 40.0, 60.0, 20.0))
        .await
        .unwrap();

    let first = engine
        .absences
        .check_absence(user_id, start + Duration::days(3))
        .await
        .unwrap();
    let first_log = first.log.unwrap();

    let back = start + Duration::days(3) + Duration::hours(1);
    engine
        .activity
        .log_activity(ActivityRecord::training(user_id, back, 30.0, 250.0))
        .await
        .unwrap();

    let second = engine
        .absences
        .check_absence(user_id, back + Duration::days(2) + Duration::hours(1))
        .await
        .unwrap();
    assert!(second.log_created);
    assert_eq!(second.superseded_log_id, Some(first_log.id));

    let expired = store.get_absence_log(first_log.id).await.unwrap().unwrap();
    assert_eq!(expired.status, AbsenceStatus::Expired);
    let open = store.get_open_absence(user_id).await.unwrap().unwrap();
    assert_eq!(open.absence_start_date, back);
}

#[tokio::test]
async fn test_reminders_only_count_for_open_absence() {
    let engine = common::create_test_engine().await.unwrap();
    let user_id = Uuid::new_v4();
    let start = common::fixed_now();

    assert!(!engine.absences.record_reminder(user_id, start).await.unwrap());

    engine
        .activity
        .log_activity(ActivityRecord::meal(user_id, start, 600.0, 40.0, 60.0, 20.0))
        .await
        .unwrap();
    let now = start + Duration::hours(49);
    engine.absences.check_absence(user_id, now).await.unwrap();

    assert!(engine.absences.record_reminder(user_id, now).await.unwrap());
    let log = engine.store().get_open_absence(user_id).await.unwrap().unwrap();
    assert_eq!(log.reminder_sent_count, 1);
}
