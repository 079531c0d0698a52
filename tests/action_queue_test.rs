// ABOUTME: Integration tests for dashboard action queue generation
// ABOUTME: Covers title dedup across passes, generative and static fallbacks, and expiry cleanup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::Duration;
use std::collections::HashSet;
use std::sync::Arc;
use twinforge_core::models::{ActionSource, DashboardAction};
use uuid::Uuid;

fn titles(actions: &[DashboardAction]) -> Vec<&str> {
    actions.iter().map(|a| a.title.as_str()).collect()
}

fn assert_unique_titles(actions: &[DashboardAction]) {
    let unique: HashSet<&str> = titles(actions).into_iter().collect();
    assert_eq!(unique.len(), actions.len(), "duplicate live titles: {:?}", titles(actions));
}

#[tokio::test]
async fn test_new_user_gets_rule_actions_without_duplicates() {
    let engine = common::create_test_engine().await.unwrap();
    let user_id = Uuid::new_v4();
    let now = common::fixed_now();

    let first = engine.actions.generate_actions(user_id, now).await.unwrap();
    assert!(first.inserted > 0);
    assert!(first.live.len() <= 5 + 3);
    assert_unique_titles(&first.live);

    let second = engine
        .actions
        .generate_actions(user_id, now + Duration::minutes(10))
        .await
        .unwrap();
    assert_unique_titles(&second.live);
    assert!(second.live.len() >= first.live.len());
    for action in &first.live {
        assert!(second.live.iter().any(|a| a.title == action.title));
    }
}

#[tokio::test]
async fn test_static_fallback_when_rules_and_generation_yield_nothing() {
    let engine = common::create_test_engine().await.unwrap();
    let actions = engine.actions.clone().with_rules(Vec::new());
    let user_id = Uuid::new_v4();
    let now = common::fixed_now();

    let first = actions.generate_actions(user_id, now).await.unwrap();
    assert!(first.used_fallback);
    assert!(!first.used_generative);
    assert_eq!(first.inserted, 3);
    assert!(first.live.iter().all(|a| a.source == ActionSource::Fallback));

    let second = actions
        .generate_actions(user_id, now + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.live.len(), 3);
}

#[tokio::test]
async fn test_generated_actions_fill_the_gap_once_per_title() {
    let provider = Arc::new(common::ScriptedGenerativeProvider::new(
        None,
        Some(vec![
            common::generated_action("Prep tomorrow's lunch"),
            common::generated_action("Prep tomorrow's lunch"),
            common::generated_action("Try a new protein source"),
        ]),
    ));
    let engine = common::create_test_engine_with(provider.clone()).await.unwrap();
    let actions = engine.actions.clone().with_rules(Vec::new());
    let user_id = Uuid::new_v4();
    let now = common::fixed_now();

    let first = actions.generate_actions(user_id, now).await.unwrap();
    assert!(first.used_generative);
    assert!(!first.used_fallback);
    assert_eq!(first.inserted, 2);
    assert!(first.live.iter().all(|a| a.source == ActionSource::Generative));
    assert_eq!(provider.action_calls(), 1);

    let second = actions
        .generate_actions(user_id, now + Duration::hours(1))
        .await
        .unwrap();
    // Every suggestion repeats a live title, so the static list fills in.
    assert_eq!(provider.action_calls(), 2);
    assert!(!second.used_generative);
    assert!(second.used_fallback);
    assert_eq!(second.inserted, 3);
    assert_eq!(second.live.len(), 5);
    assert_unique_titles(&second.live);
}

#[tokio::test]
async fn test_generation_failure_falls_back_to_static_list() {
    let provider = Arc::new(common::ScriptedGenerativeProvider::failing());
    let engine = common::create_test_engine_with(provider.clone()).await.unwrap();
    let actions = engine.actions.clone().with_rules(Vec::new());

    let generation = actions
        .generate_actions(Uuid::new_v4(), common::fixed_now())
        .await
        .unwrap();
    assert_eq!(provider.action_calls(), 1);
    assert!(generation.used_fallback);
    assert_eq!(generation.inserted, 3);
}

#[tokio::test]
async fn test_expired_actions_are_cleaned_before_generating() {
    let engine = common::create_test_engine().await.unwrap();
    let actions = engine.actions.clone().with_rules(Vec::new());
    let user_id = Uuid::new_v4();
    let now = common::fixed_now();

    actions.generate_actions(user_id, now).await.unwrap();

    let later = now + Duration::days(3);
    let regenerated = actions.generate_actions(user_id, later).await.unwrap();
    assert_eq!(regenerated.expired_removed, 3);
    assert_eq!(regenerated.inserted, 3);
    assert!(regenerated.live.iter().all(|a| a.expires_at > later));

    let removed = actions
        .cleanup_expired_actions(user_id, later + Duration::days(3))
        .await
        .unwrap();
    assert_eq!(removed, 3);
}

#[tokio::test]
async fn test_completed_and_dismissed_actions_leave_the_queue() {
    let engine = common::create_test_engine().await.unwrap();
    let actions = engine.actions.clone().with_rules(Vec::new());
    let user_id = Uuid::new_v4();
    let now = common::fixed_now();

    let generation = actions.generate_actions(user_id, now).await.unwrap();
    let done = generation.live[0].id;
    let dismissed = generation.live[1].id;

    assert!(actions.complete_action(user_id, done, now).await.unwrap());
    assert!(!actions.complete_action(Uuid::new_v4(), dismissed, now).await.unwrap());
    assert!(actions.dismiss_action(user_id, dismissed).await.unwrap());

    let live = engine.store().list_live_actions(user_id, now).await.unwrap();
    assert_eq!(live.len(), 1);
    assert!(live.iter().all(|a| a.id != done && a.id != dismissed));
}

#[tokio::test]
async fn test_dismissed_action_is_not_regenerated() {
    let engine = common::create_test_engine().await.unwrap();
    let actions = engine.actions.clone().with_rules(Vec::new());
    let user_id = Uuid::new_v4();
    let now = common::fixed_now();

    let first = actions.generate_actions(user_id, now).await.unwrap();
    let dismissed = first.live[0].clone();
    assert!(actions.dismiss_action(user_id, dismissed.id).await.unwrap());

    let second = actions
        .generate_actions(user_id, now + Duration::minutes(5))
        .await
        .unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.live.len(), 2);
    assert!(second.live.iter().all(|a| a.title != dismissed.title));

    // Once the dismissed row expires its title may come back
    let later = now + Duration::days(2);
    let third = actions.generate_actions(user_id, later).await.unwrap();
    assert_eq!(third.expired_removed, 3);
    assert!(third.live.iter().any(|a| a.title == dismissed.title));
}
