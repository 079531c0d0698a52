// ABOUTME: Integration tests for absence reconciliation over an in-memory SQLite store
// ABOUTME: Covers the full saga, replays, resuming interrupted intents, and flagged weight changes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use twinforge_core::errors::ErrorCode;
use twinforge_core::models::{
    source_key, AbsenceLog, AbsenceStatus, IntentStatus, ObjectiveType, ReconciliationIntent,
    RewardStatus, XpEvent,
};
use twinforge_engagement::constants::xp_sources::ABSENCE_RECONCILIATION;
use twinforge_engagement::services::{EngagementEngine, ReconciliationOutcome, ReconciliationReport};
use uuid::Uuid;

/// User with 20 active days, a fat-loss objective at 82 kg, then 10 days away
async fn absent_user(engine: &EngagementEngine) -> (Uuid, AbsenceLog, DateTime<Utc>) {
    let store = engine.store();
    let user_id = Uuid::new_v4();
    let last_day = common::fixed_now() - Duration::days(30);

    common::seed_daily_routine(engine, user_id, last_day, 20)
        .await
        .unwrap();
    common::seed_profile(&store, user_id, Some(82.0), Some(75.0), last_day)
        .await
        .unwrap();
    common::seed_objective(&store, user_id, ObjectiveType::FatLoss, last_day)
        .await
        .unwrap();

    let now = last_day + Duration::days(10) + Duration::hours(3);
    let check = engine.absences.check_absence(user_id, now).await.unwrap();
    (user_id, check.log.unwrap(), now)
}

fn completed(outcome: ReconciliationOutcome) -> ReconciliationReport {
    match outcome {
        ReconciliationOutcome::Completed(report) => *report,
        ReconciliationOutcome::Failed { error } => panic!("reconciliation failed: {error}"),
    }
}

#[tokio::test]
async fn test_reconciliation_awards_scaled_pending_xp_once() {
    let engine = common::create_test_engine().await.unwrap();
    let store = engine.store();
    let (user_id, log, now) = absent_user(&engine).await;

    let rewards = store.list_rewards_for_absence(log.id).await.unwrap();
    assert_eq!(rewards.len(), 10);
    let pending: u64 = rewards.iter().map(|r| r.final_xp).sum();
    let xp_before = store.total_xp(user_id).await.unwrap();

    let report = completed(engine.reconciliation.reconcile(user_id, 81.0, now).await.unwrap());
    let record = &report.reconciliation;

    assert!(report.newly_awarded);
    assert_eq!(record.absence_log_id, log.id);
    assert_eq!(record.previous_weight, Some(82.0));
    assert!((record.weight_delta + 1.0).abs() < 1e-9);
    assert_eq!(record.pending_xp, pending);
    assert!(report.validation.objective_aligned);
    assert_eq!(record.bonus_xp, 50);
    let scaled = (pending as f64 * record.adjusted_multiplier).round() as u64;
    assert_eq!(record.xp_awarded, scaled + record.bonus_xp);
    assert!(!report.coaching_messages.is_empty());
    assert!(report.insight.is_none());

    assert_eq!(
        store.total_xp(user_id).await.unwrap(),
        xp_before + record.xp_awarded
    );

    let closed = store.get_absence_log(log.id).await.unwrap().unwrap();
    assert_eq!(closed.status, AbsenceStatus::Reconciled);
    let paid = store.list_rewards_for_absence(log.id).await.unwrap();
    assert!(paid.iter().all(|r| r.status == RewardStatus::Awarded));

    let profile = store.get_profile(user_id).await.unwrap().unwrap();
    assert_eq!(profile.current_weight_kg, Some(81.0));
    assert!(store.list_pending_intents(user_id).await.unwrap().is_empty());

    let replay = engine
        .reconciliation
        .reconcile(user_id, 81.0, now + Duration::minutes(5))
        .await
        .unwrap();
    assert!(!replay.is_completed());
    assert_eq!(
        store.total_xp(user_id).await.unwrap(),
        xp_before + record.xp_awarded
    );

    let after = engine
        .absences
        .check_absence(user_id, now + Duration::hours(1))
        .await
        .unwrap();
    assert!(after.log.is_none());
}

#[tokio::test]
async fn test_reconciliation_measures_absence_at_return_time() {
    let engine = common::create_test_engine().await.unwrap();
    let store = engine.store();
    let user_id = Uuid::new_v4();
    let last_day = common::fixed_now() - Duration::days(30);

    common::seed_daily_routine(&engine, user_id, last_day, 20)
        .await
        .unwrap();
    common::seed_profile(&store, user_id, Some(82.0), Some(75.0), last_day)
        .await
        .unwrap();
    common::seed_objective(&store, user_id, ObjectiveType::FatLoss, last_day)
        .await
        .unwrap();

    // Detection last ran on day 3; the user weighs in on day 21
    let early = engine
        .absences
        .check_absence(user_id, last_day + Duration::days(3) + Duration::hours(1))
        .await
        .unwrap();
    let log = early.log.unwrap();
    assert_eq!(log.days_absent, 3);

    let now = last_day + Duration::days(21) + Duration::hours(1);
    let report = completed(engine.reconciliation.reconcile(user_id, 80.0, now).await.unwrap());
    let record = &report.reconciliation;

    assert_eq!(record.absence_log_id, log.id);
    assert_eq!(record.days_absent, 21);
    assert!(!record
        .validation_flags
        .iter()
        .any(|f| f == "extreme_loss_rate" || f == "high_loss_rate"));
    assert!(report.validation.objective_aligned);

    let rewards = store.list_rewards_for_absence(log.id).await.unwrap();
    assert_eq!(rewards.len(), 14);
    assert_eq!(record.pending_xp, rewards.iter().map(|r| r.final_xp).sum::<u64>());
}

#[tokio::test]
async fn test_concurrent_reconciliations_award_once() {
    let engine = common::create_test_engine().await.unwrap();
    let store = engine.store();
    let (user_id, log, now) = absent_user(&engine).await;
    let xp_before = store.total_xp(user_id).await.unwrap();

    let (first, second) = tokio::join!(
        engine.reconciliation.reconcile(user_id, 81.0, now),
        engine.reconciliation.reconcile(user_id, 81.0, now),
    );
    let outcomes = [first.unwrap(), second.unwrap()];
    assert!(outcomes.iter().any(ReconciliationOutcome::is_completed));

    let record = store
        .get_reconciliation_for_absence(log.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        store.total_xp(user_id).await.unwrap(),
        xp_before + record.xp_awarded
    );
}

#[tokio::test]
async fn test_resume_after_interrupted_award() {
    let engine = common::create_test_engine().await.unwrap();
    let store = engine.store();
    let (user_id, log, now) = absent_user(&engine).await;
    let xp_before = store.total_xp(user_id).await.unwrap();

    // An earlier run persisted its intent and granted the XP before stopping.
    let mut intent = ReconciliationIntent::new(user_id, log.id, 81.0);
    intent.created_at = now;
    intent.updated_at = now;
    store.begin_intent(&intent).await.unwrap();
    let mut granted = XpEvent::new(user_id, source_key(ABSENCE_RECONCILIATION, log.id), 120);
    granted.occurred_at = now;
    store.award_xp(&granted).await.unwrap();

    let outcomes = engine
        .reconciliation
        .resume_pending(user_id, now + Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 1);
    let report = completed(outcomes.into_iter().next().unwrap());

    assert!(!report.newly_awarded);
    assert_eq!(report.intent_id, intent.id);
    assert_eq!(store.total_xp(user_id).await.unwrap(), xp_before + 120);

    let closed = store.get_absence_log(log.id).await.unwrap().unwrap();
    assert_eq!(closed.status, AbsenceStatus::Reconciled);
    assert!(store.list_pending_intents(user_id).await.unwrap().is_empty());

    let again = engine
        .reconciliation
        .resume_pending(user_id, now + Duration::minutes(2))
        .await
        .unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn test_reconcile_without_open_absence_resumes_pending_intent() {
    let engine = common::create_test_engine().await.unwrap();
    let store = engine.store();
    let (user_id, _log, now) = absent_user(&engine).await;

    let first = completed(engine.reconciliation.reconcile(user_id, 80.5, now).await.unwrap());
    assert!(first.newly_awarded);
    let xp_after_first = store.total_xp(user_id).await.unwrap();

    // Progress lost after every step had been applied: the intent is pending again.
    let mut stale = store
        .begin_intent(&ReconciliationIntent::new(user_id, first.reconciliation.absence_log_id, 80.5))
        .await
        .unwrap();
    assert_eq!(stale.id, first.intent_id);
    stale.completed_steps.clear();
    stale.status = IntentStatus::Pending;
    store.update_intent(&stale).await.unwrap();
    assert_eq!(store.list_pending_intents(user_id).await.unwrap().len(), 1);

    let report = completed(
        engine
            .reconciliation
            .reconcile(user_id, 80.5, now + Duration::minutes(1))
            .await
            .unwrap(),
    );
    assert!(!report.newly_awarded);
    assert_eq!(report.reconciliation, first.reconciliation);
    assert_eq!(store.total_xp(user_id).await.unwrap(), xp_after_first);
    assert!(store.list_pending_intents(user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_implausible_change_is_scaled_not_blocked() {
    let engine = common::create_test_engine().await.unwrap();
    let (user_id, _log, now) = absent_user(&engine).await;

    let report = completed(engine.reconciliation.reconcile(user_id, 70.0, now).await.unwrap());
    let record = &report.reconciliation;

    assert!(record
        .validation_flags
        .iter()
        .any(|f| f == "extreme_loss_rate"));
    assert!(record.adjusted_multiplier < 1.0);
    assert!(record.adjusted_multiplier >= 0.3);
    assert_eq!(record.bonus_xp, 0);
    assert!(record.xp_awarded <= record.pending_xp);
}

#[tokio::test]
async fn test_reconciliation_without_absence_fails_softly() {
    let engine = common::create_test_engine().await.unwrap();
    let outcome = engine
        .reconciliation
        .reconcile(Uuid::new_v4(), 80.0, common::fixed_now())
        .await
        .unwrap();

    match outcome {
        ReconciliationOutcome::Failed { error } => assert!(error.contains("No active absence")),
        ReconciliationOutcome::Completed(_) => panic!("nothing to reconcile"),
    }
}

#[tokio::test]
async fn test_invalid_weight_is_rejected() {
    let engine = common::create_test_engine().await.unwrap();
    let err = engine
        .reconciliation
        .reconcile(Uuid::new_v4(), -3.0, common::fixed_now())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
}

#[tokio::test]
async fn test_generated_insight_is_attached_when_available() {
    let provider = Arc::new(common::ScriptedGenerativeProvider::new(
        Some("Great consistency while away."),
        None,
    ));
    let engine = common::create_test_engine_with(provider.clone()).await.unwrap();
    let (user_id, _log, now) = absent_user(&engine).await;

    let report = completed(engine.reconciliation.reconcile(user_id, 81.2, now).await.unwrap());
    assert_eq!(report.insight.as_deref(), Some("Great consistency while away."));
    assert_eq!(provider.analysis_calls(), 1);
}
