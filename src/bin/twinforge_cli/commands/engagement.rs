// ABOUTME: Engagement commands for twinforge-cli
// ABOUTME: Scores, predictions, level projection, the action queue, and profile inputs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::info;
use twinforge_core::models::{ActivityRecord, ObjectiveType, TransformationObjective, UserProfile};
use twinforge_engagement::services::EngagementEngine;
use uuid::Uuid;

use crate::helpers::display::{print_actions, print_json};

/// Compute and print adaptive scores
pub async fn scores(engine: &EngagementEngine, user: Uuid, now: DateTime<Utc>) -> Result<()> {
    let report = engine.scoring.compute_scores(user, now).await?;
    print_json(&report)
}

/// Generate, store, and print a transformation prediction
pub async fn predict(engine: &EngagementEngine, user: Uuid, now: DateTime<Utc>) -> Result<()> {
    match engine.predictions.generate_prediction(user, now).await? {
        Some(prediction) => print_json(&prediction),
        None => {
            println!("Not enough data for a prediction (needs a current weight, a target, and two weight entries)");
            Ok(())
        }
    }
}

/// Print the level projection
pub async fn level(engine: &EngagementEngine, user: Uuid, now: DateTime<Utc>) -> Result<()> {
    match engine.levels.predict_level(user, now).await? {
        Some(prediction) => print_json(&prediction),
        None => {
            println!("No XP history yet");
            Ok(())
        }
    }
}

/// Run one action generation pass
pub async fn generate_actions(
    engine: &EngagementEngine,
    user: Uuid,
    now: DateTime<Utc>,
) -> Result<()> {
    let generation = engine.actions.generate_actions(user, now).await?;
    info!(
        "Inserted {} action(s), removed {} expired",
        generation.inserted, generation.expired_removed
    );
    print_actions(&generation.live);
    Ok(())
}

/// Mark an action completed
pub async fn complete_action(
    engine: &EngagementEngine,
    user: Uuid,
    action: Uuid,
    now: DateTime<Utc>,
) -> Result<()> {
    if engine.actions.complete_action(user, action, now).await? {
        println!("Action {action} completed");
    } else {
        println!("Action {action} not found or already completed");
    }
    Ok(())
}

/// Dismiss an action
pub async fn dismiss_action(engine: &EngagementEngine, user: Uuid, action: Uuid) -> Result<()> {
    if engine.actions.dismiss_action(user, action).await? {
        println!("Action {action} dismissed");
    } else {
        println!("Action {action} not found");
    }
    Ok(())
}

/// Delete expired actions
pub async fn cleanup(engine: &EngagementEngine, user: Uuid, now: DateTime<Utc>) -> Result<()> {
    let removed = engine.actions.cleanup_expired_actions(user, now).await?;
    println!("Removed {removed} expired action(s)");
    Ok(())
}

/// Record a weight entry
pub async fn log_weight(
    engine: &EngagementEngine,
    user: Uuid,
    kg: f64,
    now: DateTime<Utc>,
) -> Result<()> {
    let logged = engine
        .activity
        .log_activity(ActivityRecord::weight_update(user, now, kg))
        .await?;
    let xp = logged.xp.as_ref().map_or(0, |award| award.event.amount);
    println!(
        "Recorded {kg} kg (+{xp} XP, consistency {:.0})",
        logged.daily_consistency
    );
    Ok(())
}

/// Set the active objective, and the profile target when given
pub async fn set_objective(
    engine: &EngagementEngine,
    user: Uuid,
    objective_type: ObjectiveType,
    target_kg: Option<f64>,
    now: DateTime<Utc>,
) -> Result<()> {
    let store = engine.store();

    let mut objective = TransformationObjective::new(user, objective_type);
    objective.target_value = target_kg;
    objective.target_unit = target_kg.map(|_| "kg".to_owned());
    objective.created_at = now;
    store.set_active_objective(&objective).await?;

    if let Some(target) = target_kg {
        let mut profile = store.get_profile(user).await?.unwrap_or(UserProfile {
            user_id: user,
            current_weight_kg: None,
            target_weight_kg: None,
            updated_at: now,
        });
        profile.target_weight_kg = Some(target);
        profile.updated_at = now;
        store.upsert_profile(&profile).await?;
    }

    println!("Active objective: {}", objective_type.as_str());
    Ok(())
}
