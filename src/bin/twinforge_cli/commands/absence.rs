// ABOUTME: Absence commands for twinforge-cli
// ABOUTME: Absence checks, reminders, reconciliation, and resuming interrupted reconciliations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use twinforge_engagement::services::{EngagementEngine, ReconciliationOutcome};
use uuid::Uuid;

use crate::helpers::display::print_json;

/// Run an absence check
pub async fn check(engine: &EngagementEngine, user: Uuid, now: DateTime<Utc>) -> Result<()> {
    let check = engine.absences.check_absence(user, now).await?;
    print_json(&check)
}

/// Count a reminder for the open absence
pub async fn remind(engine: &EngagementEngine, user: Uuid, now: DateTime<Utc>) -> Result<()> {
    if engine.absences.record_reminder(user, now).await? {
        println!("Reminder recorded");
    } else {
        println!("No open absence");
    }
    Ok(())
}

/// Reconcile the open absence
pub async fn reconcile(
    engine: &EngagementEngine,
    user: Uuid,
    weight: f64,
    now: DateTime<Utc>,
) -> Result<()> {
    let outcome = engine.reconciliation.reconcile(user, weight, now).await?;
    print_outcome(&outcome)
}

/// Re-drive interrupted reconciliations
pub async fn resume(engine: &EngagementEngine, user: Uuid, now: DateTime<Utc>) -> Result<()> {
    let outcomes = engine.reconciliation.resume_pending(user, now).await?;
    if outcomes.is_empty() {
        println!("No pending reconciliations");
        return Ok(());
    }
    for outcome in &outcomes {
        print_outcome(outcome)?;
    }
    Ok(())
}

fn print_outcome(outcome: &ReconciliationOutcome) -> Result<()> {
    match outcome {
        ReconciliationOutcome::Completed(report) => {
            for message in &report.coaching_messages {
                println!("{message}");
            }
            if let Some(insight) = &report.insight {
                println!("\n{insight}");
            }
            println!();
            print_json(report)
        }
        ReconciliationOutcome::Failed { error } => bail!("Reconciliation failed: {error}"),
    }
}
