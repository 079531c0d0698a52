// ABOUTME: Reconciliation saga turning an absence's pending XP into awarded XP after weight validation
// ABOUTME: A persisted intent records each completed step so an interrupted run resumes without repeats
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! # Reconciliation
//!
//! When the user re-enters their weight after an absence, the reconciliation
//! first runs absence detection at the current time, so the validated absence
//! length and the pending rewards reflect the whole episode. Then it:
//! 1. writes an immutable audit record (validation, pending XP, award)
//! 2. awards the XP under the key `absence_reconciliation:<absence id>`
//! 3. flips the absence's pending rewards to awarded
//! 4. flips the absence log to reconciled
//! 5. records the weight entry and updates the profile weight
//!
//! An intent row is stored before step 1 and updated after every step. Each
//! step is idempotent on its own (unique audit record per absence, keyed XP
//! award, conditional status updates, weight entry keyed by the intent id),
//! so re-driving an intent from any point converges on the same state.
//!
//! Anti-cheat flags never block: they only scale the multiplier applied to
//! the pending XP.

use super::absence_detection::AbsenceDetectionService;
use crate::constants::xp_sources::ABSENCE_RECONCILIATION;
use crate::database_plugins::EngagementStore;
use crate::errors::{AppError, AppResult};
use crate::external::{AnalysisRequest, GenerativeContentProvider};
use crate::logging::AppLogger;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use twinforge_core::models::{
    source_key, AbsenceReconciliation, AbsenceStatus, ActivityRecord, IntentStatus,
    ReconciliationIntent, ReconciliationStep, RewardStatus, ValidationResult, XpEvent,
};
use twinforge_intelligence::anti_cheat::{FLAG_EXCELLENT_MAINTENANCE, FLAG_OPTIMAL_PROGRESS};
use twinforge_intelligence::{
    coaching_messages, AntiCheatValidator, CoachingContext, EngagementConfig, ValidationHistory,
    WeightChangeInput,
};
use uuid::Uuid;

/// Everything shown to the user after a completed reconciliation
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    /// Intent that drove the reconciliation
    pub intent_id: Uuid,
    /// Audit record
    pub reconciliation: AbsenceReconciliation,
    /// Validation outcome
    pub validation: ValidationResult,
    /// Whether this run granted the XP (false when an earlier run already did)
    pub newly_awarded: bool,
    /// Coaching messages
    pub coaching_messages: Vec<String>,
    /// Generated insight text, when the provider answered
    pub insight: Option<String>,
}

/// Result of a reconciliation attempt
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReconciliationOutcome {
    /// Every step applied
    Completed(Box<ReconciliationReport>),
    /// A step failed; completed steps stay applied and the intent can be resumed
    Failed {
        /// Human-readable reason
        error: String,
    },
}

impl ReconciliationOutcome {
    /// Whether the reconciliation completed
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Reconciliation saga service
#[derive(Clone)]
pub struct ReconciliationService {
    store: Arc<dyn EngagementStore>,
    generative: Option<Arc<dyn GenerativeContentProvider>>,
    absences: AbsenceDetectionService,
}

impl ReconciliationService {
    /// Create a reconciliation service
    #[must_use]
    pub fn new(
        store: Arc<dyn EngagementStore>,
        generative: Option<Arc<dyn GenerativeContentProvider>>,
        absences: AbsenceDetectionService,
    ) -> Self {
        Self {
            store,
            generative,
            absences,
        }
    }

    /// Reconcile the user's open absence with a newly reported weight
    ///
    /// Without an open absence, interrupted intents of the user are resumed
    /// instead and the most recent of their outcomes is returned.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a non-positive weight, or an error if the
    /// detection pass fails or the intent cannot be loaded. Failures inside the saga
    /// are reported as [`ReconciliationOutcome::Failed`].
    pub async fn reconcile(
        &self,
        user_id: Uuid,
        new_weight_kg: f64,
        now: DateTime<Utc>,
    ) -> AppResult<ReconciliationOutcome> {
        if !new_weight_kg.is_finite() || new_weight_kg <= 0.0 {
            return Err(AppError::invalid_input(format!(
                "Weight must be a positive number, got {new_weight_kg}"
            )));
        }

        let Some(absence) = self.absences.refresh_open_absence(user_id, now).await? else {
            let mut resumed = self.resume_pending(user_id, now).await?;
            return Ok(resumed.pop().unwrap_or_else(|| {
                ReconciliationOutcome::Failed {
                    error: "No active absence to reconcile".to_owned(),
                }
            }));
        };

        let mut draft = ReconciliationIntent::new(user_id, absence.id, new_weight_kg);
        draft.created_at = now;
        draft.updated_at = now;
        let intent = self.store.begin_intent(&draft).await?;
        if intent.id != draft.id {
            debug!(
                user.id = %user_id,
                absence.id = %absence.id,
                "Reconciliation already in progress, continuing it"
            );
        }

        Ok(self.run(intent, now).await)
    }

    /// Re-drive every interrupted intent of the user
    ///
    /// # Errors
    ///
    /// Returns an error if the pending intents cannot be listed
    pub async fn resume_pending(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<ReconciliationOutcome>> {
        let intents = self.store.list_pending_intents(user_id).await?;
        let mut outcomes = Vec::with_capacity(intents.len());
        for intent in intents {
            info!(
                user.id = %user_id,
                absence.id = %intent.absence_log_id,
                completed = intent.completed_steps.len(),
                "Resuming reconciliation"
            );
            outcomes.push(self.run(intent, now).await);
        }
        Ok(outcomes)
    }

    /// Drive `intent` to completion, recording the error on failure
    async fn run(&self, mut intent: ReconciliationIntent, now: DateTime<Utc>) -> ReconciliationOutcome {
        match self.drive(&mut intent, now).await {
            Ok(report) => {
                AppLogger::log_reconciliation(
                    intent.user_id,
                    intent.absence_log_id,
                    report.reconciliation.coherence_score,
                    report.reconciliation.xp_awarded,
                    true,
                );
                ReconciliationOutcome::Completed(Box::new(report))
            }
            Err(e) => {
                AppLogger::log_reconciliation(intent.user_id, intent.absence_log_id, 0.0, 0, false);
                intent.last_error = Some(e.to_string());
                intent.updated_at = now;
                if let Err(save_error) = self.store.update_intent(&intent).await {
                    warn!(
                        user.id = %intent.user_id,
                        absence.id = %intent.absence_log_id,
                        "Failed to record reconciliation error: {save_error}"
                    );
                }
                ReconciliationOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn drive(
        &self,
        intent: &mut ReconciliationIntent,
        now: DateTime<Utc>,
    ) -> AppResult<ReconciliationReport> {
        let mut newly_awarded = false;
        while let Some(step) = intent.next_step() {
            match step {
                ReconciliationStep::RecordReconciliation => {
                    self.record_reconciliation(intent, now).await?;
                }
                ReconciliationStep::AwardXp => {
                    newly_awarded = self.award_xp(intent, now).await?;
                }
                ReconciliationStep::MarkRewardsAwarded => {
                    self.store
                        .mark_rewards_awarded(intent.absence_log_id, now)
                        .await?;
                }
                ReconciliationStep::MarkAbsenceReconciled => {
                    self.mark_reconciled(intent, now).await?;
                }
                ReconciliationStep::UpdateWeight => {
                    self.update_weight(intent, now).await?;
                }
            }

            intent.completed_steps.push(step);
            intent.updated_at = now;
            if intent.next_step().is_none() {
                intent.status = IntentStatus::Committed;
                intent.last_error = None;
            }
            self.store.update_intent(intent).await?;
            debug!(
                user.id = %intent.user_id,
                absence.id = %intent.absence_log_id,
                step = step.as_str(),
                "Reconciliation step applied"
            );
        }

        let reconciliation = self.load_reconciliation(intent).await?;
        let validation = validation_from_record(&reconciliation);
        let messages = coaching_messages(&CoachingContext {
            validation: &validation,
            days_absent: reconciliation.days_absent,
            weight_delta: reconciliation
                .previous_weight
                .map(|_| reconciliation.weight_delta),
            xp_awarded: reconciliation.xp_awarded,
            bonus_xp: reconciliation.bonus_xp,
        });
        let insight = self.insight(&reconciliation).await;

        Ok(ReconciliationReport {
            intent_id: intent.id,
            reconciliation,
            validation,
            newly_awarded,
            coaching_messages: messages,
            insight,
        })
    }

    /// Validate the weight change and write the audit record once per absence
    async fn record_reconciliation(
        &self,
        intent: &ReconciliationIntent,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if self
            .store
            .get_reconciliation_for_absence(intent.absence_log_id)
            .await?
            .is_some()
        {
            return Ok(());
        }

        let config = EngagementConfig::global();
        let user_id = intent.user_id;
        let history_since = now - Duration::days(config.anti_cheat.history.window_days);
        let row_limit = config.anti_cheat.history.row_limit;

        let (absence, profile, objective, rewards, past_reconciliations, past_absences) = tokio::try_join!(
            self.store.get_absence_log(intent.absence_log_id),
            self.store.get_profile(user_id),
            self.store.get_active_objective(user_id),
            self.store.list_rewards_for_absence(intent.absence_log_id),
            self.store
                .list_recent_reconciliations(user_id, history_since, row_limit),
            self.store
                .list_recent_absences(user_id, history_since, row_limit),
        )?;
        let absence = absence.ok_or_else(|| {
            AppError::not_found(format!("Absence log {}", intent.absence_log_id))
        })?;

        let previous_weight = profile.and_then(|p| p.current_weight_kg);
        let objective = objective.map(|o| o.objective_type);
        let validation = AntiCheatValidator::validate_weight_change(
            &WeightChangeInput {
                days_absent: absence.days_absent,
                previous_weight,
                new_weight: intent.new_weight_kg,
                objective,
                estimated_activity: absence.estimated_activity.as_ref(),
            },
            &ValidationHistory {
                reconciliations: &past_reconciliations,
                absences: &past_absences,
                now,
            },
            &config.anti_cheat,
        );
        AppLogger::log_anti_cheat_flags(user_id, &validation.flags, validation.adjusted_multiplier);

        let pending_xp: u64 = rewards
            .iter()
            .filter(|r| r.status == RewardStatus::Pending)
            .map(|r| r.final_xp)
            .sum();
        let scaled_xp = (pending_xp as f64 * validation.adjusted_multiplier).round() as u64;
        let bonus_xp = if validation.objective_aligned
            && validation.coherence_score >= config.rewards.bonus_min_coherence
        {
            config.rewards.aligned_bonus_xp
        } else {
            0
        };

        let record = AbsenceReconciliation {
            id: Uuid::new_v4(),
            user_id,
            absence_log_id: absence.id,
            previous_weight,
            new_weight: intent.new_weight_kg,
            weight_delta: previous_weight.map_or(0.0, |prev| intent.new_weight_kg - prev),
            days_absent: absence.days_absent,
            coherence_score: validation.coherence_score,
            validation_flags: validation.flags,
            adjusted_multiplier: validation.adjusted_multiplier,
            pending_xp,
            xp_awarded: scaled_xp + bonus_xp,
            bonus_xp,
            reconciled_at: now,
        };

        if !self.store.insert_reconciliation(&record).await? {
            debug!(
                user.id = %user_id,
                absence.id = %absence.id,
                "Reconciliation record written concurrently"
            );
        }
        Ok(())
    }

    /// Award the recorded XP; returns whether this call granted it
    async fn award_xp(&self, intent: &ReconciliationIntent, now: DateTime<Utc>) -> AppResult<bool> {
        let reconciliation = self.load_reconciliation(intent).await?;
        if reconciliation.xp_awarded == 0 {
            return Ok(false);
        }

        let mut event = XpEvent::new(
            intent.user_id,
            source_key(ABSENCE_RECONCILIATION, intent.absence_log_id),
            reconciliation.xp_awarded,
        );
        event.occurred_at = now;
        let award = self.store.award_xp(&event).await?;
        AppLogger::log_xp_award(
            intent.user_id,
            &award.event.source_key,
            award.event.amount,
            award.newly_awarded,
        );
        Ok(award.newly_awarded)
    }

    async fn mark_reconciled(&self, intent: &ReconciliationIntent, now: DateTime<Utc>) -> AppResult<()> {
        let transitioned = self
            .store
            .transition_absence(
                intent.absence_log_id,
                AbsenceStatus::Active,
                AbsenceStatus::Reconciled,
                now,
            )
            .await?;
        if transitioned {
            return Ok(());
        }

        match self.store.get_absence_log(intent.absence_log_id).await? {
            Some(log) if log.status == AbsenceStatus::Reconciled => Ok(()),
            Some(log) => Err(AppError::invalid_input(format!(
                "Absence {} is {} and cannot be reconciled",
                log.id,
                log.status.as_str()
            ))),
            None => Err(AppError::not_found(format!(
                "Absence log {}",
                intent.absence_log_id
            ))),
        }
    }

    /// Record the reported weight as an activity (keyed by the intent id) and
    /// make it the profile's current weight
    async fn update_weight(&self, intent: &ReconciliationIntent, now: DateTime<Utc>) -> AppResult<()> {
        let mut entry = ActivityRecord::weight_update(intent.user_id, now, intent.new_weight_kg);
        entry.id = intent.id;
        self.store.record_activity(&entry).await?;
        self.store
            .update_current_weight(intent.user_id, intent.new_weight_kg, now)
            .await
    }

    async fn load_reconciliation(
        &self,
        intent: &ReconciliationIntent,
    ) -> AppResult<AbsenceReconciliation> {
        self.store
            .get_reconciliation_for_absence(intent.absence_log_id)
            .await?
            .ok_or_else(|| {
                AppError::internal(format!(
                    "Reconciliation record missing for absence {}",
                    intent.absence_log_id
                ))
            })
    }

    /// Optional generated insight; any provider failure yields `None`
    async fn insight(&self, reconciliation: &AbsenceReconciliation) -> Option<String> {
        let provider = self.generative.as_ref()?;
        let request = AnalysisRequest {
            user_id: reconciliation.user_id,
            topic: "absence_reconciliation".to_owned(),
            context: json!({
                "days_absent": reconciliation.days_absent,
                "previous_weight": reconciliation.previous_weight,
                "new_weight": reconciliation.new_weight,
                "weight_delta": reconciliation.weight_delta,
                "coherence_score": reconciliation.coherence_score,
                "flags": reconciliation.validation_flags,
                "xp_awarded": reconciliation.xp_awarded,
                "bonus_xp": reconciliation.bonus_xp,
            }),
        };

        match provider.generate_analysis(&request).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(user.id = %reconciliation.user_id, "Reconciliation insight unavailable: {e}");
                None
            }
        }
    }
}

/// Rebuild the validation outcome from the stored audit record
fn validation_from_record(record: &AbsenceReconciliation) -> ValidationResult {
    let config = &EngagementConfig::global().anti_cheat;
    let weeks = f64::from(record.days_absent.max(1)) / 7.0;
    ValidationResult {
        is_realistic: record.coherence_score >= config.multiplier.realistic_threshold,
        coherence_score: record.coherence_score,
        flags: record.validation_flags.clone(),
        adjusted_multiplier: record.adjusted_multiplier,
        objective_aligned: record
            .validation_flags
            .iter()
            .any(|f| f == FLAG_OPTIMAL_PROGRESS || f == FLAG_EXCELLENT_MAINTENANCE),
        weekly_rate_kg: record.weight_delta.abs() / weeks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(flags: &[&str], coherence: f64) -> AbsenceReconciliation {
        AbsenceReconciliation {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            absence_log_id: Uuid::new_v4(),
            previous_weight: Some(82.0),
            new_weight: 81.0,
            weight_delta: -1.0,
            days_absent: 14,
            coherence_score: coherence,
            validation_flags: flags.iter().map(|f| (*f).to_owned()).collect(),
            adjusted_multiplier: 0.8,
            pending_xp: 300,
            xp_awarded: 290,
            bonus_xp: 50,
            reconciled_at: Utc::now(),
        }
    }

    #[test]
    fn test_validation_rebuilt_from_record() {
        let validation = validation_from_record(&record(&[FLAG_OPTIMAL_PROGRESS], 1.0));
        assert!(validation.is_realistic);
        assert!(validation.objective_aligned);
        assert!((validation.weekly_rate_kg - 0.5).abs() < 1e-9);

        let flagged = validation_from_record(&record(&["extreme_loss_rate"], 0.3));
        assert!(!flagged.is_realistic);
        assert!(!flagged.objective_aligned);
    }
}
