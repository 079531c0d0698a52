// ABOUTME: Absence episodes, activity estimates, pending rewards, and reconciliation records
// ABOUTME: State carried from absence detection through anti-cheat validation to XP award
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use super::prediction::DataQuality;
use crate::errors::AppError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Absence tier derived from hours since the latest activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceTier {
    /// Under 24 hours
    None,
    /// 24 hours or more
    SoftReminder,
    /// 48 hours or more; an absence log exists
    Active,
    /// 72 hours or more; daily activity is estimated
    Estimation,
    /// 7 days or more; estimation stops growing in value
    MaxReached,
    /// 14 days or more
    Hibernation,
}

impl AbsenceTier {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::SoftReminder => "soft_reminder",
            Self::Active => "active",
            Self::Estimation => "estimation",
            Self::MaxReached => "max_reached",
            Self::Hibernation => "hibernation",
        }
    }

    /// Whether this tier requires an open absence log
    #[must_use]
    pub const fn requires_log(self) -> bool {
        matches!(
            self,
            Self::Active | Self::Estimation | Self::MaxReached | Self::Hibernation
        )
    }

    /// Whether daily activity should be estimated in this tier
    #[must_use]
    pub const fn estimates_activity(self) -> bool {
        matches!(self, Self::Estimation | Self::MaxReached | Self::Hibernation)
    }
}

/// Lifecycle of an absence log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceStatus {
    /// Open episode
    Active,
    /// Closed by a successful reconciliation
    Reconciled,
    /// Superseded by a later episode without reconciliation
    Expired,
    /// Withdrawn
    Cancelled,
}

impl AbsenceStatus {
    /// Storage name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Reconciled => "reconciled",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for AbsenceStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "reconciled" => Ok(Self::Reconciled),
            "expired" => Ok(Self::Expired),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(AppError::invalid_input(format!(
                "Unknown absence status: {other}"
            ))),
        }
    }
}

/// Trailing averages used to estimate absent days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityBaseline {
    /// Calories consumed per day
    pub calories_in: f64,
    /// Calories burned through logged activity per day
    pub calories_out: f64,
    /// Protein per day (g)
    pub protein_g: f64,
    /// Carbohydrates per day (g)
    pub carbs_g: f64,
    /// Fat per day (g)
    pub fat_g: f64,
    /// Training sessions per week
    pub trainings_per_week: f64,
    /// Meals per day
    pub meals_per_day: f64,
    /// XP earned per day
    pub daily_xp: f64,
    /// Distinct days with any activity in the window
    pub active_days: u32,
    /// Whether enough active days backed the averages
    pub has_sufficient_data: bool,
}

/// Estimate for one absent day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEstimate {
    /// Zero-based day of the absence
    pub day_index: u32,
    /// Calendar date estimated
    pub date: NaiveDate,
    /// Random factor applied to the baseline, always within [0.90, 1.10]
    pub variation: f64,
    /// Estimated calories consumed
    pub calories_in: f64,
    /// Estimated calories burned through activity
    pub calories_out: f64,
    /// Estimated protein (g)
    pub protein_g: f64,
    /// Estimated carbohydrates (g)
    pub carbs_g: f64,
    /// Estimated fat (g)
    pub fat_g: f64,
    /// Estimated training sessions (fractional)
    pub training_sessions: f64,
    /// Estimated meals
    pub meals: f64,
    /// XP the day would have earned at full rate
    pub estimated_xp: u64,
    /// Confidence in 0-1
    pub confidence: f64,
}

/// Estimated activity blob stored on an absence log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatedActivity {
    /// Baseline the days were derived from
    pub baseline: ActivityBaseline,
    /// Quality bucket of the baseline
    pub data_quality: DataQuality,
    /// Share of normal XP granted for estimated days
    pub xp_fraction: f64,
    /// Estimated days in order
    pub days: Vec<DailyEstimate>,
    /// Last time days were appended
    pub generated_at: DateTime<Utc>,
}

impl EstimatedActivity {
    /// Number of days estimated so far
    #[must_use]
    pub fn estimated_day_count(&self) -> u32 {
        u32::try_from(self.days.len()).unwrap_or(u32::MAX)
    }

    /// Sum of (intake - activity burn - basal expenditure) over the estimated days
    #[must_use]
    pub fn energy_balance_kcal(&self, basal_expenditure: f64) -> f64 {
        self.days
            .iter()
            .map(|day| day.calories_in - day.calories_out - basal_expenditure)
            .sum()
    }
}

/// An absence episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsenceLog {
    /// Row id
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Latest activity before the absence began
    pub absence_start_date: DateTime<Utc>,
    /// Whole days since `absence_start_date`
    pub days_absent: u32,
    /// Lifecycle status
    pub status: AbsenceStatus,
    /// Estimated daily activity, once the estimation tier was reached
    pub estimated_activity: Option<EstimatedActivity>,
    /// Reminders sent during the episode
    pub reminder_sent_count: u32,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update
    pub updated_at: DateTime<Utc>,
}

impl AbsenceLog {
    /// New open episode
    #[must_use]
    pub fn open(user_id: Uuid, absence_start_date: DateTime<Utc>, days_absent: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            absence_start_date,
            days_absent,
            status: AbsenceStatus::Active,
            estimated_activity: None,
            reminder_sent_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Status of a pending reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardStatus {
    /// Waiting for reconciliation
    Pending,
    /// Paid out by a reconciliation
    Awarded,
}

impl RewardStatus {
    /// Storage name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Awarded => "awarded",
        }
    }
}

impl FromStr for RewardStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "awarded" => Ok(Self::Awarded),
            other => Err(AppError::invalid_input(format!(
                "Unknown reward status: {other}"
            ))),
        }
    }
}

/// XP reserved for one estimated absent day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingXpReward {
    /// Row id
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Absence the day belongs to
    pub absence_log_id: Uuid,
    /// Zero-based day of the absence
    pub day_index: u32,
    /// Date estimated
    pub estimated_date: NaiveDate,
    /// XP before the quality fraction
    pub base_estimated_xp: u64,
    /// Quality fraction applied
    pub multiplier: f64,
    /// XP reserved for the day
    pub final_xp: u64,
    /// Payout status
    pub status: RewardStatus,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Payout time
    pub awarded_at: Option<DateTime<Utc>>,
}

/// Outcome of the weight-change plausibility check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether coherence reached 0.5
    pub is_realistic: bool,
    /// Plausibility in 0-1
    pub coherence_score: f64,
    /// Audit flags raised by the individual checks
    pub flags: Vec<String>,
    /// XP multiplier in 0.3-1.0
    pub adjusted_multiplier: f64,
    /// Whether the change landed in the objective's optimal band
    pub objective_aligned: bool,
    /// Observed weekly rate of change (kg/week, unsigned)
    pub weekly_rate_kg: f64,
}

/// Immutable audit record of a reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsenceReconciliation {
    /// Row id
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Reconciled absence
    pub absence_log_id: Uuid,
    /// Weight on record before the absence
    pub previous_weight: Option<f64>,
    /// Weight entered on return
    pub new_weight: f64,
    /// `new_weight - previous_weight`, zero without a previous weight
    pub weight_delta: f64,
    /// Days absent at reconciliation
    pub days_absent: u32,
    /// Coherence from validation
    pub coherence_score: f64,
    /// Validation flags
    pub validation_flags: Vec<String>,
    /// Multiplier applied to the pending XP sum
    pub adjusted_multiplier: f64,
    /// Sum of pending rewards before the multiplier
    pub pending_xp: u64,
    /// Total XP awarded (scaled pending plus bonus)
    pub xp_awarded: u64,
    /// Flat bonus for objective-aligned progress
    pub bonus_xp: u64,
    /// Reconciliation time
    pub reconciled_at: DateTime<Utc>,
}

/// Saga status of a reconciliation intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    /// Steps still outstanding
    Pending,
    /// Every step completed
    Committed,
}

impl IntentStatus {
    /// Storage name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Committed => "committed",
        }
    }
}

impl FromStr for IntentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "committed" => Ok(Self::Committed),
            other => Err(AppError::invalid_input(format!(
                "Unknown intent status: {other}"
            ))),
        }
    }
}

/// Persisted steps of a reconciliation, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStep {
    /// Audit record written
    RecordReconciliation,
    /// XP granted through the idempotent award primitive
    AwardXp,
    /// Pending rewards flipped to awarded
    MarkRewardsAwarded,
    /// Absence log flipped to reconciled
    MarkAbsenceReconciled,
    /// Weight entry recorded and profile updated
    UpdateWeight,
}

impl ReconciliationStep {
    /// Every step in execution order
    pub const ALL: [Self; 5] = [
        Self::RecordReconciliation,
        Self::AwardXp,
        Self::MarkRewardsAwarded,
        Self::MarkAbsenceReconciled,
        Self::UpdateWeight,
    ];

    /// Storage name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RecordReconciliation => "record_reconciliation",
            Self::AwardXp => "award_xp",
            Self::MarkRewardsAwarded => "mark_rewards_awarded",
            Self::MarkAbsenceReconciled => "mark_absence_reconciled",
            Self::UpdateWeight => "update_weight",
        }
    }
}

/// Persisted saga record created before any reconciliation side effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationIntent {
    /// Row id
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Absence being reconciled (unique per intent)
    pub absence_log_id: Uuid,
    /// Weight the user entered
    pub new_weight_kg: f64,
    /// Saga status
    pub status: IntentStatus,
    /// Steps already applied
    pub completed_steps: Vec<ReconciliationStep>,
    /// Last step failure, kept for the retry pass
    pub last_error: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update
    pub updated_at: DateTime<Utc>,
}

impl ReconciliationIntent {
    /// New pending intent
    #[must_use]
    pub fn new(user_id: Uuid, absence_log_id: Uuid, new_weight_kg: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            absence_log_id,
            new_weight_kg,
            status: IntentStatus::Pending,
            completed_steps: Vec::new(),
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether a step was already applied
    #[must_use]
    pub fn has_completed(&self, step: ReconciliationStep) -> bool {
        self.completed_steps.contains(&step)
    }

    /// First step not yet applied
    #[must_use]
    pub fn next_step(&self) -> Option<ReconciliationStep> {
        ReconciliationStep::ALL
            .into_iter()
            .find(|step| !self.has_completed(*step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering_follows_elapsed_time() {
        assert!(AbsenceTier::None < AbsenceTier::SoftReminder);
        assert!(AbsenceTier::Active < AbsenceTier::Estimation);
        assert!(AbsenceTier::MaxReached < AbsenceTier::Hibernation);
        assert!(!AbsenceTier::SoftReminder.requires_log());
        assert!(AbsenceTier::Active.requires_log());
        assert!(!AbsenceTier::Active.estimates_activity());
        assert!(AbsenceTier::Estimation.estimates_activity());
    }

    #[test]
    fn test_intent_next_step_walks_in_order() {
        let mut intent = ReconciliationIntent::new(Uuid::new_v4(), Uuid::new_v4(), 80.0);
        assert_eq!(
            intent.next_step(),
            Some(ReconciliationStep::RecordReconciliation)
        );
        intent
            .completed_steps
            .push(ReconciliationStep::RecordReconciliation);
        intent.completed_steps.push(ReconciliationStep::AwardXp);
        assert_eq!(
            intent.next_step(),
            Some(ReconciliationStep::MarkRewardsAwarded)
        );
        intent.completed_steps = ReconciliationStep::ALL.to_vec();
        assert_eq!(intent.next_step(), None);
    }

    #[test]
    fn test_status_round_trip_through_storage_names() {
        for status in [
            AbsenceStatus::Active,
            AbsenceStatus::Reconciled,
            AbsenceStatus::Expired,
            AbsenceStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<AbsenceStatus>().unwrap(), status);
        }
        assert!("paused".parse::<AbsenceStatus>().is_err());
    }
}
