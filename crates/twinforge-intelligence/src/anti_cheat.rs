// ABOUTME: Plausibility validation of self-reported weight changes after an absence
// ABOUTME: Rate, objective, history, calorie, and absence-pattern checks scaling a coherence score
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! Anti-cheat validation
//!
//! Coherence starts at 1.0 and each check multiplies it. Flags never block a
//! reconciliation: the resulting multiplier scales the XP award, and even an
//! unrealistic change keeps a floor of 0.3.
//!
//! The validator is pure. History must be loaded by the caller, bounded to
//! the configured window and row limit.

use crate::config::{AntiCheatConfig, EngagementConfig};
use crate::statistical_analysis::StatisticalAnalyzer;
use chrono::{DateTime, Duration, Utc};
use twinforge_core::constants::energy::KCAL_PER_KG;
use twinforge_core::constants::estimation_defaults::BASAL_EXPENDITURE;
use twinforge_core::models::{
    AbsenceLog, AbsenceReconciliation, EstimatedActivity, ExpectedChange, ObjectiveType,
    ValidationResult,
};

/// Flag raised when no previous weight exists
pub const FLAG_NO_PREVIOUS_WEIGHT: &str = "no_previous_weight";
/// Flag for an extreme loss rate
pub const FLAG_EXTREME_LOSS: &str = "extreme_loss_rate";
/// Flag for an extreme gain rate
pub const FLAG_EXTREME_GAIN: &str = "extreme_gain_rate";
/// Flag for a high loss rate
pub const FLAG_HIGH_LOSS: &str = "high_loss_rate";
/// Flag for a high gain rate
pub const FLAG_HIGH_GAIN: &str = "high_gain_rate";
/// Flag for a change against the objective
pub const FLAG_CONTRADICTS_OBJECTIVE: &str = "contradicts_objective";
/// Flag for a change inside the objective's optimal band
pub const FLAG_OPTIMAL_PROGRESS: &str = "optimal_progress";
/// Flag for maintenance within tolerance
pub const FLAG_EXCELLENT_MAINTENANCE: &str = "excellent_maintenance";
/// Flag for scattered recent reconciled weights
pub const FLAG_HIGH_VARIANCE: &str = "high_weight_variance";
/// Flag for a weight far from recent reconciled weights
pub const FLAG_FAR_FROM_AVERAGE: &str = "far_from_recent_average";
/// Flag for too many recent reconciliations
pub const FLAG_FREQUENT_RECONCILIATIONS: &str = "frequent_reconciliations";
/// Flag for a delta far from the estimated energy balance
pub const FLAG_CALORIE_MISMATCH: &str = "calorie_mismatch";
/// Flag for a delta matching the estimated energy balance
pub const FLAG_CALORIE_CONSISTENT: &str = "calorie_consistent";
/// Flag for too many absences
pub const FLAG_FREQUENT_ABSENCES: &str = "frequent_absences";
/// Flag for a run of short absences
pub const FLAG_SHORT_ABSENCE_PATTERN: &str = "short_absence_pattern";

/// Whether a flag counts against the change rather than confirming it
#[must_use]
pub fn is_penalising_flag(flag: &str) -> bool {
    !matches!(
        flag,
        FLAG_OPTIMAL_PROGRESS | FLAG_EXCELLENT_MAINTENANCE | FLAG_CALORIE_CONSISTENT
    )
}

/// The reported change
#[derive(Debug, Clone, Copy)]
pub struct WeightChangeInput<'a> {
    /// Days the user was absent
    pub days_absent: u32,
    /// Weight on record before the absence
    pub previous_weight: Option<f64>,
    /// Weight entered on return
    pub new_weight: f64,
    /// Active objective
    pub objective: Option<ObjectiveType>,
    /// Estimated activity during the absence
    pub estimated_activity: Option<&'a EstimatedActivity>,
}

/// Bounded history loaded by the caller
#[derive(Debug, Clone, Copy)]
pub struct ValidationHistory<'a> {
    /// Recent reconciliations, any order
    pub reconciliations: &'a [AbsenceReconciliation],
    /// Recent absence logs, any order (the current one may be included)
    pub absences: &'a [AbsenceLog],
    /// Evaluation instant
    pub now: DateTime<Utc>,
}

impl ValidationHistory<'_> {
    /// History with no prior reconciliations or absences
    #[must_use]
    pub const fn empty(now: DateTime<Utc>) -> ValidationHistory<'static> {
        ValidationHistory {
            reconciliations: &[],
            absences: &[],
            now,
        }
    }
}

/// Accumulates coherence and flags across checks
struct Assessment {
    coherence: f64,
    flags: Vec<String>,
    aligned: bool,
}

impl Assessment {
    fn apply(&mut self, multiplier: f64, flag: &str) {
        self.coherence *= multiplier;
        self.flags.push(flag.to_owned());
    }
}

/// Weight-change validator
pub struct AntiCheatValidator;

impl AntiCheatValidator {
    /// Validate a reported weight change
    #[must_use]
    pub fn validate_weight_change(
        input: &WeightChangeInput<'_>,
        history: &ValidationHistory<'_>,
        config: &AntiCheatConfig,
    ) -> ValidationResult {
        let Some(previous_weight) = input.previous_weight else {
            let score = config.multiplier.no_previous_weight_score;
            return ValidationResult {
                is_realistic: score >= config.multiplier.realistic_threshold,
                coherence_score: score,
                flags: vec![FLAG_NO_PREVIOUS_WEIGHT.to_owned()],
                adjusted_multiplier: score,
                objective_aligned: false,
                weekly_rate_kg: 0.0,
            };
        };

        let delta = input.new_weight - previous_weight;
        let weeks = f64::from(input.days_absent.max(1)) / 7.0;
        let weekly_rate = delta.abs() / weeks;

        let mut assessment = Assessment {
            coherence: 1.0,
            flags: Vec::new(),
            aligned: false,
        };

        Self::check_rate(&mut assessment, delta, weekly_rate, config);
        if let Some(objective) = input.objective {
            Self::check_objective(&mut assessment, objective, delta, weekly_rate, config);
        }
        Self::check_reconciliation_history(&mut assessment, input.new_weight, history, config);
        if let Some(estimated) = input.estimated_activity {
            Self::check_energy_balance(&mut assessment, delta, estimated, config);
        }
        Self::check_absence_history(&mut assessment, history, config);

        let coherence_score = if assessment.coherence.is_finite() {
            assessment.coherence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let multiplier = &config.multiplier;
        let alignment_bonus = if assessment.aligned {
            multiplier.alignment_bonus
        } else {
            0.0
        };
        let adjusted_multiplier = multiplier
            .coherence_weight
            .mul_add(coherence_score, multiplier.base + alignment_bonus)
            .clamp(multiplier.min, multiplier.max);

        ValidationResult {
            is_realistic: coherence_score >= multiplier.realistic_threshold,
            coherence_score,
            flags: assessment.flags,
            adjusted_multiplier,
            objective_aligned: assessment.aligned,
            weekly_rate_kg: weekly_rate,
        }
    }

    fn check_rate(
        assessment: &mut Assessment,
        delta: f64,
        weekly_rate: f64,
        config: &AntiCheatConfig,
    ) {
        let rate = &config.rate;
        let (extreme, high, extreme_flag, high_flag) = if delta < 0.0 {
            (
                rate.extreme_loss_kg_per_week,
                rate.high_loss_kg_per_week,
                FLAG_EXTREME_LOSS,
                FLAG_HIGH_LOSS,
            )
        } else {
            (
                rate.extreme_gain_kg_per_week,
                rate.high_gain_kg_per_week,
                FLAG_EXTREME_GAIN,
                FLAG_HIGH_GAIN,
            )
        };

        if weekly_rate > extreme {
            assessment.apply(rate.extreme_multiplier, extreme_flag);
        } else if weekly_rate > high {
            assessment.apply(rate.high_multiplier, high_flag);
        }
    }

    fn check_objective(
        assessment: &mut Assessment,
        objective: ObjectiveType,
        delta: f64,
        weekly_rate: f64,
        config: &AntiCheatConfig,
    ) {
        let band = objective.validation_band();
        let tolerance = config.objective.direction_tolerance_kg;
        let contradiction = config.objective.contradiction_multiplier;

        match band.expected {
            ExpectedChange::Decrease {
                optimal_min,
                optimal_max,
            } => {
                if delta > tolerance {
                    assessment.apply(contradiction, FLAG_CONTRADICTS_OBJECTIVE);
                } else if delta < -tolerance && (optimal_min..=optimal_max).contains(&weekly_rate) {
                    assessment.apply(band.alignment_multiplier, FLAG_OPTIMAL_PROGRESS);
                    assessment.aligned = true;
                }
            }
            ExpectedChange::Increase {
                optimal_min,
                optimal_max,
            } => {
                if delta < -tolerance {
                    assessment.apply(contradiction, FLAG_CONTRADICTS_OBJECTIVE);
                } else if delta > tolerance && (optimal_min..=optimal_max).contains(&weekly_rate) {
                    assessment.apply(band.alignment_multiplier, FLAG_OPTIMAL_PROGRESS);
                    assessment.aligned = true;
                }
            }
            ExpectedChange::Stable {
                tolerance: weekly_tolerance,
            } => {
                if weekly_rate > weekly_tolerance * 2.0 {
                    assessment.apply(contradiction, FLAG_CONTRADICTS_OBJECTIVE);
                } else if weekly_rate <= weekly_tolerance {
                    assessment.apply(band.alignment_multiplier, FLAG_EXCELLENT_MAINTENANCE);
                    assessment.aligned = true;
                }
            }
        }
    }

    fn check_reconciliation_history(
        assessment: &mut Assessment,
        new_weight: f64,
        history: &ValidationHistory<'_>,
        config: &AntiCheatConfig,
    ) {
        let checks = &config.history;
        let window_start = history.now - Duration::days(checks.window_days);
        let weights: Vec<f64> = history
            .reconciliations
            .iter()
            .filter(|r| r.reconciled_at >= window_start)
            .map(|r| r.new_weight)
            .filter(|w| w.is_finite())
            .collect();

        if weights.len() >= 2 {
            if let Some(std_dev) = StatisticalAnalyzer::std_dev(&weights) {
                if std_dev > checks.max_weight_std_dev_kg {
                    assessment.apply(checks.variance_multiplier, FLAG_HIGH_VARIANCE);
                }
            }
        }
        if let Some(mean) = StatisticalAnalyzer::mean(&weights) {
            if (new_weight - mean).abs() > checks.max_distance_from_average_kg {
                assessment.apply(checks.outlier_multiplier, FLAG_FAR_FROM_AVERAGE);
            }
        }

        let frequency_start = history.now - Duration::days(checks.frequency_window_days);
        let recent = history
            .reconciliations
            .iter()
            .filter(|r| r.reconciled_at >= frequency_start)
            .count();
        if recent > checks.max_recent_reconciliations {
            assessment.apply(checks.frequency_multiplier, FLAG_FREQUENT_RECONCILIATIONS);
        }
    }

    fn check_energy_balance(
        assessment: &mut Assessment,
        delta: f64,
        estimated: &EstimatedActivity,
        config: &AntiCheatConfig,
    ) {
        if estimated.days.is_empty() {
            return;
        }
        let implied_delta = estimated.energy_balance_kcal(BASAL_EXPENDITURE) / KCAL_PER_KG;
        let discrepancy = (delta - implied_delta).abs();
        let calories = &config.calories;

        if discrepancy > calories.large_discrepancy_kg {
            assessment.apply(calories.large_discrepancy_multiplier, FLAG_CALORIE_MISMATCH);
        } else if discrepancy < calories.small_discrepancy_kg {
            assessment.apply(calories.small_discrepancy_multiplier, FLAG_CALORIE_CONSISTENT);
        }
    }

    fn check_absence_history(
        assessment: &mut Assessment,
        history: &ValidationHistory<'_>,
        config: &AntiCheatConfig,
    ) {
        let checks = &config.history;
        let window_start = history.now - Duration::days(checks.window_days);
        let mut absences: Vec<&AbsenceLog> = history
            .absences
            .iter()
            .filter(|a| a.absence_start_date >= window_start)
            .collect();

        if absences.len() > checks.max_absences {
            assessment.apply(checks.absence_frequency_multiplier, FLAG_FREQUENT_ABSENCES);
        }

        absences.sort_by_key(|a| a.absence_start_date);
        let mut run = 0_usize;
        let mut longest = 0_usize;
        for absence in absences {
            if absence.days_absent <= checks.short_absence_days {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 0;
            }
        }
        if longest >= checks.short_absence_streak {
            assessment.apply(checks.short_absence_multiplier, FLAG_SHORT_ABSENCE_PATTERN);
        }
    }
}

/// Validate with the globally loaded anti-cheat thresholds
#[must_use]
pub fn validate_weight_change(
    input: &WeightChangeInput<'_>,
    history: &ValidationHistory<'_>,
) -> ValidationResult {
    AntiCheatValidator::validate_weight_change(
        input,
        history,
        &EngagementConfig::global().anti_cheat,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use twinforge_core::models::AbsenceStatus;
    use uuid::Uuid;

    fn change(
        previous: Option<f64>,
        new_weight: f64,
        days: u32,
        objective: ObjectiveType,
    ) -> WeightChangeInput<'static> {
        WeightChangeInput {
            days_absent: days,
            previous_weight: previous,
            new_weight,
            objective: Some(objective),
            estimated_activity: None,
        }
    }

    fn validate(input: &WeightChangeInput<'_>) -> ValidationResult {
        AntiCheatValidator::validate_weight_change(
            input,
            &ValidationHistory::empty(Utc::now()),
            &AntiCheatConfig::default(),
        )
    }

    #[test]
    fn test_no_previous_weight_trusts_but_flags() {
        let result = validate(&change(None, 80.0, 5, ObjectiveType::FatLoss));
        assert!((result.coherence_score - 0.7).abs() < 1e-9);
        assert!((result.adjusted_multiplier - 0.7).abs() < 1e-9);
        assert!(result.is_realistic);
        assert_eq!(result.flags, vec![FLAG_NO_PREVIOUS_WEIGHT.to_owned()]);
    }

    #[test]
    fn test_confirming_flags_are_not_penalising() {
        assert!(!is_penalising_flag(FLAG_OPTIMAL_PROGRESS));
        assert!(!is_penalising_flag(FLAG_EXCELLENT_MAINTENANCE));
        assert!(!is_penalising_flag(FLAG_CALORIE_CONSISTENT));
        assert!(is_penalising_flag(FLAG_HIGH_LOSS));
        assert!(is_penalising_flag(FLAG_NO_PREVIOUS_WEIGHT));
        assert!(is_penalising_flag(FLAG_SHORT_ABSENCE_PATTERN));
    }

    #[test]
    fn test_extreme_loss_is_unrealistic() {
        let input = change(Some(80.0), 70.0, 7, ObjectiveType::FatLoss);
        let result = validate(&input);
        assert!(!result.is_realistic);
        assert!(result.coherence_score < 0.5);
        assert!(result.flags.iter().any(|f| f == FLAG_EXTREME_LOSS));
        assert!((0.3..=1.0).contains(&result.adjusted_multiplier));
        // Pure: identical inputs give identical output
        assert_eq!(result, validate(&input));
    }

    #[test]
    fn test_maintenance_within_tolerance_gets_bonus() {
        let result = validate(&change(Some(80.0), 79.3, 7, ObjectiveType::HealthOptimization));
        assert!(result.flags.iter().any(|f| f == FLAG_EXCELLENT_MAINTENANCE));
        assert!((result.coherence_score - 1.0).abs() < 1e-9);
        assert!(result.objective_aligned);
        assert!((result.adjusted_multiplier - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_gain_contradicts_fat_loss() {
        let result = validate(&change(Some(80.0), 81.4, 14, ObjectiveType::FatLoss));
        assert!(result.flags.iter().any(|f| f == FLAG_HIGH_GAIN));
        assert!(result.flags.iter().any(|f| f == FLAG_CONTRADICTS_OBJECTIVE));
        assert!((result.coherence_score - 0.36).abs() < 1e-9);
    }

    #[test]
    fn test_optimal_fat_loss_is_aligned() {
        let result = validate(&change(Some(80.0), 79.0, 14, ObjectiveType::FatLoss));
        assert!(result.objective_aligned);
        assert!(result.flags.iter().any(|f| f == FLAG_OPTIMAL_PROGRESS));
        assert!((result.adjusted_multiplier - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_short_absence_pattern_and_frequency() {
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        let absences: Vec<AbsenceLog> = (1..=6)
            .map(|i| {
                let mut log = AbsenceLog::open(user_id, now - Duration::days(i * 10), 2);
                log.status = AbsenceStatus::Reconciled;
                log
            })
            .collect();
        let history = ValidationHistory {
            reconciliations: &[],
            absences: &absences,
            now,
        };
        let result = AntiCheatValidator::validate_weight_change(
            &change(Some(80.0), 80.0, 3, ObjectiveType::Endurance),
            &history,
            &AntiCheatConfig::default(),
        );
        assert!(result.flags.iter().any(|f| f == FLAG_FREQUENT_ABSENCES));
        assert!(result.flags.iter().any(|f| f == FLAG_SHORT_ABSENCE_PATTERN));
        assert!((result.coherence_score - 0.68).abs() < 1e-9);
    }
}
