// ABOUTME: Adaptive score calculator across the six engagement categories
// ABOUTME: Per-domain scores, objective-weighted overall score, trend, and confidence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! Adaptive scoring
//!
//! Each category is scored independently into `[0, 100]` from the activity
//! snapshot. A category whose arithmetic produces a non-finite value drops to
//! zero on its own; the calculation as a whole never fails.

use chrono::{DateTime, Utc};
use tracing::warn;
use twinforge_core::constants::scoring::{
    BODY_SCAN_COUNT_CAP, BODY_SCAN_POINTS_PER_SCAN, BODY_SCAN_PROJECTION_POINTS,
    BODY_SCAN_RECENCY_TIERS, CONFIDENCE_FULL_DATA_POINTS, CONSISTENCY_DAILY_SHARE,
    CONSISTENCY_POINTS_PER_STREAK_DAY, CONSISTENCY_STREAK_CAP, FASTING_POINTS_PER_SESSION,
    FASTING_POINTS_PER_STREAK_DAY, FASTING_SESSION_CAP, FASTING_STREAK_CAP,
    FASTING_SUCCESS_POINTS, NUTRITION_FREQUENCY_POINTS, NUTRITION_MEAL_PLAN_POINTS,
    NUTRITION_MEAL_TARGET, NUTRITION_PANTRY_POINTS, NUTRITION_PANTRY_TARGET_ITEMS,
    NUTRITION_PROTEIN_POINTS, NUTRITION_PROTEIN_TARGET_G, TRAINING_FREQUENCY_POINTS,
    TRAINING_HISTORY_CAP, TRAINING_RECENCY_TIERS, TRAINING_WEEKLY_TARGET,
    TREND_IMPROVING_MAX_DAYS, TREND_IMPROVING_MIN_SCORE, TREND_STABLE_MAX_DAYS,
    TREND_STABLE_MIN_SCORE, WEARABLE_CALORIES_POINTS, WEARABLE_FREQUENCY_POINTS,
    WEARABLE_HEART_RATE_POINTS, WEARABLE_WEEKLY_TARGET,
};
use twinforge_core::models::{
    ActivitySnapshot, AdaptiveScores, CategoryWeights, DomainAggregate, ForgeScore, ObjectiveType,
    ScoreCategory, ScoreTrend,
};

/// Inputs besides the snapshot
#[derive(Debug, Clone, Copy)]
pub struct ScoringInputs {
    /// Active objective, if any
    pub objective: Option<ObjectiveType>,
    /// Today's consistency score (0-100)
    pub daily_consistency_score: f64,
    /// Current streak in days
    pub streak_days: u32,
    /// Evaluation instant
    pub now: DateTime<Utc>,
}

/// Adaptive score calculator
pub struct AdaptiveScoreCalculator;

impl AdaptiveScoreCalculator {
    /// Compute all category scores, the overall score, trend, and confidence
    ///
    /// A missing snapshot yields an all-zero result with a `stable` trend.
    #[must_use]
    pub fn calculate(snapshot: Option<&ActivitySnapshot>, inputs: ScoringInputs) -> AdaptiveScores {
        let weights = inputs
            .objective
            .map_or(CategoryWeights::DEFAULT, ObjectiveType::weights);

        let Some(snapshot) = snapshot else {
            return Self::zero_scores(&weights, "No activity data available");
        };

        let training = Self::guarded(
            Self::training_score(&snapshot.training, inputs.now),
            weights.training,
            "Training",
        );
        let nutrition = Self::guarded(
            Self::nutrition_score(snapshot),
            weights.nutrition,
            "Nutrition",
        );
        let body_scan = Self::guarded(
            Self::body_scan_score(snapshot, inputs.now),
            weights.body_scan,
            "Body scan",
        );
        let fasting = Self::guarded(Self::fasting_score(snapshot), weights.fasting, "Fasting");
        let wearable = Self::guarded(Self::wearable_score(snapshot), weights.wearable, "Wearable");
        let consistency = Self::guarded(
            Self::consistency_score(inputs.daily_consistency_score, inputs.streak_days),
            weights.consistency,
            "Consistency",
        );

        let mut scores = AdaptiveScores {
            training,
            nutrition,
            body_scan,
            fasting,
            wearable,
            consistency,
            overall_score: 0.0,
            objective_progress: 0.0,
            trend: ScoreTrend::Stable,
            confidence: 0.0,
        };

        scores.overall_score = Self::overall_score(&scores);
        scores.objective_progress = inputs
            .objective
            .map_or(0.0, |objective| Self::objective_progress(&scores, objective));
        scores.trend = Self::trend(snapshot, scores.overall_score, inputs.now);
        scores.confidence = (f64::from(snapshot.total_data_points()) / CONFIDENCE_FULL_DATA_POINTS
            * 100.0)
            .min(100.0);
        scores
    }

    fn zero_scores(weights: &CategoryWeights, details: &str) -> AdaptiveScores {
        AdaptiveScores {
            training: ForgeScore::zero(weights.training, details),
            nutrition: ForgeScore::zero(weights.nutrition, details),
            body_scan: ForgeScore::zero(weights.body_scan, details),
            fasting: ForgeScore::zero(weights.fasting, details),
            wearable: ForgeScore::zero(weights.wearable, details),
            consistency: ForgeScore::zero(weights.consistency, details),
            overall_score: 0.0,
            objective_progress: 0.0,
            trend: ScoreTrend::Stable,
            confidence: 0.0,
        }
    }

    /// Attach the weight and drop a category to zero if its score is not finite
    fn guarded(mut score: ForgeScore, weight: f64, label: &str) -> ForgeScore {
        if score.score.is_finite() {
            score.score = score.score.clamp(0.0, 100.0);
            score.weight = weight;
            score
        } else {
            warn!(category = label, "Category score was not finite, degrading to zero");
            ForgeScore::zero(weight, format!("{label} score could not be computed"))
        }
    }

    fn days_since(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<f64> {
        last.map(|at| ((now - at).num_seconds() as f64 / 86_400.0).max(0.0))
    }

    fn recency_bonus(days: Option<f64>, tiers: &[(i64, f64)]) -> f64 {
        days.and_then(|days| {
            tiers
                .iter()
                .find(|(max_days, _)| days <= *max_days as f64)
                .map(|(_, points)| *points)
        })
        .unwrap_or(0.0)
    }

    fn no_data(label: &str) -> ForgeScore {
        ForgeScore::zero(0.0, format!("No {label} data yet"))
    }

    fn training_score(training: &DomainAggregate, now: DateTime<Utc>) -> ForgeScore {
        if !training.has_data {
            return Self::no_data("training");
        }
        let frequency = (f64::from(training.recent_count) / TRAINING_WEEKLY_TARGET).min(1.0)
            * TRAINING_FREQUENCY_POINTS;
        let history = f64::from(training.total_count).min(TRAINING_HISTORY_CAP);
        let days = Self::days_since(training.last_activity, now);
        let recency = Self::recency_bonus(days, &TRAINING_RECENCY_TIERS);

        ForgeScore {
            score: frequency + history + recency,
            weight: 0.0,
            details: format!(
                "{} sessions this week, {} total",
                training.recent_count, training.total_count
            ),
            data_points: training.total_count,
            last_activity: training.last_activity,
        }
    }

    fn nutrition_score(snapshot: &ActivitySnapshot) -> ForgeScore {
        let meals = &snapshot.nutrition;
        let extras = &snapshot.nutrition_extras;
        if !meals.has_data && !extras.has_active_meal_plan && extras.pantry_item_count == 0 {
            return Self::no_data("nutrition");
        }
        let frequency = (f64::from(meals.recent_count) / NUTRITION_MEAL_TARGET).min(1.0)
            * NUTRITION_FREQUENCY_POINTS;
        let plan = if extras.has_active_meal_plan {
            NUTRITION_MEAL_PLAN_POINTS
        } else {
            0.0
        };
        let pantry = (f64::from(extras.pantry_item_count) / NUTRITION_PANTRY_TARGET_ITEMS).min(1.0)
            * NUTRITION_PANTRY_POINTS;
        let protein = extras.avg_daily_protein_g.map_or(0.0, |grams| {
            (grams / NUTRITION_PROTEIN_TARGET_G).clamp(0.0, 1.0) * NUTRITION_PROTEIN_POINTS
        });

        ForgeScore {
            score: frequency + plan + pantry + protein,
            weight: 0.0,
            details: format!(
                "{} meals logged recently{}",
                meals.recent_count,
                if extras.has_active_meal_plan {
                    ", meal plan active"
                } else {
                    ""
                }
            ),
            data_points: meals.total_count,
            last_activity: meals.last_activity,
        }
    }

    fn body_scan_score(snapshot: &ActivitySnapshot, now: DateTime<Utc>) -> ForgeScore {
        let scans = &snapshot.body_scan;
        if !scans.has_data {
            return Self::no_data("body scan");
        }
        let count = (f64::from(scans.total_count) * BODY_SCAN_POINTS_PER_SCAN).min(BODY_SCAN_COUNT_CAP);
        let days = Self::days_since(scans.last_activity, now);
        let recency = Self::recency_bonus(days, &BODY_SCAN_RECENCY_TIERS);
        let projections = if snapshot.body_scan_extras.has_projections {
            BODY_SCAN_PROJECTION_POINTS
        } else {
            0.0
        };

        ForgeScore {
            score: count + recency + projections,
            weight: 0.0,
            details: format!("{} scans recorded", scans.total_count),
            data_points: scans.total_count,
            last_activity: scans.last_activity,
        }
    }

    fn fasting_score(snapshot: &ActivitySnapshot) -> ForgeScore {
        let sessions = &snapshot.fasting;
        if !sessions.has_data {
            return Self::no_data("fasting");
        }
        let extras = &snapshot.fasting_extras;
        let count =
            (f64::from(sessions.total_count) * FASTING_POINTS_PER_SESSION).min(FASTING_SESSION_CAP);
        let streak = (f64::from(extras.current_streak_days) * FASTING_POINTS_PER_STREAK_DAY)
            .min(FASTING_STREAK_CAP);
        let success =
            (extras.success_rate_percent / 100.0).clamp(0.0, 1.0) * FASTING_SUCCESS_POINTS;

        ForgeScore {
            score: count + streak + success,
            weight: 0.0,
            details: format!(
                "{} sessions, {}-day streak, {:.0}% success",
                sessions.total_count, extras.current_streak_days, extras.success_rate_percent
            ),
            data_points: sessions.total_count,
            last_activity: sessions.last_activity,
        }
    }

    fn wearable_score(snapshot: &ActivitySnapshot) -> ForgeScore {
        let activities = &snapshot.wearable;
        if !activities.has_data {
            return Self::no_data("wearable");
        }
        let extras = &snapshot.wearable_extras;
        let frequency = (f64::from(activities.recent_count) / WEARABLE_WEEKLY_TARGET).min(1.0)
            * WEARABLE_FREQUENCY_POINTS;
        let heart_rate = match extras.avg_heart_rate {
            Some(bpm) if bpm > 0.0 => WEARABLE_HEART_RATE_POINTS,
            _ => 0.0,
        };
        let calories = if extras.total_calories_burned > 0.0 {
            WEARABLE_CALORIES_POINTS
        } else {
            0.0
        };

        ForgeScore {
            score: frequency + heart_rate + calories,
            weight: 0.0,
            details: format!("{} activities this week", activities.recent_count),
            data_points: activities.total_count,
            last_activity: activities.last_activity,
        }
    }

    fn consistency_score(daily_consistency_score: f64, streak_days: u32) -> ForgeScore {
        let daily = daily_consistency_score.clamp(0.0, 100.0) * CONSISTENCY_DAILY_SHARE;
        let streak = (f64::from(streak_days) * CONSISTENCY_POINTS_PER_STREAK_DAY)
            .min(CONSISTENCY_STREAK_CAP);

        ForgeScore {
            score: daily + streak,
            weight: 0.0,
            details: format!("{streak_days}-day streak"),
            data_points: streak_days,
            last_activity: None,
        }
    }

    fn overall_score(scores: &AdaptiveScores) -> f64 {
        ScoreCategory::ALL
            .iter()
            .map(|category| {
                let score = scores.category(*category);
                score.score * score.weight
            })
            .sum::<f64>()
            .clamp(0.0, 100.0)
    }

    /// Mean score of the objective's two highest-weighted categories
    fn objective_progress(scores: &AdaptiveScores, objective: ObjectiveType) -> f64 {
        let primary = objective.weights().primary_categories();
        primary
            .iter()
            .map(|category| scores.category(*category).score)
            .sum::<f64>()
            / primary.len() as f64
    }

    fn trend(snapshot: &ActivitySnapshot, overall_score: f64, now: DateTime<Utc>) -> ScoreTrend {
        let days: Vec<f64> = snapshot
            .domains()
            .iter()
            .filter(|domain| domain.has_data)
            .filter_map(|domain| Self::days_since(domain.last_activity, now))
            .collect();
        if days.is_empty() {
            return ScoreTrend::Stable;
        }
        let average_days = days.iter().sum::<f64>() / days.len() as f64;

        if overall_score >= TREND_IMPROVING_MIN_SCORE && average_days <= TREND_IMPROVING_MAX_DAYS {
            ScoreTrend::Improving
        } else if overall_score >= TREND_STABLE_MIN_SCORE && average_days <= TREND_STABLE_MAX_DAYS
        {
            ScoreTrend::Stable
        } else {
            ScoreTrend::Declining
        }
    }
}

/// Convenience wrapper around [`AdaptiveScoreCalculator::calculate`]
#[must_use]
pub fn calculate_adaptive_scores(
    snapshot: Option<&ActivitySnapshot>,
    inputs: ScoringInputs,
) -> AdaptiveScores {
    AdaptiveScoreCalculator::calculate(snapshot, inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use twinforge_core::models::{FastingExtras, NutritionExtras, WearableExtras};

    fn inputs(objective: Option<ObjectiveType>) -> ScoringInputs {
        ScoringInputs {
            objective,
            daily_consistency_score: 0.0,
            streak_days: 0,
            now: Utc::now(),
        }
    }

    #[test]
    fn test_missing_snapshot_is_all_zero_and_stable() {
        let scores = calculate_adaptive_scores(None, inputs(None));
        assert!(scores.overall_score.abs() < f64::EPSILON);
        for category in ScoreCategory::ALL {
            assert!(scores.category(category).score.abs() < f64::EPSILON);
        }
        assert_eq!(scores.trend, ScoreTrend::Stable);
    }

    #[test]
    fn test_empty_snapshot_is_all_zero_and_stable() {
        let snapshot = ActivitySnapshot::default();
        let scores = calculate_adaptive_scores(Some(&snapshot), inputs(Some(ObjectiveType::FatLoss)));
        assert!(scores.overall_score.abs() < f64::EPSILON);
        assert_eq!(scores.trend, ScoreTrend::Stable);
        assert!(scores.confidence.abs() < f64::EPSILON);
        assert!((scores.nutrition.weight - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_training_formula() {
        let now = Utc::now();
        let snapshot = ActivitySnapshot {
            training: DomainAggregate::new(12, 3, Some(now - Duration::hours(12))),
            ..ActivitySnapshot::default()
        };
        let scores = calculate_adaptive_scores(
            Some(&snapshot),
            ScoringInputs {
                now,
                ..inputs(None)
            },
        );
        // 40 frequency + 12 history + 30 recency
        assert!((scores.training.score - 82.0).abs() < 1e-9);
        assert_eq!(scores.training.data_points, 12);
    }

    #[test]
    fn test_scores_are_capped_and_trend_improves() {
        let now = Utc::now();
        let recent = Some(now - Duration::hours(6));
        let snapshot = ActivitySnapshot {
            training: DomainAggregate::new(100, 7, recent),
            nutrition: DomainAggregate::new(200, 40, recent),
            body_scan: DomainAggregate::new(10, 2, recent),
            fasting: DomainAggregate::new(30, 10, recent),
            wearable: DomainAggregate::new(50, 9, recent),
            nutrition_extras: NutritionExtras {
                avg_daily_protein_g: Some(150.0),
                has_active_meal_plan: true,
                pantry_item_count: 40,
            },
            fasting_extras: FastingExtras {
                current_streak_days: 5,
                success_rate_percent: 100.0,
            },
            wearable_extras: WearableExtras {
                avg_heart_rate: Some(120.0),
                total_calories_burned: 3000.0,
            },
            ..ActivitySnapshot::default()
        };
        let scores = calculate_adaptive_scores(
            Some(&snapshot),
            ScoringInputs {
                objective: Some(ObjectiveType::MuscleGain),
                daily_consistency_score: 100.0,
                streak_days: 20,
                now,
            },
        );
        for category in ScoreCategory::ALL {
            let score = scores.category(category).score;
            assert!((0.0..=100.0).contains(&score), "{category:?} = {score}");
        }
        assert!(scores.overall_score >= 70.0);
        assert_eq!(scores.trend, ScoreTrend::Improving);
        assert!((scores.confidence - 100.0).abs() < f64::EPSILON);
        assert!(scores.objective_progress > 0.0);
    }

    #[test]
    fn test_non_finite_domain_degrades_alone() {
        let now = Utc::now();
        let snapshot = ActivitySnapshot {
            training: DomainAggregate::new(3, 3, Some(now)),
            fasting: DomainAggregate::new(2, 2, Some(now)),
            fasting_extras: FastingExtras {
                current_streak_days: 1,
                success_rate_percent: f64::NAN,
            },
            ..ActivitySnapshot::default()
        };
        let scores = calculate_adaptive_scores(
            Some(&snapshot),
            ScoringInputs {
                now,
                ..inputs(None)
            },
        );
        assert!(scores.fasting.score.abs() < f64::EPSILON);
        assert!(scores.fasting.details.contains("could not be computed"));
        assert!(scores.training.score > 0.0);
    }

    #[test]
    fn test_long_inactivity_declines() {
        let now = Utc::now();
        let snapshot = ActivitySnapshot {
            training: DomainAggregate::new(5, 0, Some(now - Duration::days(20))),
            ..ActivitySnapshot::default()
        };
        let scores = calculate_adaptive_scores(
            Some(&snapshot),
            ScoringInputs {
                now,
                ..inputs(None)
            },
        );
        assert_eq!(scores.trend, ScoreTrend::Declining);
    }
}
