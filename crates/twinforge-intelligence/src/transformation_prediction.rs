// ABOUTME: Weight-goal projection from a sparse weight series and engagement influence factors
// ABOUTME: Regression trend, influence adjustment, target dates, confidence, and recommendations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! Transformation prediction
//!
//! The raw weekly trend comes from a least-squares fit of weight against days
//! since the first reading. Engagement (activity, streak, meal logging) scales
//! that trend between 0.7x and 1.3x before a target date is projected.

use crate::statistical_analysis::StatisticalAnalyzer;
use chrono::{DateTime, Days, NaiveDate, Utc};
use std::collections::BTreeMap;
use tracing::debug;
use twinforge_core::constants::prediction::{
    ACTIVITY_INFLUENCE_WEIGHT, CALORIC_INFLUENCE_WEIGHT, CONFIDENCE_FULL_DATA_POINTS,
    CONSISTENCY_INFLUENCE_WEIGHT, CONTRADICTION_DAMPENING, INFLUENCE_POINTS_PER_EVENT,
    LONG_HORIZON_DAYS, MAX_CONFIDENCE, MAX_TREND_MULTIPLIER, MIN_CONFIDENCE,
    MIN_PROJECTABLE_TREND, MIN_TREND_MULTIPLIER, OPTIMISTIC_MULTIPLIER, PESSIMISTIC_MULTIPLIER,
    SANE_TREND_MAX, SANE_TREND_MIN,
};
use twinforge_core::models::{
    InfluenceFactors, ObjectiveType, TransformationPrediction, WeightPoint, WeightSource,
};
use uuid::Uuid;

/// Everything the projection needs, already loaded
#[derive(Debug, Clone)]
pub struct PredictionInput<'a> {
    /// Owner
    pub user_id: Uuid,
    /// Profile weight (kg)
    pub current_weight: Option<f64>,
    /// Profile target weight (kg)
    pub target_weight: Option<f64>,
    /// Active objective, if any
    pub objective: Option<ObjectiveType>,
    /// Weight readings from the lookback window, any order
    pub weight_points: &'a [WeightPoint],
    /// Training sessions plus wearable activities in the influence window
    pub activity_count: u32,
    /// Current streak in days
    pub streak_days: u32,
    /// Meals logged in the influence window
    pub meal_count: u32,
    /// Evaluation instant
    pub now: DateTime<Utc>,
}

/// Transformation prediction engine
pub struct TransformationPredictor;

impl TransformationPredictor {
    /// Project the target date, or `None` when there is not enough signal
    ///
    /// `None` is returned when the profile lacks a current or target weight,
    /// when fewer than two distinct days of readings exist, or when the
    /// adjusted trend is indistinguishable from zero.
    #[must_use]
    pub fn project(input: &PredictionInput<'_>) -> Option<TransformationPrediction> {
        let current_weight = input.current_weight?;
        let target_weight = input.target_weight?;

        let points = Self::dedup_by_day(input.weight_points);
        if points.len() < 2 {
            debug!(
                user.id = %input.user_id,
                points = points.len(),
                "Not enough weight data points for a prediction"
            );
            return None;
        }

        let raw_weekly_trend = Self::raw_weekly_trend(&points)?;
        let influence =
            Self::influence_factors(input.activity_count, input.streak_days, input.meal_count);
        let weekly_trend = Self::adjust_trend(raw_weekly_trend, &influence, input.objective);
        if !weekly_trend.is_finite() || weekly_trend.abs() < MIN_PROJECTABLE_TREND {
            debug!(user.id = %input.user_id, weekly_trend, "Trend too flat to project");
            return None;
        }

        let weight_to_go = target_weight - current_weight;
        let days_to_target = Self::days_at(weight_to_go, weekly_trend)?;
        let today = input.now.date_naive();
        let estimated_date = Self::date_after(today, days_to_target)?;
        let optimistic_date = Self::date_after(
            today,
            Self::days_at(weight_to_go, weekly_trend * OPTIMISTIC_MULTIPLIER)?,
        )?;
        let pessimistic_date = Self::date_after(
            today,
            Self::days_at(weight_to_go, weekly_trend * PESSIMISTIC_MULTIPLIER)?,
        )?;

        let data_points = u32::try_from(points.len()).unwrap_or(u32::MAX);
        let moving_away = weight_to_go * weekly_trend < 0.0;

        Some(TransformationPrediction {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            current_weight,
            target_weight,
            weekly_trend,
            raw_weekly_trend,
            days_to_target,
            estimated_date,
            optimistic_date,
            pessimistic_date,
            confidence_score: Self::confidence(data_points, &influence, weekly_trend),
            data_points,
            recommendations: Self::recommendations(
                &influence,
                weekly_trend,
                days_to_target,
                moving_away,
            ),
            influence_factors: influence,
            is_active: true,
            created_at: input.now,
        })
    }

    /// One reading per calendar day, ascending; weight updates win over body scans
    #[must_use]
    pub fn dedup_by_day(points: &[WeightPoint]) -> Vec<WeightPoint> {
        let mut by_day: BTreeMap<NaiveDate, WeightPoint> = BTreeMap::new();
        for point in points.iter().filter(|p| p.weight_kg.is_finite()) {
            let day = point.recorded_at.date_naive();
            let replace = match by_day.get(&day) {
                None => true,
                Some(existing) => match (existing.source, point.source) {
                    (WeightSource::BodyScan, WeightSource::WeightUpdate) => true,
                    (WeightSource::WeightUpdate, WeightSource::BodyScan) => false,
                    _ => point.recorded_at > existing.recorded_at,
                },
            };
            if replace {
                by_day.insert(day, *point);
            }
        }
        by_day.into_values().collect()
    }

    /// Least-squares slope in kg/week over days since the first reading
    fn raw_weekly_trend(points: &[WeightPoint]) -> Option<f64> {
        let first_day = points.first()?.recorded_at.date_naive();
        let samples: Vec<(f64, f64)> = points
            .iter()
            .map(|p| {
                let days = (p.recorded_at.date_naive() - first_day).num_days() as f64;
                (days, p.weight_kg)
            })
            .collect();
        StatisticalAnalyzer::linear_regression(&samples)
            .ok()
            .map(|fit| fit.slope * 7.0)
    }

    /// Activity, consistency, and caloric-balance scores from 30-day counts
    #[must_use]
    pub fn influence_factors(activity_count: u32, streak_days: u32, meal_count: u32) -> InfluenceFactors {
        let scaled = |count: u32| (f64::from(count) * INFLUENCE_POINTS_PER_EVENT).min(100.0);
        let activity_score = scaled(activity_count);
        let consistency_score = scaled(streak_days);
        let caloric_balance_score = scaled(meal_count);
        InfluenceFactors {
            activity_score,
            consistency_score,
            caloric_balance_score,
            overall_score: activity_score * ACTIVITY_INFLUENCE_WEIGHT
                + consistency_score * CONSISTENCY_INFLUENCE_WEIGHT
                + caloric_balance_score * CALORIC_INFLUENCE_WEIGHT,
        }
    }

    /// Scale the raw trend by influence and dampen it when it contradicts the objective
    #[must_use]
    pub fn adjust_trend(
        raw_weekly_trend: f64,
        influence: &InfluenceFactors,
        objective: Option<ObjectiveType>,
    ) -> f64 {
        let multiplier = (MAX_TREND_MULTIPLIER - MIN_TREND_MULTIPLIER)
            .mul_add(influence.overall_score / 100.0, MIN_TREND_MULTIPLIER);
        let adjusted = raw_weekly_trend * multiplier;

        let contradicts = objective.is_some_and(|objective| {
            (objective.penalizes_gain() && adjusted > 0.0)
                || (objective.penalizes_loss() && adjusted < 0.0)
        });
        if contradicts {
            adjusted * CONTRADICTION_DAMPENING
        } else {
            adjusted
        }
    }

    fn days_at(weight_to_go: f64, weekly_trend: f64) -> Option<i64> {
        let days = (weight_to_go / weekly_trend).abs() * 7.0;
        if days.is_finite() && days < i64::MAX as f64 {
            Some(days.round() as i64)
        } else {
            None
        }
    }

    fn date_after(today: NaiveDate, days: i64) -> Option<NaiveDate> {
        today.checked_add_days(Days::new(u64::try_from(days).ok()?))
    }

    /// Confidence in `[20, 95]` from data volume, influence, and trend plausibility
    #[must_use]
    pub fn confidence(data_points: u32, influence: &InfluenceFactors, weekly_trend: f64) -> f64 {
        let data_share = (f64::from(data_points) / CONFIDENCE_FULL_DATA_POINTS).min(1.0) * 30.0;
        let influence_share = influence.overall_score / 100.0 * 30.0;
        let magnitude = weekly_trend.abs();
        let plausibility = if (SANE_TREND_MIN..=SANE_TREND_MAX).contains(&magnitude) {
            20.0
        } else if magnitude > SANE_TREND_MAX {
            10.0
        } else {
            0.0
        };
        (MIN_CONFIDENCE + data_share + influence_share + plausibility)
            .clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
    }

    fn recommendations(
        influence: &InfluenceFactors,
        weekly_trend: f64,
        days_to_target: i64,
        moving_away: bool,
    ) -> Vec<String> {
        let mut recommendations = Vec::new();

        if moving_away {
            recommendations.push(
                "Your weight is moving away from your target; review your training and nutrition plan"
                    .to_owned(),
            );
        }
        if influence.activity_score < 50.0 {
            recommendations
                .push("Log more training sessions and activities to accelerate progress".to_owned());
        }
        if influence.consistency_score < 50.0 {
            recommendations.push(
                "Build a daily tracking streak; consistent data sharpens your prediction".to_owned(),
            );
        }
        if influence.caloric_balance_score < 50.0 {
            recommendations
                .push("Track your meals more regularly to keep your energy balance on course".to_owned());
        }
        if weekly_trend.abs() > SANE_TREND_MAX {
            recommendations.push(
                "Your current pace is very fast; aim for a more sustainable rate of change".to_owned(),
            );
        } else if weekly_trend.abs() < SANE_TREND_MIN {
            recommendations.push(
                "Progress is slow; small adjustments to training or nutrition can speed it up"
                    .to_owned(),
            );
        }
        if days_to_target > LONG_HORIZON_DAYS {
            recommendations.push(
                "At this pace your target is more than a year away; consider adjusting your objective"
                    .to_owned(),
            );
        }
        if recommendations.is_empty() {
            recommendations.push("You are on track; keep up your current routine".to_owned());
        }
        recommendations
    }
}

/// Convenience wrapper around [`TransformationPredictor::project`]
#[must_use]
pub fn project_transformation(input: &PredictionInput<'_>) -> Option<TransformationPrediction> {
    TransformationPredictor::project(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn point(days_ago: i64, weight_kg: f64, source: WeightSource, now: DateTime<Utc>) -> WeightPoint {
        WeightPoint {
            recorded_at: now - Duration::days(days_ago),
            weight_kg,
            source,
        }
    }

    fn input<'a>(points: &'a [WeightPoint], now: DateTime<Utc>) -> PredictionInput<'a> {
        PredictionInput {
            user_id: Uuid::new_v4(),
            current_weight: Some(88.6),
            target_weight: Some(80.0),
            objective: Some(ObjectiveType::FatLoss),
            weight_points: points,
            activity_count: 15,
            streak_days: 15,
            meal_count: 15,
            now,
        }
    }

    #[test]
    fn test_neutral_influence_keeps_trend() {
        let influence = TransformationPredictor::influence_factors(15, 15, 15);
        assert!((influence.overall_score - 49.95).abs() < 1e-9);
        let adjusted = TransformationPredictor::adjust_trend(-0.7, &influence, None);
        assert!((adjusted + 0.7).abs() < 0.01);
    }

    #[test]
    fn test_contradiction_dampens() {
        let influence = TransformationPredictor::influence_factors(0, 0, 0);
        let gaining = TransformationPredictor::adjust_trend(1.0, &influence, Some(ObjectiveType::FatLoss));
        assert!((gaining - 0.49).abs() < 1e-9);
        let losing =
            TransformationPredictor::adjust_trend(-1.0, &influence, Some(ObjectiveType::MuscleGain));
        assert!((losing + 0.49).abs() < 1e-9);
    }

    #[test]
    fn test_requires_two_days_of_readings() {
        let now = Utc::now();
        let same_day = [
            point(3, 90.0, WeightSource::WeightUpdate, now),
            point(3, 89.0, WeightSource::BodyScan, now),
        ];
        assert!(TransformationPredictor::project(&input(&same_day, now)).is_none());
    }

    #[test]
    fn test_dedup_prefers_weight_updates() {
        let now = Utc::now();
        let points = [
            point(1, 70.0, WeightSource::BodyScan, now),
            point(1, 71.0, WeightSource::WeightUpdate, now),
            point(5, 72.0, WeightSource::BodyScan, now),
        ];
        let deduped = TransformationPredictor::dedup_by_day(&points);
        assert_eq!(deduped.len(), 2);
        assert!((deduped[0].weight_kg - 72.0).abs() < f64::EPSILON);
        assert!((deduped[1].weight_kg - 71.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_flat_trend_is_not_projected() {
        let now = Utc::now();
        let flat = [
            point(20, 85.0, WeightSource::WeightUpdate, now),
            point(10, 85.0, WeightSource::WeightUpdate, now),
            point(0, 85.0, WeightSource::WeightUpdate, now),
        ];
        assert!(TransformationPredictor::project(&input(&flat, now)).is_none());
    }

    #[test]
    fn test_missing_target_is_not_projected() {
        let now = Utc::now();
        let points = [
            point(14, 90.0, WeightSource::WeightUpdate, now),
            point(0, 88.6, WeightSource::WeightUpdate, now),
        ];
        let mut without_target = input(&points, now);
        without_target.target_weight = None;
        assert!(TransformationPredictor::project(&without_target).is_none());
    }

    #[test]
    fn test_scenario_dates_are_ordered() {
        let now = Utc::now();
        let points = [
            point(14, 90.0, WeightSource::WeightUpdate, now),
            point(0, 88.6, WeightSource::WeightUpdate, now),
        ];
        let prediction = TransformationPredictor::project(&input(&points, now)).unwrap();
        assert!(prediction.optimistic_date <= prediction.estimated_date);
        assert!(prediction.estimated_date <= prediction.pessimistic_date);
        assert!((20.0..=95.0).contains(&prediction.confidence_score));
        assert!((prediction.raw_weekly_trend + 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_ninety_to_eighty_projects_about_a_hundred_days() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let points = [
            point(14, 90.0, WeightSource::WeightUpdate, now),
            point(0, 88.6, WeightSource::WeightUpdate, now),
        ];
        let mut scenario = input(&points, now);
        scenario.current_weight = Some(90.0);

        let prediction = TransformationPredictor::project(&scenario).unwrap();
        assert!((prediction.raw_weekly_trend + 0.7).abs() < 1e-9);
        assert!((prediction.weekly_trend + 0.7).abs() < 0.01);
        assert_eq!(prediction.days_to_target, 100);
        assert_eq!(
            prediction.estimated_date,
            NaiveDate::from_ymd_opt(2025, 6, 9).unwrap()
        );
        assert!((prediction.confidence_score - 60.985).abs() < 1e-6);
        assert_eq!(prediction.data_points, 2);
    }

    #[test]
    fn test_long_horizon_recommends_adjusting() {
        let influence = TransformationPredictor::influence_factors(30, 30, 30);
        let recs = TransformationPredictor::recommendations(&influence, -0.05, 900, false);
        assert!(recs.iter().any(|r| r.contains("adjusting your objective")));
    }
}
