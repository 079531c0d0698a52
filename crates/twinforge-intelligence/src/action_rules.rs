// ABOUTME: Declarative action rule catalogue and its pure evaluator
// ABOUTME: Rules are data records with tagged conditions evaluated over a typed context
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! Action rules
//!
//! The catalogue is plain data: each [`ActionRule`] carries its copy, its
//! priority, its time to live, and an [`ActionCondition`]. The evaluator only
//! knows how to interpret conditions and how to rank and deduplicate the rules
//! that pass, so rule content can change without touching evaluation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use twinforge_core::models::{
    ActionCategory, ActionSource, ActionType, ActivitySnapshot, AdaptiveScores, DashboardAction,
    DomainAggregate, ImpactLevel, ObjectiveType, ScoreCategory, ScoreTrend,
};
use uuid::Uuid;

/// Tracked activity domain referenced by conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Training sessions
    Training,
    /// Meals
    Nutrition,
    /// Body scans
    BodyScan,
    /// Fasting sessions
    Fasting,
    /// Wearable activities
    Wearable,
}

impl Domain {
    const fn aggregate(self, snapshot: &ActivitySnapshot) -> &DomainAggregate {
        match self {
            Self::Training => &snapshot.training,
            Self::Nutrition => &snapshot.nutrition,
            Self::BodyScan => &snapshot.body_scan,
            Self::Fasting => &snapshot.fasting,
            Self::Wearable => &snapshot.wearable,
        }
    }
}

/// Engagement state a rule condition is evaluated against
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    /// Activity snapshot
    pub snapshot: &'a ActivitySnapshot,
    /// Active objective
    pub objective: Option<ObjectiveType>,
    /// Current adaptive scores
    pub scores: &'a AdaptiveScores,
    /// Current streak in days
    pub streak_days: u32,
    /// Evaluation instant
    pub now: DateTime<Utc>,
}

/// Condition under which a rule fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionCondition {
    /// Always fires
    Always,
    /// The domain was never tracked
    NeverTracked {
        /// Domain checked
        domain: Domain,
    },
    /// No entry in the domain for at least `days` (or ever)
    InactiveForDays {
        /// Domain checked
        domain: Domain,
        /// Inactivity threshold
        days: i64,
    },
    /// A category score is below a threshold
    ScoreBelow {
        /// Category checked
        category: ScoreCategory,
        /// Exclusive threshold
        threshold: f64,
    },
    /// The overall score reached a threshold
    OverallAtLeast {
        /// Inclusive threshold
        threshold: f64,
    },
    /// The streak reached a length
    StreakAtLeast {
        /// Inclusive length
        days: u32,
    },
    /// Nothing was logged in any domain today
    NoActivityToday,
    /// The engagement trend matches
    TrendIs {
        /// Expected trend
        trend: ScoreTrend,
    },
    /// No objective is active
    NoActiveObjective,
    /// The active objective matches
    ObjectiveIs {
        /// Expected objective
        objective: ObjectiveType,
    },
    /// Average daily protein is known and below a target
    ProteinBelow {
        /// Target in grams
        grams: f64,
    },
    /// No meal plan is active
    NoMealPlan,
    /// Every nested condition holds
    All {
        /// Nested conditions
        conditions: Vec<ActionCondition>,
    },
    /// At least one nested condition holds
    Any {
        /// Nested conditions
        conditions: Vec<ActionCondition>,
    },
}

impl ActionCondition {
    /// Evaluate the condition
    #[must_use]
    pub fn evaluate(&self, ctx: &ActionContext<'_>) -> bool {
        match self {
            Self::Always => true,
            Self::NeverTracked { domain } => !domain.aggregate(ctx.snapshot).has_data,
            Self::InactiveForDays { domain, days } => {
                match domain.aggregate(ctx.snapshot).last_activity {
                    Some(at) => ctx.now - at >= Duration::days(*days),
                    None => true,
                }
            }
            Self::ScoreBelow {
                category,
                threshold,
            } => ctx.scores.category(*category).score < *threshold,
            Self::OverallAtLeast { threshold } => ctx.scores.overall_score >= *threshold,
            Self::StreakAtLeast { days } => ctx.streak_days >= *days,
            Self::NoActivityToday => {
                let today = ctx.now.date_naive();
                ctx.snapshot
                    .domains()
                    .iter()
                    .filter_map(|domain| domain.last_activity)
                    .all(|at| at.date_naive() != today)
            }
            Self::TrendIs { trend } => ctx.scores.trend == *trend,
            Self::NoActiveObjective => ctx.objective.is_none(),
            Self::ObjectiveIs { objective } => ctx.objective == Some(*objective),
            Self::ProteinBelow { grams } => ctx
                .snapshot
                .nutrition_extras
                .avg_daily_protein_g
                .is_some_and(|avg| avg < *grams),
            Self::NoMealPlan => !ctx.snapshot.nutrition_extras.has_active_meal_plan,
            Self::All { conditions } => conditions.iter().all(|c| c.evaluate(ctx)),
            Self::Any { conditions } => conditions.iter().any(|c| c.evaluate(ctx)),
        }
    }
}

/// One catalogue entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRule {
    /// Stable identifier
    pub id: String,
    /// Action kind
    pub action_type: ActionType,
    /// Area
    pub category: ActionCategory,
    /// Title, also the deduplication key
    pub title: String,
    /// Description
    pub description: String,
    /// Ranking score
    pub priority: u32,
    /// Expected effect
    pub impact: ImpactLevel,
    /// Token cost
    pub tokens_required: u32,
    /// Time to live in hours
    pub ttl_hours: i64,
    /// Firing condition
    pub condition: ActionCondition,
}

impl ActionRule {
    #[allow(clippy::too_many_arguments)]
    fn new(
        id: &str,
        action_type: ActionType,
        category: ActionCategory,
        title: &str,
        description: &str,
        priority: u32,
        impact: ImpactLevel,
        ttl_hours: i64,
        condition: ActionCondition,
    ) -> Self {
        Self {
            id: id.to_owned(),
            action_type,
            category,
            title: title.to_owned(),
            description: description.to_owned(),
            priority,
            impact,
            tokens_required: 0,
            ttl_hours,
            condition,
        }
    }

    /// Materialize the rule as a dashboard action expiring `ttl_hours` after `now`
    #[must_use]
    pub fn to_action(
        &self,
        user_id: Uuid,
        source: ActionSource,
        now: DateTime<Utc>,
    ) -> DashboardAction {
        DashboardAction {
            id: Uuid::new_v4(),
            user_id,
            action_type: self.action_type,
            category: self.category,
            title: self.title.clone(),
            description: self.description.clone(),
            priority_score: self.priority,
            estimated_impact: self.impact,
            tokens_required: self.tokens_required,
            expires_at: now + Duration::hours(self.ttl_hours),
            is_completed: false,
            is_dismissed: false,
            completed_at: None,
            source,
            created_at: now,
        }
    }
}

/// Rules that pass, ranked by priority, minus titles already live, capped at `limit`
#[must_use]
pub fn select_rules<'r>(
    rules: &'r [ActionRule],
    ctx: &ActionContext<'_>,
    live_titles: &HashSet<String>,
    limit: usize,
) -> Vec<&'r ActionRule> {
    let mut passing: Vec<&ActionRule> = rules.iter().filter(|r| r.condition.evaluate(ctx)).collect();
    passing.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut seen = HashSet::new();
    passing
        .into_iter()
        .filter(|rule| !live_titles.contains(&rule.title) && seen.insert(rule.title.as_str()))
        .take(limit)
        .collect()
}

/// Built-in rule catalogue
#[must_use]
pub fn default_catalogue() -> Vec<ActionRule> {
    use ActionCondition::{
        All, Any, InactiveForDays, NeverTracked, NoActiveObjective, NoActivityToday, NoMealPlan,
        ObjectiveIs, OverallAtLeast, ProteinBelow, ScoreBelow, StreakAtLeast, TrendIs,
    };

    vec![
        ActionRule::new(
            "protect_streak",
            ActionType::Urgent,
            ActionCategory::Consistency,
            "Protect your streak",
            "Log any activity today to keep your streak alive",
            95,
            ImpactLevel::High,
            12,
            All {
                conditions: vec![StreakAtLeast { days: 3 }, NoActivityToday],
            },
        ),
        ActionRule::new(
            "log_training",
            ActionType::QuickWin,
            ActionCategory::Training,
            "Log today's training",
            "Record a workout to keep your training score moving",
            90,
            ImpactLevel::High,
            24,
            InactiveForDays {
                domain: Domain::Training,
                days: 3,
            },
        ),
        ActionRule::new(
            "back_on_track",
            ActionType::Urgent,
            ActionCategory::Consistency,
            "Get back on track",
            "Your engagement is slipping; one small session today turns it around",
            88,
            ImpactLevel::High,
            48,
            TrendIs {
                trend: ScoreTrend::Declining,
            },
        ),
        ActionRule::new(
            "log_meals",
            ActionType::QuickWin,
            ActionCategory::Nutrition,
            "Log your meals today",
            "Track what you eat to sharpen your nutrition score",
            85,
            ImpactLevel::Medium,
            24,
            InactiveForDays {
                domain: Domain::Nutrition,
                days: 1,
            },
        ),
        ActionRule::new(
            "set_objective",
            ActionType::Milestone,
            ActionCategory::Objective,
            "Set your transformation objective",
            "Choose a goal so your scores and predictions adapt to it",
            80,
            ImpactLevel::High,
            168,
            NoActiveObjective,
        ),
        ActionRule::new(
            "strength_session",
            ActionType::Routine,
            ActionCategory::Training,
            "Add a strength session",
            "Resistance training drives your muscle and strength goals",
            75,
            ImpactLevel::Medium,
            48,
            All {
                conditions: vec![
                    Any {
                        conditions: vec![
                            ObjectiveIs {
                                objective: ObjectiveType::MuscleGain,
                            },
                            ObjectiveIs {
                                objective: ObjectiveType::Strength,
                            },
                        ],
                    },
                    ScoreBelow {
                        category: ScoreCategory::Training,
                        threshold: 60.0,
                    },
                ],
            },
        ),
        ActionRule::new(
            "body_scan",
            ActionType::Milestone,
            ActionCategory::BodyScan,
            "Update your body scan",
            "A fresh scan keeps your projections accurate",
            70,
            ImpactLevel::Medium,
            72,
            InactiveForDays {
                domain: Domain::BodyScan,
                days: 14,
            },
        ),
        ActionRule::new(
            "protein_target",
            ActionType::Routine,
            ActionCategory::Nutrition,
            "Hit your protein target",
            "Aim for at least 100 g of protein today",
            65,
            ImpactLevel::Medium,
            24,
            ProteinBelow { grams: 100.0 },
        ),
        ActionRule::new(
            "fasting_window",
            ActionType::Routine,
            ActionCategory::Fasting,
            "Plan a fasting window",
            "A structured fasting window supports your fat loss objective",
            60,
            ImpactLevel::Medium,
            48,
            All {
                conditions: vec![
                    ObjectiveIs {
                        objective: ObjectiveType::FatLoss,
                    },
                    InactiveForDays {
                        domain: Domain::Fasting,
                        days: 7,
                    },
                ],
            },
        ),
        ActionRule::new(
            "meal_plan",
            ActionType::Routine,
            ActionCategory::Nutrition,
            "Plan your meals for the week",
            "A meal plan makes your nutrition targets easier to hit",
            58,
            ImpactLevel::Medium,
            168,
            All {
                conditions: vec![
                    NoMealPlan,
                    ScoreBelow {
                        category: ScoreCategory::Nutrition,
                        threshold: 40.0,
                    },
                ],
            },
        ),
        ActionRule::new(
            "connect_wearable",
            ActionType::Milestone,
            ActionCategory::Wearable,
            "Connect a wearable device",
            "Sync heart rate and calories automatically",
            55,
            ImpactLevel::Medium,
            168,
            NeverTracked {
                domain: Domain::Wearable,
            },
        ),
        ActionRule::new(
            "try_fasting",
            ActionType::Challenge,
            ActionCategory::Fasting,
            "Try a fasting session",
            "Start with a short 12-hour fast",
            50,
            ImpactLevel::Low,
            168,
            NeverTracked {
                domain: Domain::Fasting,
            },
        ),
        ActionRule::new(
            "weekly_challenge",
            ActionType::Challenge,
            ActionCategory::Consistency,
            "Take on a weekly challenge",
            "You are in great shape; push for five active days this week",
            45,
            ImpactLevel::Medium,
            168,
            OverallAtLeast { threshold: 70.0 },
        ),
    ]
}

/// Minimal static set used when neither rules nor the generative endpoint produce enough
#[must_use]
pub fn fallback_catalogue() -> Vec<ActionRule> {
    vec![
        ActionRule::new(
            "fallback_meal",
            ActionType::QuickWin,
            ActionCategory::Nutrition,
            "Log a meal",
            "Record your next meal",
            30,
            ImpactLevel::Low,
            24,
            ActionCondition::Always,
        ),
        ActionRule::new(
            "fallback_weight",
            ActionType::QuickWin,
            ActionCategory::BodyScan,
            "Record your weight",
            "A quick weigh-in keeps your progress current",
            25,
            ImpactLevel::Low,
            24,
            ActionCondition::Always,
        ),
        ActionRule::new(
            "fallback_workout",
            ActionType::QuickWin,
            ActionCategory::Training,
            "Complete a quick workout",
            "Ten minutes of movement counts",
            20,
            ImpactLevel::Low,
            24,
            ActionCondition::Always,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptive_scores::{calculate_adaptive_scores, ScoringInputs};
    use twinforge_core::models::NutritionExtras;

    fn scores_for(snapshot: &ActivitySnapshot, now: DateTime<Utc>) -> AdaptiveScores {
        calculate_adaptive_scores(
            Some(snapshot),
            ScoringInputs {
                objective: None,
                daily_consistency_score: 0.0,
                streak_days: 0,
                now,
            },
        )
    }

    #[test]
    fn test_new_user_gets_onboarding_rules() {
        let now = Utc::now();
        let snapshot = ActivitySnapshot::default();
        let scores = scores_for(&snapshot, now);
        let ctx = ActionContext {
            snapshot: &snapshot,
            objective: None,
            scores: &scores,
            streak_days: 0,
            now,
        };
        let catalogue = default_catalogue();
        let selected = select_rules(&catalogue, &ctx, &HashSet::new(), 5);
        assert_eq!(selected.len(), 5);
        assert_eq!(selected[0].id, "log_training");
        assert!(selected.windows(2).all(|w| w[0].priority >= w[1].priority));
    }

    #[test]
    fn test_live_titles_are_skipped() {
        let now = Utc::now();
        let snapshot = ActivitySnapshot::default();
        let scores = scores_for(&snapshot, now);
        let ctx = ActionContext {
            snapshot: &snapshot,
            objective: None,
            scores: &scores,
            streak_days: 0,
            now,
        };
        let catalogue = default_catalogue();
        let live: HashSet<String> = ["Log today's training".to_owned()].into_iter().collect();
        let selected = select_rules(&catalogue, &ctx, &live, 5);
        assert!(selected.iter().all(|r| r.title != "Log today's training"));
    }

    #[test]
    fn test_streak_protection_needs_idle_day() {
        let now = Utc::now();
        let snapshot = ActivitySnapshot {
            nutrition: DomainAggregate::new(10, 3, Some(now - Duration::days(2))),
            nutrition_extras: NutritionExtras {
                avg_daily_protein_g: Some(80.0),
                ..NutritionExtras::default()
            },
            ..ActivitySnapshot::default()
        };
        let scores = scores_for(&snapshot, now);
        let ctx = ActionContext {
            snapshot: &snapshot,
            objective: Some(ObjectiveType::FatLoss),
            scores: &scores,
            streak_days: 4,
            now,
        };
        let protect = default_catalogue()
            .into_iter()
            .find(|rule| rule.id == "protect_streak")
            .unwrap();
        assert!(protect.condition.evaluate(&ctx));
        let protein = default_catalogue()
            .into_iter()
            .find(|rule| rule.id == "protein_target")
            .unwrap();
        assert!(protein.condition.evaluate(&ctx));
    }

    #[test]
    fn test_condition_serializes_as_tagged_record() {
        let condition = ActionCondition::InactiveForDays {
            domain: Domain::BodyScan,
            days: 14,
        };
        let json = serde_json::to_value(&condition).unwrap();
        assert_eq!(json["kind"], "inactive_for_days");
        assert_eq!(json["domain"], "body_scan");
    }

    #[test]
    fn test_action_expiry_uses_ttl() {
        let now = Utc::now();
        let rule = &fallback_catalogue()[0];
        let action = rule.to_action(Uuid::new_v4(), ActionSource::Fallback, now);
        assert_eq!(action.expires_at - now, Duration::hours(24));
        assert!(action.is_live(now));
    }
}
