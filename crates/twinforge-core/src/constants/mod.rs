// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Scoring targets, prediction factors, absence thresholds, and XP curve bands
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! Constants module
//!
//! Constants are grouped by the component that consumes them. Values that
//! operators may want to tune at runtime are mirrored as defaults of the
//! intelligence crate's `EngagementConfig`; everything here is fixed formula
//! content.

/// XP curve band table
pub mod level_curve {
    /// `(last_level_of_band, xp_cost_per_level)`, walked in order
    pub const BANDS: [(u32, u64); 5] = [(10, 100), (25, 150), (50, 200), (75, 300), (100, 500)];

    /// Per-level cost of the first level past the fixed bands
    pub const OPEN_BAND_BASE_COST: u64 = 600;

    /// Cost increase applied every `OPEN_BAND_STEP_LEVELS` levels past the fixed bands
    pub const OPEN_BAND_COST_STEP: u64 = 50;

    /// Number of levels sharing one cost in the open-ended band
    pub const OPEN_BAND_STEP_LEVELS: u32 = 10;

    /// Last level covered by the fixed band table
    pub const FIXED_BANDS_MAX_LEVEL: u32 = 100;
}

/// Rolling windows used when assembling the activity snapshot (days)
pub mod snapshot {
    /// Training `recent_count` window
    pub const TRAINING_RECENT_DAYS: i64 = 7;
    /// Meal `recent_count` window
    pub const NUTRITION_RECENT_DAYS: i64 = 10;
    /// Body scan `recent_count` window
    pub const BODY_SCAN_RECENT_DAYS: i64 = 30;
    /// Fasting `recent_count` window
    pub const FASTING_RECENT_DAYS: i64 = 30;
    /// Wearable `recent_count` window
    pub const WEARABLE_RECENT_DAYS: i64 = 7;
    /// Window for averages (protein, heart rate, calories, fasting success)
    pub const EXTRAS_WINDOW_DAYS: i64 = 30;
}

/// Per-domain adaptive scoring targets
pub mod scoring {
    /// Weekly training sessions that earn the full frequency share
    pub const TRAINING_WEEKLY_TARGET: f64 = 3.0;
    /// Frequency share of the training score
    pub const TRAINING_FREQUENCY_POINTS: f64 = 40.0;
    /// Cap on the historical-volume bonus (one point per session)
    pub const TRAINING_HISTORY_CAP: f64 = 30.0;
    /// Recency bonus tiers `(max_days, points)` for training
    pub const TRAINING_RECENCY_TIERS: [(i64, f64); 3] = [(1, 30.0), (3, 20.0), (7, 10.0)];

    /// Meals logged in the window that earn the full frequency share
    pub const NUTRITION_MEAL_TARGET: f64 = 30.0;
    /// Frequency share of the nutrition score
    pub const NUTRITION_FREQUENCY_POINTS: f64 = 50.0;
    /// Flat bonus for an active meal plan
    pub const NUTRITION_MEAL_PLAN_POINTS: f64 = 25.0;
    /// Maximum inventory bonus
    pub const NUTRITION_PANTRY_POINTS: f64 = 15.0;
    /// Inventory items that earn the full inventory bonus
    pub const NUTRITION_PANTRY_TARGET_ITEMS: f64 = 20.0;
    /// Maximum protein bonus
    pub const NUTRITION_PROTEIN_POINTS: f64 = 10.0;
    /// Daily protein target in grams
    pub const NUTRITION_PROTEIN_TARGET_G: f64 = 120.0;

    /// Points per body scan
    pub const BODY_SCAN_POINTS_PER_SCAN: f64 = 10.0;
    /// Cap on scan-count points
    pub const BODY_SCAN_COUNT_CAP: f64 = 40.0;
    /// Recency bonus tiers `(max_days, points)` for body scans
    pub const BODY_SCAN_RECENCY_TIERS: [(i64, f64); 3] = [(7, 30.0), (14, 20.0), (30, 10.0)];
    /// Flat bonus when forward projections exist
    pub const BODY_SCAN_PROJECTION_POINTS: f64 = 30.0;

    /// Points per fasting session
    pub const FASTING_POINTS_PER_SESSION: f64 = 5.0;
    /// Cap on fasting session points
    pub const FASTING_SESSION_CAP: f64 = 40.0;
    /// Points per fasting streak day
    pub const FASTING_POINTS_PER_STREAK_DAY: f64 = 10.0;
    /// Cap on fasting streak points
    pub const FASTING_STREAK_CAP: f64 = 30.0;
    /// Maximum success-rate points
    pub const FASTING_SUCCESS_POINTS: f64 = 30.0;

    /// Weekly wearable activities that earn the full frequency share
    pub const WEARABLE_WEEKLY_TARGET: f64 = 5.0;
    /// Frequency share of the wearable score
    pub const WEARABLE_FREQUENCY_POINTS: f64 = 60.0;
    /// Flat bonus for a heart-rate metric
    pub const WEARABLE_HEART_RATE_POINTS: f64 = 20.0;
    /// Flat bonus for calories burned
    pub const WEARABLE_CALORIES_POINTS: f64 = 20.0;

    /// Share of the daily consistency score
    pub const CONSISTENCY_DAILY_SHARE: f64 = 0.5;
    /// Streak bonus per day
    pub const CONSISTENCY_POINTS_PER_STREAK_DAY: f64 = 5.0;
    /// Cap on the streak bonus
    pub const CONSISTENCY_STREAK_CAP: f64 = 50.0;

    /// Data points that yield full confidence
    pub const CONFIDENCE_FULL_DATA_POINTS: f64 = 50.0;

    /// Trend: minimum overall score for "improving"
    pub const TREND_IMPROVING_MIN_SCORE: f64 = 70.0;
    /// Trend: maximum average inactivity (days) for "improving"
    pub const TREND_IMPROVING_MAX_DAYS: f64 = 3.0;
    /// Trend: minimum overall score for "stable"
    pub const TREND_STABLE_MIN_SCORE: f64 = 50.0;
    /// Trend: maximum average inactivity (days) for "stable"
    pub const TREND_STABLE_MAX_DAYS: f64 = 7.0;
}

/// Transformation prediction factors
pub mod prediction {
    /// Lookback window for weight data points (days)
    pub const WEIGHT_LOOKBACK_DAYS: i64 = 90;
    /// Window for influence factor counts (days)
    pub const INFLUENCE_WINDOW_DAYS: i64 = 30;
    /// Points per counted event in an influence factor
    pub const INFLUENCE_POINTS_PER_EVENT: f64 = 3.33;
    /// Weight of the activity factor in the overall influence
    pub const ACTIVITY_INFLUENCE_WEIGHT: f64 = 0.4;
    /// Weight of the consistency factor in the overall influence
    pub const CONSISTENCY_INFLUENCE_WEIGHT: f64 = 0.35;
    /// Weight of the caloric-balance factor in the overall influence
    pub const CALORIC_INFLUENCE_WEIGHT: f64 = 0.25;
    /// Trend multiplier at zero influence
    pub const MIN_TREND_MULTIPLIER: f64 = 0.7;
    /// Trend multiplier at full influence
    pub const MAX_TREND_MULTIPLIER: f64 = 1.3;
    /// Dampening applied when the trend contradicts the objective
    pub const CONTRADICTION_DAMPENING: f64 = 0.7;
    /// Weekly trends below this magnitude cannot be projected (kg/week)
    pub const MIN_PROJECTABLE_TREND: f64 = 0.01;
    /// Optimistic scenario trend multiplier
    pub const OPTIMISTIC_MULTIPLIER: f64 = 1.3;
    /// Pessimistic scenario trend multiplier
    pub const PESSIMISTIC_MULTIPLIER: f64 = 0.7;
    /// Confidence floor
    pub const MIN_CONFIDENCE: f64 = 20.0;
    /// Confidence ceiling
    pub const MAX_CONFIDENCE: f64 = 95.0;
    /// Data points that earn the full data share of confidence
    pub const CONFIDENCE_FULL_DATA_POINTS: f64 = 10.0;
    /// Lower bound of the physiologically sane trend range (kg/week)
    pub const SANE_TREND_MIN: f64 = 0.1;
    /// Upper bound of the physiologically sane trend range (kg/week)
    pub const SANE_TREND_MAX: f64 = 1.5;
    /// Days-to-target above which the objective should be reconsidered
    pub const LONG_HORIZON_DAYS: i64 = 365;
}

/// Universal level prediction factors
pub mod level_prediction {
    /// Trailing window for the XP rate (days)
    pub const RATE_WINDOW_DAYS: i64 = 30;
    /// Short trailing window reported alongside the rate (days)
    pub const RECENT_WINDOW_DAYS: i64 = 7;
    /// Projection horizons (days)
    pub const HORIZONS: [i64; 3] = [30, 60, 90];
    /// Conservative projection multiplier
    pub const CONSERVATIVE_MULTIPLIER: f64 = 0.8;
    /// Realistic projection multiplier
    pub const REALISTIC_MULTIPLIER: f64 = 1.0;
    /// Optimistic projection multiplier
    pub const OPTIMISTIC_MULTIPLIER: f64 = 1.2;
    /// Daily XP pace that makes the 30-day horizon primary
    pub const FAST_PACE_XP_PER_DAY: f64 = 100.0;
    /// Daily XP pace that makes the 60-day horizon primary
    pub const STEADY_PACE_XP_PER_DAY: f64 = 50.0;
}

/// Absence estimation defaults used when history is insufficient
pub mod estimation_defaults {
    /// Default calories consumed per day
    pub const CALORIES_IN: f64 = 2000.0;
    /// Default calories burned through logged activity per day
    pub const CALORIES_OUT: f64 = 300.0;
    /// Default protein per day (g)
    pub const PROTEIN_G: f64 = 100.0;
    /// Default carbohydrates per day (g)
    pub const CARBS_G: f64 = 250.0;
    /// Default fat per day (g)
    pub const FAT_G: f64 = 70.0;
    /// Default training sessions per week
    pub const TRAININGS_PER_WEEK: f64 = 3.0;
    /// Default meals per day
    pub const MEALS_PER_DAY: f64 = 3.0;
    /// Default XP per day
    pub const DAILY_XP: f64 = 50.0;
    /// Baseline daily energy expenditure used to convert intake into a balance
    pub const BASAL_EXPENDITURE: f64 = 1800.0;
}

/// Energy conversion
pub mod energy {
    /// Energy equivalent of one kilogram of body mass (kcal)
    pub const KCAL_PER_KG: f64 = 7700.0;
}

/// Action queue limits
pub mod action_queue {
    /// Maximum actions inserted per generation
    pub const MAX_NEW_ACTIONS: usize = 5;
    /// Below this many rule-generated actions the fallbacks run
    pub const MIN_RULE_ACTIONS: usize = 3;
}

/// Idempotency key prefixes for the XP award primitive
pub mod xp_sources {
    /// Reconciliation awards, suffixed with the absence id
    pub const ABSENCE_RECONCILIATION: &str = "absence_reconciliation";
    /// Logged activities, suffixed with the activity id
    pub const ACTIVITY: &str = "activity";

    /// XP for a logged meal
    pub const MEAL_XP: u64 = 10;
    /// XP for a training session
    pub const TRAINING_XP: u64 = 30;
    /// XP for a weight update
    pub const WEIGHT_UPDATE_XP: u64 = 15;
    /// XP for a body scan
    pub const BODY_SCAN_XP: u64 = 25;
    /// XP for a wearable sync
    pub const WEARABLE_XP: u64 = 5;
    /// XP for a completed fast
    pub const FASTING_XP: u64 = 20;
}
