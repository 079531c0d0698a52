// ABOUTME: User-facing coaching messages produced after an absence reconciliation
// ABOUTME: Derived from the anti-cheat validation result, weight delta, and XP outcome
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use crate::anti_cheat::{
    FLAG_CALORIE_MISMATCH, FLAG_CONTRADICTS_OBJECTIVE, FLAG_EXCELLENT_MAINTENANCE,
    FLAG_EXTREME_GAIN, FLAG_EXTREME_LOSS, FLAG_HIGH_GAIN, FLAG_HIGH_LOSS,
    FLAG_NO_PREVIOUS_WEIGHT, FLAG_OPTIMAL_PROGRESS, FLAG_SHORT_ABSENCE_PATTERN,
};
use twinforge_core::models::ValidationResult;

/// Reconciliation facts the messages are built from
#[derive(Debug, Clone, Copy)]
pub struct CoachingContext<'a> {
    /// Validation outcome
    pub validation: &'a ValidationResult,
    /// Days the user was absent
    pub days_absent: u32,
    /// New weight minus previous weight, if a previous weight existed
    pub weight_delta: Option<f64>,
    /// XP awarded from estimated activity
    pub xp_awarded: u64,
    /// Flat bonus for aligned progress
    pub bonus_xp: u64,
}

/// Build the coaching messages shown after reconciliation
#[must_use]
pub fn coaching_messages(ctx: &CoachingContext<'_>) -> Vec<String> {
    let mut messages = vec![welcome_back(ctx.days_absent)];

    if let Some(delta) = ctx.weight_delta {
        messages.push(weight_summary(delta, ctx.days_absent));
    }

    let has = |flag: &str| ctx.validation.flags.iter().any(|f| f == flag);

    if has(FLAG_NO_PREVIOUS_WEIGHT) {
        messages.push(
            "This is your first recorded weight, so we will use it as your starting point."
                .to_owned(),
        );
    }
    if has(FLAG_EXTREME_LOSS) || has(FLAG_HIGH_LOSS) {
        messages.push(
            "That is a fast drop. Losing more than 1 kg per week can cost muscle, so keep protein high and recovery in check."
                .to_owned(),
        );
    }
    if has(FLAG_EXTREME_GAIN) || has(FLAG_HIGH_GAIN) {
        messages.push(
            "Weight moved up quickly. Day-to-day water and sodium swings are common, so weigh in again in a few days."
                .to_owned(),
        );
    }
    if has(FLAG_CONTRADICTS_OBJECTIVE) {
        messages.push(
            "This change runs against your current objective. Logging meals for a week is the quickest way to find out why."
                .to_owned(),
        );
    }
    if has(FLAG_OPTIMAL_PROGRESS) {
        messages.push("Your progress sits right in the optimal range for your objective.".to_owned());
    }
    if has(FLAG_EXCELLENT_MAINTENANCE) {
        messages.push("Excellent maintenance: your weight held steady while you were away.".to_owned());
    }
    if has(FLAG_CALORIE_MISMATCH) {
        messages.push(
            "Your weight change does not match your usual intake. Logging meals as you go keeps estimates accurate."
                .to_owned(),
        );
    }
    if has(FLAG_SHORT_ABSENCE_PATTERN) {
        messages.push(
            "Short breaks are adding up. Even a quick daily log keeps your streak and your scores alive."
                .to_owned(),
        );
    }

    messages.push(xp_summary(ctx));
    messages
}

fn welcome_back(days_absent: u32) -> String {
    match days_absent {
        0 | 1 => "Welcome back!".to_owned(),
        2..=6 => format!("Welcome back after {days_absent} days!"),
        _ => format!("Welcome back! {days_absent} days away is a long break, let's rebuild momentum."),
    }
}

fn weight_summary(delta: f64, days_absent: u32) -> String {
    let days = days_absent.max(1);
    if delta.abs() < 0.1 {
        format!("Your weight is unchanged over {days} days.")
    } else if delta < 0.0 {
        format!("You lost {:.1} kg over {days} days.", delta.abs())
    } else {
        format!("You gained {delta:.1} kg over {days} days.")
    }
}

fn xp_summary(ctx: &CoachingContext<'_>) -> String {
    let total = ctx.xp_awarded.saturating_add(ctx.bonus_xp);
    if total == 0 {
        return "No XP was estimated for this break. Log today to start earning again.".to_owned();
    }
    if ctx.bonus_xp > 0 {
        format!(
            "You earned {} XP for estimated activity plus a {} XP bonus for staying on track.",
            ctx.xp_awarded, ctx.bonus_xp
        )
    } else if ctx.validation.is_realistic {
        format!("You earned {total} XP for your estimated activity.")
    } else {
        format!(
            "You earned {total} XP. The award was reduced because this change looks unusual; regular logging restores full credit."
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation(flags: &[&str], is_realistic: bool) -> ValidationResult {
        ValidationResult {
            is_realistic,
            coherence_score: if is_realistic { 0.9 } else { 0.3 },
            flags: flags.iter().map(|f| (*f).to_owned()).collect(),
            adjusted_multiplier: 0.8,
            objective_aligned: false,
            weekly_rate_kg: 0.5,
        }
    }

    #[test]
    fn test_messages_reflect_flags() {
        let result = validation(&[FLAG_EXTREME_LOSS, FLAG_CONTRADICTS_OBJECTIVE], false);
        let messages = coaching_messages(&CoachingContext {
            validation: &result,
            days_absent: 7,
            weight_delta: Some(-10.0),
            xp_awarded: 120,
            bonus_xp: 0,
        });
        assert!(messages[0].starts_with("Welcome back!"));
        assert!(messages.iter().any(|m| m.contains("lost 10.0 kg")));
        assert!(messages.iter().any(|m| m.contains("fast drop")));
        assert!(messages.iter().any(|m| m.contains("against your current objective")));
        assert!(messages.last().unwrap().contains("reduced"));
    }

    #[test]
    fn test_bonus_is_mentioned() {
        let result = validation(&[FLAG_OPTIMAL_PROGRESS], true);
        let messages = coaching_messages(&CoachingContext {
            validation: &result,
            days_absent: 3,
            weight_delta: Some(-0.4),
            xp_awarded: 200,
            bonus_xp: 50,
        });
        assert_eq!(messages[0], "Welcome back after 3 days!");
        assert!(messages.last().unwrap().contains("50 XP bonus"));
    }
}
