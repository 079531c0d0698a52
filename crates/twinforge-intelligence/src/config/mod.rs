// ABOUTME: Engagement engine configuration with env overrides and validation
// ABOUTME: Orchestrates absence, estimation, anti-cheat, reward, and action queue configs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! Engagement Configuration Module
//!
//! Tunable thresholds for the absence pipeline and the action queue. Fixed
//! formula content (scoring targets, level bands) lives in
//! `twinforge_core::constants`.
//!
//! Every field can be overridden through a `TWINFORGE_*` environment variable;
//! the result is validated before use.

pub mod absence;
pub mod anti_cheat;
pub mod error;
pub mod estimation;
pub mod rewards;

pub use absence::AbsenceConfig;
pub use anti_cheat::{
    AntiCheatConfig, CalorieCheckConfig, HistoryCheckConfig, MultiplierConfig,
    ObjectiveCheckConfig, RateLimits,
};
pub use error::ConfigError;
pub use estimation::{EstimationConfig, QualityThresholds, XpFractions};
pub use rewards::{ActionQueueConfig, RewardConfig};

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::warn;

/// Global configuration singleton
static ENGAGEMENT_CONFIG: OnceLock<EngagementConfig> = OnceLock::new();

/// Main engagement configuration container
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngagementConfig {
    /// Absence tier thresholds
    pub absence: AbsenceConfig,
    /// Activity estimation during absences
    pub estimation: EstimationConfig,
    /// Weight-change validation
    pub anti_cheat: AntiCheatConfig,
    /// Reconciliation rewards
    pub rewards: RewardConfig,
    /// Action queue limits
    pub action_queue: ActionQueueConfig,
}

impl EngagementConfig {
    /// Get the global configuration instance
    pub fn global() -> &'static Self {
        ENGAGEMENT_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                warn!("Failed to load engagement config: {}, using defaults", e);
                Self::default()
            })
        })
    }

    /// Load configuration from defaults and environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values or validation fails
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::default().apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error describing the first inconsistent setting
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_absence()?;
        self.validate_estimation()?;
        self.validate_anti_cheat()?;

        if self.action_queue.min_rule_actions > self.action_queue.max_new_actions {
            return Err(ConfigError::InvalidRange(
                "action_queue.min_rule_actions must be <= max_new_actions",
            ));
        }
        if !(0.0..=1.0).contains(&self.rewards.bonus_min_coherence) {
            return Err(ConfigError::ValueOutOfRange(
                "rewards.bonus_min_coherence must be within 0-1",
            ));
        }
        Ok(())
    }

    fn validate_absence(&self) -> Result<(), ConfigError> {
        let tiers = &self.absence;
        let ascending = [
            tiers.soft_reminder_hours,
            tiers.active_hours,
            tiers.estimation_hours,
            tiers.max_reached_hours,
            tiers.hibernation_hours,
        ];
        if tiers.soft_reminder_hours <= 0 {
            return Err(ConfigError::ValueOutOfRange(
                "absence.soft_reminder_hours must be positive",
            ));
        }
        if ascending.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::InvalidRange(
                "absence tier hours must be strictly ascending",
            ));
        }
        Ok(())
    }

    fn validate_estimation(&self) -> Result<(), ConfigError> {
        let est = &self.estimation;
        if est.variation_min <= 0.0 || est.variation_min > est.variation_max {
            return Err(ConfigError::InvalidRange(
                "estimation.variation_min must be positive and <= variation_max",
            ));
        }
        if est.max_estimated_days == 0 || est.baseline_window_days <= 0 {
            return Err(ConfigError::ValueOutOfRange(
                "estimation windows must be positive",
            ));
        }
        let quality = &est.quality_thresholds;
        if quality.fair_days >= quality.good_days || quality.good_days >= quality.excellent_days {
            return Err(ConfigError::InvalidRange(
                "estimation quality thresholds must be ascending",
            ));
        }
        let fractions = [
            est.xp_fractions.poor,
            est.xp_fractions.fair,
            est.xp_fractions.good,
            est.xp_fractions.excellent,
        ];
        if fractions.iter().any(|f| !(0.0..=1.0).contains(f)) {
            return Err(ConfigError::ValueOutOfRange(
                "estimation XP fractions must be within 0-1",
            ));
        }
        Ok(())
    }

    fn validate_anti_cheat(&self) -> Result<(), ConfigError> {
        let rate = &self.anti_cheat.rate;
        if rate.high_loss_kg_per_week >= rate.extreme_loss_kg_per_week
            || rate.high_gain_kg_per_week >= rate.extreme_gain_kg_per_week
        {
            return Err(ConfigError::InvalidRange(
                "anti_cheat high rate thresholds must be < extreme thresholds",
            ));
        }
        let multiplier = &self.anti_cheat.multiplier;
        if multiplier.min > multiplier.max || multiplier.min < 0.0 {
            return Err(ConfigError::InvalidRange(
                "anti_cheat multiplier min must be within 0 and max",
            ));
        }
        if self.anti_cheat.calories.small_discrepancy_kg
            >= self.anti_cheat.calories.large_discrepancy_kg
        {
            return Err(ConfigError::InvalidRange(
                "anti_cheat small calorie discrepancy must be < large discrepancy",
            ));
        }
        if self.anti_cheat.history.row_limit == 0 || self.anti_cheat.history.window_days <= 0 {
            return Err(ConfigError::ValueOutOfRange(
                "anti_cheat history bounds must be positive",
            ));
        }
        Ok(())
    }

    /// Helper function to parse and apply an environment variable override
    fn apply_env_var<T: FromStr>(env_var_name: &str, target: &mut T) -> Result<(), ConfigError> {
        if let Ok(val) = env::var(env_var_name) {
            *target = val
                .parse()
                .map_err(|_| ConfigError::Parse(format!("Invalid {env_var_name}")))?;
        }
        Ok(())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Absence tiers
        Self::apply_env_var(
            "TWINFORGE_ABSENCE_SOFT_REMINDER_HOURS",
            &mut self.absence.soft_reminder_hours,
        )?;
        Self::apply_env_var(
            "TWINFORGE_ABSENCE_ACTIVE_HOURS",
            &mut self.absence.active_hours,
        )?;
        Self::apply_env_var(
            "TWINFORGE_ABSENCE_ESTIMATION_HOURS",
            &mut self.absence.estimation_hours,
        )?;
        Self::apply_env_var(
            "TWINFORGE_ABSENCE_MAX_REACHED_HOURS",
            &mut self.absence.max_reached_hours,
        )?;
        Self::apply_env_var(
            "TWINFORGE_ABSENCE_HIBERNATION_HOURS",
            &mut self.absence.hibernation_hours,
        )?;

        // Estimation
        Self::apply_env_var(
            "TWINFORGE_ESTIMATION_MIN_ACTIVE_DAYS",
            &mut self.estimation.min_active_days,
        )?;
        Self::apply_env_var(
            "TWINFORGE_ESTIMATION_MAX_DAYS",
            &mut self.estimation.max_estimated_days,
        )?;

        // Anti-cheat
        Self::apply_env_var(
            "TWINFORGE_ANTI_CHEAT_EXTREME_LOSS_KG",
            &mut self.anti_cheat.rate.extreme_loss_kg_per_week,
        )?;
        Self::apply_env_var(
            "TWINFORGE_ANTI_CHEAT_EXTREME_GAIN_KG",
            &mut self.anti_cheat.rate.extreme_gain_kg_per_week,
        )?;
        Self::apply_env_var(
            "TWINFORGE_ANTI_CHEAT_HIGH_LOSS_KG",
            &mut self.anti_cheat.rate.high_loss_kg_per_week,
        )?;
        Self::apply_env_var(
            "TWINFORGE_ANTI_CHEAT_HIGH_GAIN_KG",
            &mut self.anti_cheat.rate.high_gain_kg_per_week,
        )?;
        Self::apply_env_var(
            "TWINFORGE_ANTI_CHEAT_HISTORY_DAYS",
            &mut self.anti_cheat.history.window_days,
        )?;
        Self::apply_env_var(
            "TWINFORGE_ANTI_CHEAT_HISTORY_ROWS",
            &mut self.anti_cheat.history.row_limit,
        )?;

        // Rewards and action queue
        Self::apply_env_var(
            "TWINFORGE_RECONCILIATION_BONUS_XP",
            &mut self.rewards.aligned_bonus_xp,
        )?;
        Self::apply_env_var(
            "TWINFORGE_ACTIONS_MAX_NEW",
            &mut self.action_queue.max_new_actions,
        )?;

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults_validate() {
        assert!(EngagementConfig::default().validate().is_ok());
    }

    #[test]
    fn test_tier_order_is_enforced() {
        let mut config = EngagementConfig::default();
        config.absence.estimation_hours = 40;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRange(_))
        ));
    }

    #[test]
    #[serial]
    fn test_env_override_applies() {
        env::set_var("TWINFORGE_RECONCILIATION_BONUS_XP", "75");
        let config = EngagementConfig::load();
        env::remove_var("TWINFORGE_RECONCILIATION_BONUS_XP");
        assert_eq!(config.unwrap().rewards.aligned_bonus_xp, 75);
    }

    #[test]
    #[serial]
    fn test_env_override_rejects_garbage() {
        env::set_var("TWINFORGE_ABSENCE_ACTIVE_HOURS", "two days");
        let config = EngagementConfig::load();
        env::remove_var("TWINFORGE_ABSENCE_ACTIVE_HOURS");
        assert!(matches!(config, Err(ConfigError::Parse(_))));
    }
}
