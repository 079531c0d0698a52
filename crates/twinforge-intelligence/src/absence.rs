// ABOUTME: Absence tier classification and absence episode transitions
// ABOUTME: Pure state machine driven by hours since the latest activity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! Absence state machine
//!
//! Tiers: `none` -> `soft_reminder` (24h) -> `active` (48h, log opened) ->
//! `estimation` (72h) -> `max_reached` (7d) -> `hibernation` (14d).
//!
//! Episode rules for the open log:
//! - below the `active` tier nothing is opened and an open log is left alone
//!   until it is reconciled
//! - at or above `active` with no open log, a log is opened
//! - if the open log started before the latest activity, the user came back
//!   without reconciling and is absent again: the old log expires and a new
//!   one is opened
//! - otherwise the open log is extended

use crate::config::AbsenceConfig;
use chrono::{DateTime, Utc};
use twinforge_core::models::{AbsenceLog, AbsenceTier};
use uuid::Uuid;

/// What the detection pass must do with the user's absence log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsenceTransition {
    /// Nothing to write
    Idle,
    /// Open a new log
    Open {
        /// Whole days absent
        days_absent: u32,
    },
    /// Update the open log
    Extend {
        /// Open log
        log_id: Uuid,
        /// Whole days absent
        days_absent: u32,
    },
    /// Expire the stale open log, then open a new one
    Supersede {
        /// Log to expire
        expired_log_id: Uuid,
        /// Whole days absent in the new episode
        days_absent: u32,
    },
}

/// Absence tier classifier
pub struct AbsenceClassifier;

impl AbsenceClassifier {
    /// Tier for the time elapsed since the latest activity
    #[must_use]
    pub fn tier_for(
        last_activity: DateTime<Utc>,
        now: DateTime<Utc>,
        config: &AbsenceConfig,
    ) -> AbsenceTier {
        let elapsed_minutes = (now - last_activity).num_minutes();
        let at_least = |hours: i64| elapsed_minutes >= hours * 60;

        if at_least(config.hibernation_hours) {
            AbsenceTier::Hibernation
        } else if at_least(config.max_reached_hours) {
            AbsenceTier::MaxReached
        } else if at_least(config.estimation_hours) {
            AbsenceTier::Estimation
        } else if at_least(config.active_hours) {
            AbsenceTier::Active
        } else if at_least(config.soft_reminder_hours) {
            AbsenceTier::SoftReminder
        } else {
            AbsenceTier::None
        }
    }

    /// Whole days between the latest activity and `now`
    #[must_use]
    pub fn days_absent(last_activity: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
        u32::try_from((now - last_activity).num_days().max(0)).unwrap_or(u32::MAX)
    }

    /// Decide what happens to the open log for this check
    #[must_use]
    pub fn transition(
        tier: AbsenceTier,
        open_log: Option<&AbsenceLog>,
        last_activity: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AbsenceTransition {
        if !tier.requires_log() {
            return AbsenceTransition::Idle;
        }
        let days_absent = Self::days_absent(last_activity, now);

        match open_log {
            None => AbsenceTransition::Open { days_absent },
            Some(log) if log.absence_start_date < last_activity => AbsenceTransition::Supersede {
                expired_log_id: log.id,
                days_absent,
            },
            Some(log) => AbsenceTransition::Extend {
                log_id: log.id,
                days_absent,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn tier_after(minutes: i64) -> AbsenceTier {
        let now = Utc::now();
        AbsenceClassifier::tier_for(
            now - Duration::minutes(minutes),
            now,
            &AbsenceConfig::default(),
        )
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(tier_after(0), AbsenceTier::None);
        assert_eq!(tier_after(23 * 60 + 59), AbsenceTier::None);
        assert_eq!(tier_after(24 * 60), AbsenceTier::SoftReminder);
        assert_eq!(tier_after(47 * 60 + 59), AbsenceTier::SoftReminder);
        assert_eq!(tier_after(48 * 60 + 2), AbsenceTier::Active);
        assert_eq!(tier_after(72 * 60), AbsenceTier::Estimation);
        assert_eq!(tier_after(7 * 24 * 60), AbsenceTier::MaxReached);
        assert_eq!(tier_after(14 * 24 * 60), AbsenceTier::Hibernation);
    }

    #[test]
    fn test_transitions() {
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        let last_activity = now - Duration::days(4);

        assert_eq!(
            AbsenceClassifier::transition(AbsenceTier::SoftReminder, None, last_activity, now),
            AbsenceTransition::Idle
        );
        assert_eq!(
            AbsenceClassifier::transition(AbsenceTier::Estimation, None, last_activity, now),
            AbsenceTransition::Open { days_absent: 4 }
        );

        let same_episode = AbsenceLog::open(user_id, last_activity, 2);
        assert_eq!(
            AbsenceClassifier::transition(
                AbsenceTier::Estimation,
                Some(&same_episode),
                last_activity,
                now
            ),
            AbsenceTransition::Extend {
                log_id: same_episode.id,
                days_absent: 4
            }
        );

        let stale = AbsenceLog::open(user_id, now - Duration::days(20), 3);
        assert_eq!(
            AbsenceClassifier::transition(AbsenceTier::Estimation, Some(&stale), last_activity, now),
            AbsenceTransition::Supersede {
                expired_log_id: stale.id,
                days_absent: 4
            }
        );
    }
}
