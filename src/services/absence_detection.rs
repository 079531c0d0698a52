// ABOUTME: Absence detection: classifies inactivity, maintains the episode log, and estimates absent days
// ABOUTME: One active log per user is a storage constraint; estimates append pending XP rewards per day
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! # Absence Detection
//!
//! A check classifies the time since the user's latest activity into a tier.
//! From the `active` tier on, the user has exactly one open [`AbsenceLog`]:
//! the first crossing opens it, later checks extend it, and a log that
//! predates the latest activity (the user came back and left again without
//! reconciling) is expired and replaced. Two concurrent checks can both try
//! to open the log; the storage constraint rejects the second insert and that
//! check continues with the winner's row.
//!
//! From the `estimation` tier on, every day not yet estimated gets a
//! [`DailyEstimate`] and a [`PendingXpReward`]. Estimates already stored are
//! never regenerated, so the random variation of a day is fixed once drawn.

use crate::database_plugins::EngagementStore;
use crate::errors::AppResult;
use crate::logging::AppLogger;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};
use twinforge_core::models::{AbsenceLog, AbsenceStatus, AbsenceTier, PendingXpReward};
use twinforge_intelligence::{
    estimation_rng, AbsenceClassifier, AbsenceTransition, ActivityEstimator, EngagementConfig,
};
use uuid::Uuid;

/// Result of one absence check
#[derive(Debug, Clone, Serialize)]
pub struct AbsenceCheck {
    /// Owner
    pub user_id: Uuid,
    /// Tier at the time of the check
    pub tier: AbsenceTier,
    /// Latest activity of any kind
    pub last_activity: Option<DateTime<Utc>>,
    /// Whole hours since the latest activity
    pub hours_absent: Option<i64>,
    /// The open log after the check
    pub log: Option<AbsenceLog>,
    /// Whether this check opened the log
    pub log_created: bool,
    /// Log expired because a newer episode started
    pub superseded_log_id: Option<Uuid>,
    /// Days estimated by this check
    pub days_estimated: u32,
    /// Pending rewards created by this check
    pub rewards_created: u64,
}

impl AbsenceCheck {
    fn quiet(
        user_id: Uuid,
        tier: AbsenceTier,
        last_activity: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            tier,
            last_activity,
            hours_absent: last_activity.map(|last| (now - last).num_hours()),
            log: None,
            log_created: false,
            superseded_log_id: None,
            days_estimated: 0,
            rewards_created: 0,
        }
    }
}

/// Absence detection and estimation service
#[derive(Clone)]
pub struct AbsenceDetectionService {
    store: Arc<dyn EngagementStore>,
    estimation_seed: Option<u64>,
}

impl AbsenceDetectionService {
    /// Create a detection service; `estimation_seed` fixes the per-day variation
    #[must_use]
    pub fn new(store: Arc<dyn EngagementStore>, estimation_seed: Option<u64>) -> Self {
        Self {
            store,
            estimation_seed,
        }
    }

    /// Classify the user's inactivity at `now` and update the episode log
    ///
    /// Users who never logged anything are not considered absent.
    ///
    /// # Errors
    ///
    /// Returns an error if a store read or write fails
    pub async fn check_absence(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<AbsenceCheck> {
        let config = EngagementConfig::global();
        let Some(last_activity) = self.store.latest_activity_at(user_id).await? else {
            return Ok(AbsenceCheck::quiet(user_id, AbsenceTier::None, None, now));
        };

        let tier = AbsenceClassifier::tier_for(last_activity, now, &config.absence);
        let open_log = self.store.get_open_absence(user_id).await?;
        let transition = AbsenceClassifier::transition(tier, open_log.as_ref(), last_activity, now);

        let mut check = AbsenceCheck::quiet(user_id, tier, Some(last_activity), now);
        let (log_id, days_absent) = match transition {
            AbsenceTransition::Idle => {
                debug!(user.id = %user_id, absence.tier = tier.as_str(), "No absence log needed");
                return Ok(check);
            }
            AbsenceTransition::Open { days_absent } => {
                let (id, created) = self
                    .open_log(user_id, last_activity, days_absent, now)
                    .await?;
                check.log_created = created;
                (id, days_absent)
            }
            AbsenceTransition::Extend {
                log_id,
                days_absent,
            } => {
                self.store
                    .update_absence_progress(log_id, days_absent, None, now)
                    .await?;
                (log_id, days_absent)
            }
            AbsenceTransition::Supersede {
                expired_log_id,
                days_absent,
            } => {
                self.store
                    .transition_absence(
                        expired_log_id,
                        AbsenceStatus::Active,
                        AbsenceStatus::Expired,
                        now,
                    )
                    .await?;
                check.superseded_log_id = Some(expired_log_id);
                let (id, created) = self
                    .open_log(user_id, last_activity, days_absent, now)
                    .await?;
                check.log_created = created;
                (id, days_absent)
            }
        };

        if tier.estimates_activity() {
            if let Some(log) = self.store.get_absence_log(log_id).await? {
                let (days, rewards) = self.estimate_absent_days(&log, days_absent, now).await?;
                check.days_estimated = days;
                check.rewards_created = rewards;
            }
        }

        check.log = self.store.get_absence_log(log_id).await?;
        AppLogger::log_absence_detected(
            user_id,
            tier.as_str(),
            check.hours_absent.unwrap_or(0),
            Some(log_id),
        );
        Ok(check)
    }

    /// Bring the user's open absence up to date at `now`, ahead of reconciling it
    ///
    /// Runs a detection pass first, which extends the log and tops up its
    /// estimates. A user who already logged something since the absence began
    /// is below the `active` tier, so the pass leaves the log alone; its length
    /// then runs from the absence start to that latest activity.
    ///
    /// # Errors
    ///
    /// Returns an error if a store read or write fails
    pub async fn refresh_open_absence(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AbsenceLog>> {
        let check = self.check_absence(user_id, now).await?;
        if check.log.is_some() {
            return Ok(check.log);
        }

        let Some(log) = self.store.get_open_absence(user_id).await? else {
            return Ok(None);
        };
        let Some(last_activity) = check.last_activity else {
            return Ok(Some(log));
        };
        let days_absent = AbsenceClassifier::days_absent(log.absence_start_date, last_activity);
        if days_absent <= log.days_absent {
            return Ok(Some(log));
        }

        self.store
            .update_absence_progress(log.id, days_absent, None, now)
            .await?;
        debug!(
            user.id = %user_id,
            absence.id = %log.id,
            absence.days = days_absent,
            "Absence length closed at the user's return"
        );
        self.store.get_absence_log(log.id).await
    }

    /// Insert a new open log; when another writer won the race, continue with its log
    ///
    /// Returns the log id and whether this call created it.
    async fn open_log(
        &self,
        user_id: Uuid,
        absence_start: DateTime<Utc>,
        days_absent: u32,
        now: DateTime<Utc>,
    ) -> AppResult<(Uuid, bool)> {
        let mut log = AbsenceLog::open(user_id, absence_start, days_absent);
        log.created_at = now;
        log.updated_at = now;

        match self.store.insert_absence_log(&log).await {
            Ok(()) => Ok((log.id, true)),
            Err(e) if e.is_already_exists() => {
                debug!(user.id = %user_id, "Absence log opened concurrently, reusing it");
                let Some(existing) = self.store.get_open_absence(user_id).await? else {
                    return Err(e);
                };
                self.store
                    .update_absence_progress(existing.id, days_absent, None, now)
                    .await?;
                Ok((existing.id, false))
            }
            Err(e) => Err(e),
        }
    }

    /// Estimate the days of `log` not yet estimated and create their pending rewards
    ///
    /// Rewards are written before the estimate blob so a failure in between
    /// leaves days that the next check estimates again; reward rows are unique
    /// per `(absence, day)`.
    async fn estimate_absent_days(
        &self,
        log: &AbsenceLog,
        days_absent: u32,
        now: DateTime<Utc>,
    ) -> AppResult<(u32, u64)> {
        let config = &EngagementConfig::global().estimation;
        let baseline = match &log.estimated_activity {
            Some(existing) => existing.baseline.clone(),
            None => {
                let anchor = log.absence_start_date;
                let since = anchor - Duration::days(config.baseline_window_days);
                let (records, xp_events) = tokio::try_join!(
                    self.store.list_activities(log.user_id, since, &[]),
                    self.store.list_xp_events(log.user_id, since),
                )?;
                ActivityEstimator::baseline(&records, &xp_events, anchor, config)
            }
        };

        let already = log
            .estimated_activity
            .as_ref()
            .map_or(0, |e| e.estimated_day_count());
        let mut rng = estimation_rng(self.episode_seed(log.id, already));
        let (estimated, added) = ActivityEstimator::estimate(
            log.estimated_activity.clone(),
            baseline,
            log.absence_start_date,
            days_absent,
            now,
            &mut rng,
            config,
        );
        if added.is_empty() {
            return Ok((0, 0));
        }

        let rewards: Vec<PendingXpReward> = added
            .iter()
            .map(|day| {
                ActivityEstimator::pending_reward(
                    log.user_id,
                    log.id,
                    day,
                    estimated.xp_fraction,
                    now,
                )
            })
            .collect();
        let created = self.store.insert_pending_rewards(&rewards).await?;

        let stored = self
            .store
            .update_absence_progress(log.id, days_absent, Some(&estimated), now)
            .await?;
        if !stored {
            warn!(
                user.id = %log.user_id,
                absence.id = %log.id,
                "Absence log closed while estimating; estimate not stored"
            );
        }

        debug!(
            user.id = %log.user_id,
            absence.id = %log.id,
            estimation.days = added.len(),
            estimation.quality = estimated.data_quality.as_str(),
            "Absent days estimated"
        );
        Ok((u32::try_from(added.len()).unwrap_or(u32::MAX), created))
    }

    /// Seed for one estimation pass: fixed per episode and per starting day
    /// when a seed is configured, entropy otherwise
    fn episode_seed(&self, log_id: Uuid, already_estimated: u32) -> Option<u64> {
        self.estimation_seed
            .map(|seed| seed ^ (log_id.as_u128() as u64) ^ u64::from(already_estimated))
    }

    /// Record that a reminder was sent for the user's open absence
    ///
    /// Returns false when the user has no open absence.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read or write fails
    pub async fn record_reminder(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        let Some(log) = self.store.get_open_absence(user_id).await? else {
            return Ok(false);
        };
        self.store.record_reminder_sent(log.id, now).await?;
        Ok(true)
    }
}
