// ABOUTME: Dashboard action queue generation over the rule catalogue with generative and static fallbacks
// ABOUTME: Expired actions are cleaned first; titles of incomplete or dismissed actions are not reinserted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! # Action Queue
//!
//! One generation pass:
//! 1. delete the user's expired, incomplete actions
//! 2. evaluate the rule catalogue, rank by priority, drop titles of incomplete
//!    actions (dismissed ones included), take up to 5
//! 3. with fewer than 3 rule actions, ask the generative provider once
//! 4. if that yields nothing, add the static fallback items not already present
//! 5. insert everything chosen
//!
//! The storage index on incomplete `(user, title)` makes concurrent passes safe:
//! a losing insert is skipped rather than duplicated.

use super::scoring::ScoringService;
use super::snapshot::SnapshotService;
use crate::database_plugins::EngagementStore;
use crate::errors::AppResult;
use crate::external::{ActionSuggestionRequest, GenerativeContentProvider};
use crate::logging::AppLogger;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;
use twinforge_core::models::{ActionSource, DashboardAction};
use twinforge_intelligence::config::ActionQueueConfig;
use twinforge_intelligence::{
    default_catalogue, fallback_catalogue, select_rules, ActionContext, ActionRule,
    EngagementConfig,
};
use uuid::Uuid;

/// Outcome of one generation pass
#[derive(Debug, Clone, Serialize)]
pub struct ActionGeneration {
    /// Expired actions deleted before generating
    pub expired_removed: u64,
    /// Newly inserted rows
    pub inserted: u64,
    /// Whether the generative provider contributed actions
    pub used_generative: bool,
    /// Whether the static fallback list was used
    pub used_fallback: bool,
    /// Live actions after the pass, highest priority first
    pub live: Vec<DashboardAction>,
}

/// Dashboard action queue service
#[derive(Clone)]
pub struct ActionQueueService {
    store: Arc<dyn EngagementStore>,
    generative: Option<Arc<dyn GenerativeContentProvider>>,
    snapshots: SnapshotService,
    rules: Arc<[ActionRule]>,
    fallback: Arc<[ActionRule]>,
    limits: ActionQueueConfig,
}

impl ActionQueueService {
    /// Create a service with the built-in catalogue
    #[must_use]
    pub fn new(
        store: Arc<dyn EngagementStore>,
        generative: Option<Arc<dyn GenerativeContentProvider>>,
    ) -> Self {
        Self {
            snapshots: SnapshotService::new(Arc::clone(&store)),
            store,
            generative,
            rules: default_catalogue().into(),
            fallback: fallback_catalogue().into(),
            limits: EngagementConfig::global().action_queue.clone(),
        }
    }

    /// Replace the rule catalogue
    #[must_use]
    pub fn with_rules(mut self, rules: Vec<ActionRule>) -> Self {
        self.rules = rules.into();
        self
    }

    /// Run one generation pass for `user_id` at `now`
    ///
    /// # Errors
    ///
    /// Returns an error if cleanup, context loading, or insertion fails.
    /// Generative failures are absorbed.
    pub async fn generate_actions(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<ActionGeneration> {
        let expired_removed = self.store.delete_expired_actions(user_id, now).await?;

        let mut taken: HashSet<String> = self
            .store
            .list_open_action_titles(user_id, now)
            .await?
            .into_iter()
            .collect();

        let context = self.snapshots.engagement_context(user_id, now).await?;
        let report = ScoringService::score_context(user_id, &context, now);
        let snapshot = context.snapshot.clone().unwrap_or_default();
        let action_context = ActionContext {
            snapshot: &snapshot,
            objective: context.objective,
            scores: &report.scores,
            streak_days: context.streak_days,
            now,
        };

        let mut chosen: Vec<DashboardAction> =
            select_rules(&self.rules, &action_context, &taken, self.limits.max_new_actions)
                .into_iter()
                .map(|rule| rule.to_action(user_id, ActionSource::Rule, now))
                .collect();
        taken.extend(chosen.iter().map(|a| a.title.clone()));

        let mut used_generative = false;
        let mut used_fallback = false;
        if chosen.len() < self.limits.min_rule_actions {
            let request = ActionSuggestionRequest {
                user_id,
                objective: context.objective,
                scores: report.scores.clone(),
                existing_titles: taken.iter().cloned().collect(),
                max_actions: self.limits.max_new_actions.saturating_sub(chosen.len()),
            };
            let generated = self.generated_actions(&request, &taken, now).await;
            used_generative = !generated.is_empty();
            taken.extend(generated.iter().map(|a| a.title.clone()));
            chosen.extend(generated);

            if !used_generative {
                let fallback: Vec<DashboardAction> = self
                    .fallback
                    .iter()
                    .filter(|rule| !taken.contains(&rule.title))
                    .map(|rule| rule.to_action(user_id, ActionSource::Fallback, now))
                    .collect();
                used_fallback = !fallback.is_empty();
                chosen.extend(fallback);
            }
        }

        let inserted = if chosen.is_empty() {
            0
        } else {
            self.store.insert_actions(&chosen).await?
        };

        let source = match (used_generative, used_fallback) {
            (true, _) => "rules+generative",
            (false, true) => "rules+fallback",
            (false, false) => "rules",
        };
        AppLogger::log_action_generation(user_id, inserted, expired_removed, source);

        Ok(ActionGeneration {
            expired_removed,
            inserted,
            used_generative,
            used_fallback,
            live: self.store.list_live_actions(user_id, now).await?,
        })
    }

    /// One call to the generative provider; failures and repeats yield nothing
    async fn generated_actions(
        &self,
        request: &ActionSuggestionRequest,
        taken: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> Vec<DashboardAction> {
        let Some(provider) = &self.generative else {
            return Vec::new();
        };
        if request.max_actions == 0 {
            return Vec::new();
        }
        let user_id = request.user_id;

        match provider.generate_actions(request).await {
            Ok(generated) => {
                let mut seen = taken.clone();
                generated
                    .into_iter()
                    .filter(|action| seen.insert(action.title.clone()))
                    .take(request.max_actions)
                    .map(|action| action.to_action(user_id, now))
                    .collect()
            }
            Err(e) => {
                warn!(user.id = %user_id, "Generative action fallback failed: {e}");
                Vec::new()
            }
        }
    }

    /// Mark an action completed
    ///
    /// # Errors
    ///
    /// Returns an error if the store update fails
    pub async fn complete_action(
        &self,
        user_id: Uuid,
        action_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.store.complete_action(user_id, action_id, now).await
    }

    /// Dismiss an action
    ///
    /// # Errors
    ///
    /// Returns an error if the store update fails
    pub async fn dismiss_action(&self, user_id: Uuid, action_id: Uuid) -> AppResult<bool> {
        self.store.dismiss_action(user_id, action_id).await
    }

    /// Delete expired, incomplete actions without generating new ones
    ///
    /// # Errors
    ///
    /// Returns an error if the store delete fails
    pub async fn cleanup_expired_actions(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        self.store.delete_expired_actions(user_id, now).await
    }
}
