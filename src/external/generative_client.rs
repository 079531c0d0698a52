// ABOUTME: Generative content endpoint client for coaching insights and suggested actions
// ABOUTME: Bearer-authenticated JSON over reqwest with a per-request timeout
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! Generative Content Client
//!
//! Two endpoints are used:
//! - `POST {base_url}/analysis` returns `{"response": "<text>"}`
//! - `POST {base_url}/actions` returns `{"actions": [...]}`
//!
//! Callers treat every failure as absorbable: an insight is optional and the
//! action queue has a static fallback.

use crate::config::GenerativeConfig;
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use twinforge_core::models::{
    ActionCategory, ActionSource, ActionType, AdaptiveScores, DashboardAction, ImpactLevel,
    ObjectiveType,
};
use uuid::Uuid;

const SERVICE_NAME: &str = "generative content";

/// Hours a generated action stays live
const GENERATED_ACTION_TTL_HOURS: i64 = 48;

/// Free-text analysis request
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest {
    /// User the analysis is for
    pub user_id: Uuid,
    /// What to analyse, e.g. `absence_reconciliation`
    pub topic: String,
    /// Structured facts the text is based on
    pub context: Value,
}

/// Request for suggested dashboard actions
#[derive(Debug, Clone, Serialize)]
pub struct ActionSuggestionRequest {
    /// User the actions are for
    pub user_id: Uuid,
    /// Active objective, if any
    pub objective: Option<ObjectiveType>,
    /// Current adaptive scores
    pub scores: AdaptiveScores,
    /// Titles already live or already chosen, to avoid repeats
    pub existing_titles: Vec<String>,
    /// Maximum number of actions wanted
    pub max_actions: usize,
}

/// Action as returned by the endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedAction {
    /// Title
    pub title: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Area
    pub category: ActionCategory,
    /// Kind
    #[serde(default = "default_action_type")]
    pub action_type: ActionType,
    /// Ranking score
    #[serde(default = "default_priority")]
    pub priority: u32,
    /// Expected effect
    #[serde(default = "default_impact")]
    pub impact: ImpactLevel,
    /// Token cost
    #[serde(default)]
    pub tokens_required: u32,
}

const fn default_action_type() -> ActionType {
    ActionType::QuickWin
}

const fn default_priority() -> u32 {
    50
}

const fn default_impact() -> ImpactLevel {
    ImpactLevel::Medium
}

impl GeneratedAction {
    /// Materialize as a dashboard action
    #[must_use]
    pub fn to_action(&self, user_id: Uuid, now: DateTime<Utc>) -> DashboardAction {
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
            expires_at: now + Duration::hours(GENERATED_ACTION_TTL_HOURS),
            is_completed: false,
            is_dismissed: false,
            completed_at: None,
            source: ActionSource::Generative,
            created_at: now,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnalysisResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct ActionsResponse {
    actions: Vec<GeneratedAction>,
}

/// Source of generated coaching text and action suggestions
#[async_trait]
pub trait GenerativeContentProvider: Send + Sync {
    /// Free-text analysis
    async fn generate_analysis(&self, request: &AnalysisRequest) -> AppResult<String>;

    /// Suggested dashboard actions
    async fn generate_actions(
        &self,
        request: &ActionSuggestionRequest,
    ) -> AppResult<Vec<GeneratedAction>>;
}

/// HTTP implementation of the generative content provider
pub struct GenerativeClient {
    config: GenerativeConfig,
    http_client: Client,
}

impl GenerativeClient {
    /// Create a client with the configured timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: GenerativeConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::external_service(SERVICE_NAME, e.to_string()))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    async fn post<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<R> {
        let url = format!("{}/{path}", self.config.base_url);
        let mut request = self.http_client.post(&url).json(body);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::external_service(SERVICE_NAME, e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::external_service(
                SERVICE_NAME,
                format!(
                    "HTTP {}: {}",
                    response.status(),
                    response.text().await.unwrap_or_default()
                ),
            ));
        }

        response.json().await.map_err(|e| {
            AppError::external_service(SERVICE_NAME, format!("JSON parse error: {e}"))
        })
    }
}

#[async_trait]
impl GenerativeContentProvider for GenerativeClient {
    async fn generate_analysis(&self, request: &AnalysisRequest) -> AppResult<String> {
        let response: AnalysisResponse = self.post("analysis", request).await?;
        let text = response.response.trim();
        if text.is_empty() {
            return Err(AppError::external_service(SERVICE_NAME, "Empty analysis"));
        }
        Ok(text.to_owned())
    }

    async fn generate_actions(
        &self,
        request: &ActionSuggestionRequest,
    ) -> AppResult<Vec<GeneratedAction>> {
        let response: ActionsResponse = self.post("actions", request).await?;
        Ok(response
            .actions
            .into_iter()
            .filter(|action| !action.title.trim().is_empty())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generated_action_defaults_fill_missing_fields() {
        let action: GeneratedAction =
            serde_json::from_value(json!({"title": "Stretch", "category": "training"})).unwrap();
        assert_eq!(action.action_type, ActionType::QuickWin);
        assert_eq!(action.priority, 50);
        assert_eq!(action.impact, ImpactLevel::Medium);

        let now = Utc::now();
        let dashboard = action.to_action(Uuid::new_v4(), now);
        assert_eq!(dashboard.source, ActionSource::Generative);
        assert_eq!(dashboard.expires_at, now + Duration::hours(48));
    }

    #[test]
    fn test_actions_response_parses_list() {
        let parsed: ActionsResponse = serde_json::from_value(json!({
            "actions": [
                {"title": "Log breakfast", "category": "nutrition", "priority": 70, "impact": "high"}
            ]
        }))
        .unwrap();
        assert_eq!(parsed.actions.len(), 1);
        assert_eq!(parsed.actions[0].impact, ImpactLevel::High);
    }
}
