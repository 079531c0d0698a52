// ABOUTME: Engine wiring one store and optional generative provider into every engagement service
// ABOUTME: Built from ServerConfig for the CLI or from explicit parts for tests and embedding
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use super::absence_detection::AbsenceDetectionService;
use super::action_queue::ActionQueueService;
use super::activity::ActivityService;
use super::level::LevelPredictionService;
use super::prediction::TransformationPredictionService;
use super::reconciliation::ReconciliationService;
use super::scoring::ScoringService;
use super::snapshot::SnapshotService;
use crate::config::ServerConfig;
use crate::database_plugins::sqlite::SqliteEngagementStore;
use crate::database_plugins::EngagementStore;
use crate::errors::AppResult;
use crate::external::{GenerativeClient, GenerativeContentProvider};
use std::sync::Arc;
use tracing::info;

/// Every engagement service over one shared store
///
/// Services are cheap to clone; they share the store and provider through `Arc`.
#[derive(Clone)]
pub struct EngagementEngine {
    store: Arc<dyn EngagementStore>,
    /// Activity logging
    pub activity: ActivityService,
    /// Snapshot and streak assembly
    pub snapshots: SnapshotService,
    /// Adaptive scores
    pub scoring: ScoringService,
    /// Transformation predictions
    pub predictions: TransformationPredictionService,
    /// Level predictions
    pub levels: LevelPredictionService,
    /// Dashboard action queue
    pub actions: ActionQueueService,
    /// Absence detection and estimation
    pub absences: AbsenceDetectionService,
    /// Absence reconciliation
    pub reconciliation: ReconciliationService,
}

impl EngagementEngine {
    /// Wire the services over `store`
    #[must_use]
    pub fn new(
        store: Arc<dyn EngagementStore>,
        generative: Option<Arc<dyn GenerativeContentProvider>>,
        estimation_seed: Option<u64>,
    ) -> Self {
        let absences = AbsenceDetectionService::new(Arc::clone(&store), estimation_seed);
        Self {
            activity: ActivityService::new(Arc::clone(&store)),
            snapshots: SnapshotService::new(Arc::clone(&store)),
            scoring: ScoringService::new(Arc::clone(&store)),
            predictions: TransformationPredictionService::new(Arc::clone(&store)),
            levels: LevelPredictionService::new(Arc::clone(&store)),
            actions: ActionQueueService::new(Arc::clone(&store), generative.clone()),
            reconciliation: ReconciliationService::new(
                Arc::clone(&store),
                generative,
                absences.clone(),
            ),
            absences,
            store,
        }
    }

    /// Connect to the configured database and generative endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated, or the
    /// HTTP client cannot be built
    pub async fn from_config(config: &ServerConfig) -> AppResult<Self> {
        let store = SqliteEngagementStore::new(&config.database_url).await?;
        let generative = match &config.generative {
            Some(generative) => {
                let client = GenerativeClient::new(generative.clone())?;
                Some(Arc::new(client) as Arc<dyn GenerativeContentProvider>)
            }
            None => None,
        };

        info!(
            generative.enabled = generative.is_some(),
            estimation.seeded = config.estimation_seed.is_some(),
            "Engagement engine ready"
        );
        Ok(Self::new(Arc::new(store), generative, config.estimation_seed))
    }

    /// The shared store
    #[must_use]
    pub fn store(&self) -> Arc<dyn EngagementStore> {
        Arc::clone(&self.store)
    }
}
