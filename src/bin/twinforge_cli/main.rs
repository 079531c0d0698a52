// ABOUTME: TwinForge CLI - operator tool for the engagement engine over a SQLite database
// ABOUTME: Computes scores and predictions, runs the action queue, and drives absence reconciliation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors
//!
//! Usage:
//! ```bash
//! # Adaptive scores for a user
//! twinforge-cli scores --user 7f0c...
//!
//! # Record a weight entry
//! twinforge-cli log-weight --user 7f0c... --kg 82.4
//!
//! # Generate the dashboard action queue
//! twinforge-cli actions generate --user 7f0c...
//!
//! # Run an absence check as of a given instant
//! twinforge-cli absence check --user 7f0c... --now 2025-03-14T08:00:00Z
//!
//! # Reconcile an absence with the weight entered on return
//! twinforge-cli reconcile --user 7f0c... --weight 81.2
//! ```

mod commands;
mod helpers;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::debug;
use twinforge_core::models::ObjectiveType;
use twinforge_engagement::config::ServerConfig;
use twinforge_engagement::constants::service_names;
use twinforge_engagement::logging::LogFormat;
use twinforge_engagement::services::EngagementEngine;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "twinforge-cli",
    about = "TwinForge Engagement Engine CLI",
    long_about = "Operator tool for scoring, predictions, the dashboard action queue, and absence reconciliation."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Database URL override
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Evaluate as of this instant (RFC 3339) instead of the current time
    #[arg(long, global = true)]
    now: Option<DateTime<Utc>>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Compute adaptive scores
    Scores {
        /// User id
        #[arg(long)]
        user: Uuid,
    },

    /// Generate and store a transformation prediction
    Predict {
        /// User id
        #[arg(long)]
        user: Uuid,
    },

    /// Project levels over the next 30 to 90 days
    Level {
        /// User id
        #[arg(long)]
        user: Uuid,
    },

    /// Dashboard action queue
    Actions {
        #[command(subcommand)]
        action: ActionsCommand,
    },

    /// Absence detection
    Absence {
        #[command(subcommand)]
        action: AbsenceCommand,
    },

    /// Reconcile the open absence with a weight entered on return
    Reconcile {
        /// User id
        #[arg(long)]
        user: Uuid,

        /// Weight in kg
        #[arg(long)]
        weight: f64,
    },

    /// Re-drive interrupted reconciliations
    ResumeReconciliations {
        /// User id
        #[arg(long)]
        user: Uuid,
    },

    /// Delete expired dashboard actions
    Cleanup {
        /// User id
        #[arg(long)]
        user: Uuid,
    },

    /// Record a weight entry (awards XP and updates the profile weight)
    LogWeight {
        /// User id
        #[arg(long)]
        user: Uuid,

        /// Weight in kg
        #[arg(long)]
        kg: f64,
    },

    /// Set the active objective
    SetObjective {
        /// User id
        #[arg(long)]
        user: Uuid,

        /// Objective (`fat_loss`, `muscle_gain`, `endurance`, `strength`,
        /// `health_optimization`, `body_recomposition`)
        #[arg(long)]
        objective: ObjectiveType,

        /// Target weight in kg
        #[arg(long)]
        target_kg: Option<f64>,
    },
}

#[non_exhaustive]
#[derive(Subcommand)]
enum ActionsCommand {
    /// Run one generation pass and list the live actions
    Generate {
        /// User id
        #[arg(long)]
        user: Uuid,
    },

    /// Mark an action completed
    Complete {
        /// User id
        #[arg(long)]
        user: Uuid,

        /// Action id
        #[arg(long)]
        action: Uuid,
    },

    /// Dismiss an action
    Dismiss {
        /// User id
        #[arg(long)]
        user: Uuid,

        /// Action id
        #[arg(long)]
        action: Uuid,
    },
}

#[non_exhaustive]
#[derive(Subcommand)]
enum AbsenceCommand {
    /// Classify inactivity and update the absence log
    Check {
        /// User id
        #[arg(long)]
        user: Uuid,
    },

    /// Count a reminder sent for the open absence
    Remind {
        /// User id
        #[arg(long)]
        user: Uuid,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(database_url) = cli.database_url {
        config.database_url = database_url;
    }
    config.logging.level = if cli.verbose { "debug" } else { "warn" }.to_owned();
    config.logging.format = LogFormat::Compact;
    config.logging.service_name = service_names::TWINFORGE_CLI.to_owned();
    config.logging.init()?;
    debug!("{}", config.summary());

    let engine = EngagementEngine::from_config(&config).await?;
    let now = cli.now.unwrap_or_else(Utc::now);

    match cli.command {
        Command::Scores { user } => commands::engagement::scores(&engine, user, now).await?,
        Command::Predict { user } => commands::engagement::predict(&engine, user, now).await?,
        Command::Level { user } => commands::engagement::level(&engine, user, now).await?,
        Command::Actions { action } => match action {
            ActionsCommand::Generate { user } => {
                commands::engagement::generate_actions(&engine, user, now).await?;
            }
            ActionsCommand::Complete { user, action } => {
                commands::engagement::complete_action(&engine, user, action, now).await?;
            }
            ActionsCommand::Dismiss { user, action } => {
                commands::engagement::dismiss_action(&engine, user, action).await?;
            }
        },
        Command::Cleanup { user } => commands::engagement::cleanup(&engine, user, now).await?,
        Command::LogWeight { user, kg } => {
            commands::engagement::log_weight(&engine, user, kg, now).await?;
        }
        Command::SetObjective {
            user,
            objective,
            target_kg,
        } => {
            commands::engagement::set_objective(&engine, user, objective, target_kg, now).await?;
        }
        Command::Absence { action } => match action {
            AbsenceCommand::Check { user } => commands::absence::check(&engine, user, now).await?,
            AbsenceCommand::Remind { user } => {
                commands::absence::remind(&engine, user, now).await?;
            }
        },
        Command::Reconcile { user, weight } => {
            commands::absence::reconcile(&engine, user, weight, now).await?;
        }
        Command::ResumeReconciliations { user } => {
            commands::absence::resume(&engine, user, now).await?;
        }
    }

    Ok(())
}
