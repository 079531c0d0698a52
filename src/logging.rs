// ABOUTME: Logging configuration and structured logging setup for the engagement engine
// ABOUTME: Configures log levels and formatters, plus domain event helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! Production-ready logging configuration with structured output

use crate::constants::service_names;
use anyhow::Result;
use serde_json::json;
use std::env;
use std::io;
use tracing::{info, warn, Level};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};
use twinforge_intelligence::anti_cheat::is_penalising_flag;
use uuid::Uuid;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Include thread information
    pub include_thread: bool,
    /// Include span information for tracing
    pub include_spans: bool,
    /// Service name for structured logging
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Environment (development, staging, production)
    pub environment: String,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` format for production logging
    Json,
    /// Pretty format for development
    Pretty,
    /// Compact format for space-constrained environments
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            include_location: false,
            include_thread: false,
            include_spans: false,
            service_name: service_names::TWINFORGE_ENGAGEMENT.into(),
            service_version: env!("CARGO_PKG_VERSION").to_owned(),
            environment: "development".into(),
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());

        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        // In production, use more detailed logging
        let is_production = environment == "production";

        Self {
            level,
            format,
            include_location: is_production || env::var("LOG_INCLUDE_LOCATION").is_ok(),
            include_thread: is_production || env::var("LOG_INCLUDE_THREAD").is_ok(),
            include_spans: is_production || env::var("LOG_INCLUDE_SPANS").is_ok(),
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| service_names::TWINFORGE_ENGAGEMENT.into()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_owned()),
            environment,
        }
    }

    /// Build the filter: `RUST_LOG` or the configured level, with noisy
    /// dependencies held back
    fn env_filter(&self) -> EnvFilter {
        let base = env::var("RUST_LOG").map_or_else(
            |_| EnvFilter::new(&self.level),
            |env_directive| EnvFilter::new(&env_directive),
        );

        let directives = [
            ("hyper=warn", Level::WARN),
            ("reqwest=warn", Level::WARN),
            ("sqlx=warn", Level::WARN),
            ("sqlx::query=warn", Level::WARN),
        ];
        let filter = directives
            .into_iter()
            .fold(base, |filter, (directive, fallback)| {
                filter.add_directive(directive.parse().unwrap_or_else(|_| fallback.into()))
            });

        filter.add_directive(
            format!("twinforge_engagement={}", self.level)
                .parse()
                .unwrap_or_else(|_| Level::INFO.into()),
        )
    }

    /// Initialize the global tracing subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber was already installed
    pub fn init(&self) -> Result<()> {
        let registry = tracing_subscriber::registry().with(self.env_filter());
        let span_events = if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        match self.format {
            LogFormat::Json => {
                let json_layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_thread_ids(self.include_thread)
                    .with_thread_names(self.include_thread)
                    .with_target(true)
                    .with_writer(io::stdout)
                    .with_span_events(span_events)
                    .json();

                registry.with(json_layer).try_init()?;
            }
            LogFormat::Pretty => {
                let pretty_layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_thread_ids(self.include_thread)
                    .with_thread_names(self.include_thread)
                    .with_target(true)
                    .with_writer(io::stdout)
                    .with_span_events(span_events);

                registry.with(pretty_layer).try_init()?;
            }
            LogFormat::Compact => {
                let compact_layer = fmt::layer()
                    .compact()
                    .with_file(false)
                    .with_line_number(false)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_target(false)
                    .with_writer(io::stdout)
                    .with_span_events(FmtSpan::NONE);

                registry.with(compact_layer).try_init()?;
            }
        }

        self.log_startup_info();
        Ok(())
    }

    /// Log structured startup information
    fn log_startup_info(&self) {
        info!(
            service.name = %self.service_name,
            service.version = %self.service_version,
            environment = %self.environment,
            log.level = %self.level,
            log.format = ?self.format,
            "TwinForge engagement engine starting up"
        );

        let config_summary = json!({
            "service": {
                "name": self.service_name,
                "version": self.service_version,
                "environment": self.environment
            },
            "logging": {
                "level": self.level,
                "format": format!("{:?}", self.format),
                "features": {
                    "location": self.include_location,
                    "thread": self.include_thread,
                    "spans": self.include_spans
                }
            }
        });

        info!("Configuration loaded: {config_summary}");
    }
}

/// Initialize logging from environment
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

/// Engagement-domain logging helpers
pub struct AppLogger;

impl AppLogger {
    /// Log an absence tier observation
    pub fn log_absence_detected(user_id: Uuid, tier: &str, hours_absent: i64, log_id: Option<Uuid>) {
        info!(
            user.id = %user_id,
            absence.tier = %tier,
            absence.hours = hours_absent,
            absence.id = ?log_id,
            "Absence detected"
        );
    }

    /// Log a reconciliation outcome
    pub fn log_reconciliation(
        user_id: Uuid,
        absence_id: Uuid,
        coherence_score: f64,
        xp_awarded: u64,
        success: bool,
    ) {
        info!(
            user.id = %user_id,
            absence.id = %absence_id,
            reconciliation.coherence = coherence_score,
            reconciliation.xp_awarded = xp_awarded,
            reconciliation.success = success,
            "Absence reconciliation"
        );
    }

    /// Log an XP award; replays are logged at the same level with `newly_awarded = false`
    pub fn log_xp_award(user_id: Uuid, source_key: &str, amount: u64, newly_awarded: bool) {
        info!(
            user.id = %user_id,
            xp.source_key = %source_key,
            xp.amount = amount,
            xp.newly_awarded = newly_awarded,
            "XP award"
        );
    }

    /// Log anti-cheat flags raised by a weight-change validation
    ///
    /// Warns only when a flag counts against the change; confirming flags log at info.
    pub fn log_anti_cheat_flags(user_id: Uuid, flags: &[String], adjusted_multiplier: f64) {
        if flags.is_empty() {
            return;
        }
        if flags.iter().any(|flag| is_penalising_flag(flag)) {
            warn!(
                user.id = %user_id,
                anti_cheat.flags = %flags.join(","),
                anti_cheat.multiplier = adjusted_multiplier,
                "Weight change flagged"
            );
        } else {
            info!(
                user.id = %user_id,
                anti_cheat.flags = %flags.join(","),
                anti_cheat.multiplier = adjusted_multiplier,
                "Weight change confirmed"
            );
        }
    }

    /// Log an action queue generation pass
    pub fn log_action_generation(user_id: Uuid, inserted: u64, expired_removed: u64, source: &str) {
        info!(
            user.id = %user_id,
            actions.inserted = inserted,
            actions.expired_removed = expired_removed,
            actions.source = %source,
            "Action queue generated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_pretty_info() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.service_name, service_names::TWINFORGE_ENGAGEMENT);
    }
}
