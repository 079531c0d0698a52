// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Reads database, generative endpoint, and estimation settings from the environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

//! Environment-based configuration management

use crate::constants::{defaults, env_vars};
use crate::logging::LoggingConfig;
use anyhow::{anyhow, Result};
use std::env;
use std::time::Duration;
use tracing::{info, warn};
use twinforge_intelligence::EngagementConfig;

/// Generative content endpoint settings
#[derive(Debug, Clone)]
pub struct GenerativeConfig {
    /// Base URL; `/analysis` and `/actions` are appended
    pub base_url: String,
    /// Bearer token sent with every request
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// SQLite connection URL
    pub database_url: String,
    /// Generative endpoint; `None` disables generative content
    pub generative: Option<GenerativeConfig>,
    /// Fixed seed for activity estimation; entropy when absent
    pub estimation_seed: Option<u64>,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable does not parse or validation fails
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {e}");
        }

        let generative = match env::var(env_vars::GENERATIVE_BASE_URL) {
            Ok(base_url) if !base_url.trim().is_empty() => {
                let timeout_secs = env_var_or(
                    env_vars::GENERATIVE_TIMEOUT_SECS,
                    &defaults::GENERATIVE_TIMEOUT_SECS.to_string(),
                )
                .parse::<u64>()
                .map_err(|e| anyhow!("Invalid {}: {e}", env_vars::GENERATIVE_TIMEOUT_SECS))?;
                Some(GenerativeConfig {
                    base_url: base_url.trim_end_matches('/').to_owned(),
                    token: env::var(env_vars::GENERATIVE_TOKEN).ok(),
                    timeout: Duration::from_secs(timeout_secs),
                })
            }
            _ => None,
        };

        let estimation_seed = env::var(env_vars::ESTIMATION_SEED)
            .ok()
            .map(|raw| {
                raw.parse::<u64>()
                    .map_err(|e| anyhow!("Invalid {}: {e}", env_vars::ESTIMATION_SEED))
            })
            .transpose()?;

        let config = Self {
            database_url: env_var_or(env_vars::DATABASE_URL, defaults::DATABASE_URL),
            generative,
            estimation_seed,
            logging: LoggingConfig::from_env(),
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error for an unusable database URL, a zero timeout, or an
    /// invalid engagement configuration
    pub fn validate(&self) -> Result<()> {
        if !self.database_url.starts_with("sqlite:") {
            return Err(anyhow!(
                "DATABASE_URL must be a sqlite: URL, got {}",
                self.database_url
            ));
        }

        if let Some(generative) = &self.generative {
            if generative.timeout.is_zero() {
                return Err(anyhow!("Generative timeout must be positive"));
            }
            if generative.token.is_none() {
                warn!("Generative endpoint configured without a bearer token");
            }
        }

        EngagementConfig::load().map_err(|e| anyhow!("Invalid engagement config: {e}"))?;
        Ok(())
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "TwinForge Engagement Configuration:\n\
             - Database: {}\n\
             - Generative endpoint: {}\n\
             - Estimation seed: {}\n\
             - Log Level: {}",
            self.database_url,
            self.generative
                .as_ref()
                .map_or("disabled", |g| g.base_url.as_str()),
            self.estimation_seed
                .map_or_else(|| "entropy".to_owned(), |seed| seed.to_string()),
            self.logging.level,
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            env_vars::DATABASE_URL,
            env_vars::GENERATIVE_BASE_URL,
            env_vars::GENERATIVE_TOKEN,
            env_vars::GENERATIVE_TIMEOUT_SECS,
            env_vars::ESTIMATION_SEED,
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_generative_disabled_without_base_url() {
        clear_env();
        env::set_var(env_vars::DATABASE_URL, "sqlite::memory:");
        let config = ServerConfig::from_env().unwrap();
        assert!(config.generative.is_none());
        assert_eq!(config.estimation_seed, None);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_generative_and_seed_from_env() {
        clear_env();
        env::set_var(env_vars::DATABASE_URL, "sqlite::memory:");
        env::set_var(env_vars::GENERATIVE_BASE_URL, "https://gen.example.com/v1/");
        env::set_var(env_vars::GENERATIVE_TOKEN, "secret");
        env::set_var(env_vars::GENERATIVE_TIMEOUT_SECS, "5");
        env::set_var(env_vars::ESTIMATION_SEED, "42");

        let config = ServerConfig::from_env().unwrap();
        let generative = config.generative.unwrap();
        assert_eq!(generative.base_url, "https://gen.example.com/v1");
        assert_eq!(generative.timeout, Duration::from_secs(5));
        assert_eq!(config.estimation_seed, Some(42));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_seed_is_rejected() {
        clear_env();
        env::set_var(env_vars::ESTIMATION_SEED, "not-a-number");
        assert!(ServerConfig::from_env().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_non_sqlite_url_is_rejected() {
        clear_env();
        env::set_var(env_vars::DATABASE_URL, "postgres://localhost/db");
        assert!(ServerConfig::from_env().is_err());
        clear_env();
    }
}
