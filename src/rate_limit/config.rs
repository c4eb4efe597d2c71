use serde::{Deserialize, Serialize};
use std::{env, str::FromStr, time::Duration};
use thiserror::Error;

const DAY_SECS: u64 = 60 * 60 * 24;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a non-negative integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str)
}

/// Limits enforced by the rate limiter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed across all tokens per reset period (default: 10000)
    pub limit: u64,
    /// Minimum time between two accepted requests of one token (default: 5s)
    pub cooldown: Duration,
    /// How often the global request counter returns to zero (default: 24h)
    pub reset_period: Duration,
    /// How often stale tokens are swept (default: 24h)
    pub sweep_period: Duration,
    /// Age of the last request after which a token is swept (default: 1 day)
    pub token_max_age: Duration
}

impl RateLimitConfig {
    /// Creates a configuration from environment variables, falling back to
    /// the defaults for unset ones
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            limit: env_or("RATE_LIMIT_LIMIT", defaults.limit)?,
            cooldown: env_secs_or("RATE_LIMIT_COOLDOWN_SECS", defaults.cooldown)?,
            reset_period: env_secs_or("RATE_LIMIT_RESET_PERIOD_SECS", defaults.reset_period)?,
            sweep_period: env_secs_or("RATE_LIMIT_SWEEP_PERIOD_SECS", defaults.sweep_period)?,
            token_max_age: env_secs_or("RATE_LIMIT_TOKEN_MAX_AGE_SECS", defaults.token_max_age)?
        };

        config.validate()?;
        Ok(config)
    }

    /// Periodic jobs cannot run on a zero interval
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reset_period.is_zero() {
            return Err(ConfigError::Zero("RATE_LIMIT_RESET_PERIOD_SECS"));
        }

        if self.sweep_period.is_zero() {
            return Err(ConfigError::Zero("RATE_LIMIT_SWEEP_PERIOD_SECS"));
        }

        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 10_000,
            cooldown: Duration::from_secs(5),
            reset_period: Duration::from_secs(DAY_SECS),
            sweep_period: Duration::from_secs(DAY_SECS),
            token_max_age: Duration::from_secs(DAY_SECS)
        }
    }
}

fn env_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        Err(_) => Ok(default)
    }
}

fn env_secs_or(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    env_or(name, default.as_secs()).map(Duration::from_secs)
}
