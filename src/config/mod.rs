//! Configuration module - environment variable parsing

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::util::time::{DEFAULT_SIMULATION_TPS, DEFAULT_SNAPSHOT_INTERVAL_TICKS};

/// Application configuration loaded from environment variables
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Fixed simulation ticks per second
    pub simulation_tps: u32,
    /// Ticks between authoritative update publishes
    pub snapshot_interval_ticks: u32,
    /// Records kept per character history
    pub history_capacity: usize,

    /// JSON roster file; the builtin roster is used when unset
    pub character_profiles: Option<PathBuf>,

    /// Headless bot clients started by the demo
    pub bot_count: usize,
    /// Seed for bot input generators
    pub bot_seed: u64,
    /// Demo run length in seconds
    pub demo_duration_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            simulation_tps: parse_or(&lookup, "SIMULATION_TPS", DEFAULT_SIMULATION_TPS)?,
            snapshot_interval_ticks: parse_or(
                &lookup,
                "SNAPSHOT_INTERVAL_TICKS",
                DEFAULT_SNAPSHOT_INTERVAL_TICKS,
            )?,
            history_capacity: parse_or(&lookup, "HISTORY_CAPACITY", DEFAULT_HISTORY_CAPACITY)?,

            character_profiles: lookup("CHARACTER_PROFILES")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),

            bot_count: parse_or(&lookup, "BOT_COUNT", 2)?,
            bot_seed: parse_or(&lookup, "BOT_SEED", 7)?,
            demo_duration_secs: parse_or(&lookup, "DEMO_DURATION_SECS", 10)?,
        };

        if config.simulation_tps == 0 {
            return Err(ConfigError::OutOfRange("SIMULATION_TPS"));
        }
        if config.snapshot_interval_ticks == 0 {
            return Err(ConfigError::OutOfRange("SNAPSHOT_INTERVAL_TICKS"));
        }
        if config.history_capacity == 0 {
            return Err(ConfigError::OutOfRange("HISTORY_CAPACITY"));
        }
        Ok(config)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Environment variable {0} must be greater than zero")]
    OutOfRange(&'static str),
}
