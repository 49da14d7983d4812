//! Configuration module for Stowage.

use serde::Deserialize;
use std::path::Path;

use crate::datetime::Zone;
use crate::{Result, StowageError};

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/stowage.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/stowage.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Quota policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Zone that defines the calendar day for the daily upload quota
    /// ("local" for the process zone, or an IANA name such as "Europe/Berlin").
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Whether users are mailed when they hit a limit.
    #[serde(default = "default_limit_emails")]
    pub limit_emails: bool,
}

fn default_timezone() -> String {
    "local".to_string()
}

fn default_limit_emails() -> bool {
    true
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            limit_emails: default_limit_emails(),
        }
    }
}

impl PolicyConfig {
    /// Parse the configured timezone.
    pub fn zone(&self) -> Result<Zone> {
        self.timezone.parse().map_err(StowageError::Config)
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Quota policy configuration.
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(StowageError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| StowageError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `STOWAGE_DISABLE_LIMITS_EMAILS`: `yes` turns off limit-reached mail
    /// - `STOWAGE_TIMEZONE`: override the quota day timezone
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if var("STOWAGE_DISABLE_LIMITS_EMAILS").as_deref() == Some("yes") {
            self.policy.limit_emails = false;
        }
        if let Some(tz) = var("STOWAGE_TIMEZONE") {
            if !tz.is_empty() {
                self.policy.timezone = tz;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if the policy timezone cannot be parsed.
    pub fn validate(&self) -> Result<()> {
        self.policy.zone().map(|_| ())
    }
}
