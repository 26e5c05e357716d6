//! Configuration and settings management.
//!
//! Loads settings from environment variables and optional config files.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Base delay for Telegram API retries.
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 250;
/// Cap on a single Telegram API retry delay.
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4_000;
/// How many times a failing Telegram API call is retried.
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Seconds a blocked conversation waits for input before expiring
    #[serde(default = "default_conversation_timeout_secs")]
    pub conversation_timeout_secs: u64,

    /// Path of the sqlite database file
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

const fn default_conversation_timeout_secs() -> u64 {
    7200
}

fn default_database_path() -> String {
    "shopbot.sqlite".to_string()
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(File::with_name("config/default").required(false))
            // Add in the current environment file
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of APP)
            .add_source(Environment::with_prefix("APP").separator("__"))
            // UPPER_SNAKE_CASE env vars map to snake_case keys; empty vars
            // count as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }

    /// The conversation timeout as a [`Duration`].
    #[must_use]
    pub const fn conversation_timeout(&self) -> Duration {
        Duration::from_secs(self.conversation_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    // One test mutates the environment, so everything lives in it to avoid
    // races between parallel tests.
    #[test]
    fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        env::set_var("TELEGRAM_TOKEN", "dummy_token");
        env::set_var("CONVERSATION_TIMEOUT_SECS", "30");

        let settings = Settings::new()?;
        assert_eq!(settings.telegram_token, "dummy_token");
        assert_eq!(settings.conversation_timeout_secs, 30);
        assert_eq!(settings.conversation_timeout(), Duration::from_secs(30));
        assert_eq!(settings.database_path, "shopbot.sqlite");

        env::remove_var("CONVERSATION_TIMEOUT_SECS");
        let settings = Settings::new()?;
        assert_eq!(settings.conversation_timeout_secs, 7200);

        env::remove_var("TELEGRAM_TOKEN");
        Ok(())
    }
}
