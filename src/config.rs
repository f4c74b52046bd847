//! Configuration and settings management
//!
//! Loads settings from environment variables and optional config files.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Application settings loaded at startup.
///
/// Both values are required; the process refuses to start without them.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_bot_token: String,

    /// Backend service endpoint receiving every relay call
    pub bot_service_url: String,
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a required value is missing or a source
    /// cannot be read.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            // TELEGRAM_BOT_TOKEN / BOT_SERVICE_URL map to the snake_case
            // fields below; ignore_empty treats empty env vars as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }
}
