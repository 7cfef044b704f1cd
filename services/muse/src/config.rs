//! Application Configuration Module
//!
//! Centralizes the configuration for the muse service. Settings are loaded
//! from environment variables into a single struct that is passed to the
//! rest of the application.

use std::env;
use tracing::Level;

/// Model used when `CHAT_MODEL` is not set.
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash-preview-05-20";

/// Holds all configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub chat_model: String,
    pub log_level: Level,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `GEMINI_API_KEY`: Your secret key for the generation API. Required.
    // *   `CHAT_MODEL`: (Optional) The model used for every call. Defaults to "gemini-2.5-flash-preview-05-20".
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO". Can be "TRACE", "DEBUG", "INFO", "WARN", or "ERROR".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. This is useful for local development and is ignored if not present.
        dotenvy::dotenv().ok();

        Self::resolve(
            env::var("GEMINI_API_KEY").ok(),
            env::var("CHAT_MODEL").ok(),
            env::var("RUST_LOG").ok(),
        )
    }

    fn resolve(
        gemini_api_key: Option<String>,
        chat_model: Option<String>,
        log_level: Option<String>,
    ) -> Result<Self, ConfigError> {
        let gemini_api_key = gemini_api_key
            .ok_or_else(|| ConfigError::MissingVar("GEMINI_API_KEY must be set".to_string()))?;

        let chat_model = chat_model.unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());

        // Configure logging level from RUST_LOG, with a sensible default.
        let log_level_str = log_level.unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            gemini_api_key,
            chat_model,
            log_level,
        })
    }
}
