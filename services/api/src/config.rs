//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use edusync_core::quiz::QuizDuration;
use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// When absent, identities live in memory for the lifetime of the process.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    /// An OpenAI-compatible endpoint, e.g. a Gemini or local gateway.
    pub openai_base_url: Option<String>,
    pub flow_model: String,
    pub cors_origin: String,
    pub session_days: i64,
    pub quiz_default_duration: QuizDuration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            log_level: Level::INFO,
            openai_api_key: None,
            openai_base_url: None,
            flow_model: "gpt-4o-mini".to_string(),
            cors_origin: "http://localhost:9002".to_string(),
            session_days: 30,
            quiz_default_duration: QuizDuration::default(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        let defaults = Self::default();

        // --- Load Server and Database Settings ---
        let bind_address = match std::env::var("BIND_ADDRESS") {
            Ok(value) => value.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            Err(_) => defaults.bind_address,
        };

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Model Settings ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let openai_base_url = std::env::var("OPENAI_BASE_URL").ok();
        let flow_model = std::env::var("FLOW_MODEL").unwrap_or(defaults.flow_model);

        // --- Load Web and Session Settings ---
        let cors_origin = std::env::var("CORS_ORIGIN").unwrap_or(defaults.cors_origin);

        let session_days = match std::env::var("SESSION_DAYS") {
            Ok(value) => value
                .parse::<i64>()
                .ok()
                .filter(|days| *days > 0)
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "SESSION_DAYS".to_string(),
                        format!("'{}' is not a positive number of days", value),
                    )
                })?,
            Err(_) => defaults.session_days,
        };

        let quiz_default_duration = match std::env::var("QUIZ_DEFAULT_DURATION_SECS") {
            Ok(value) => value
                .parse::<u32>()
                .ok()
                .and_then(|secs| QuizDuration::from_secs(secs).ok())
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "QUIZ_DEFAULT_DURATION_SECS".to_string(),
                        format!("'{}' is not between 10 and 120 seconds", value),
                    )
                })?,
            Err(_) => defaults.quiz_default_duration,
        };

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            openai_base_url,
            flow_model,
            cors_origin,
            session_days,
            quiz_default_duration,
        })
    }

    pub fn require_openai_key(&self) -> Result<&str, ConfigError> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))
    }
}
