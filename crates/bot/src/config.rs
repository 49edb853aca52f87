//! Bot configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BOT_TOKEN` - Telegram bot token from `@BotFather`
//!
//! ## Optional
//! - `API_BASE` - Base URL of the shop API (default: `http://127.0.0.1:8080`)
//! - `BOT_LOCALE` - Reply language, `he` or `en` (default: `he`)
//! - `BOT_POLL_TIMEOUT_SECS` - Long-poll timeout for `getUpdates` (default: 30)
//! - `TELEGRAM_API_BASE` - Bot API server (default: `https://api.telegram.org`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::messages::Locale;
use crate::telegram::TELEGRAM_API_BASE;

const DEFAULT_API_BASE: &str = "http://127.0.0.1:8080";
const MAX_POLL_TIMEOUT_SECS: u64 = 50;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Telegram bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Bot token (grants full control of the bot)
    pub token: SecretString,
    /// Shop API base URL
    pub api_base: Url,
    /// Language of all replies
    pub locale: Locale,
    /// `getUpdates` long-poll timeout
    pub poll_timeout: Duration,
    /// Telegram Bot API server
    pub telegram_api_base: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

impl BotConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the token is missing or a value is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let token = get_optional_env("BOT_TOKEN")
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("BOT_TOKEN".to_string()))?;
        validate_token(&token)?;

        let api_base = get_env_or_default("API_BASE", DEFAULT_API_BASE);
        let api_base = Url::parse(&api_base)
            .map_err(|e| ConfigError::InvalidEnvVar("API_BASE".to_string(), e.to_string()))?;

        let locale = get_env_or_default("BOT_LOCALE", "he");
        let locale = locale.parse::<Locale>().map_err(|()| {
            ConfigError::InvalidEnvVar(
                "BOT_LOCALE".to_string(),
                format!("unsupported locale '{locale}', expected 'he' or 'en'"),
            )
        })?;

        let poll_secs: u64 = get_env_or_default("BOT_POLL_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidEnvVar("BOT_POLL_TIMEOUT_SECS".to_string(), e.to_string())
            })?;
        if poll_secs > MAX_POLL_TIMEOUT_SECS {
            return Err(ConfigError::InvalidEnvVar(
                "BOT_POLL_TIMEOUT_SECS".to_string(),
                format!("must be at most {MAX_POLL_TIMEOUT_SECS}"),
            ));
        }

        Ok(Self {
            token,
            api_base,
            locale,
            poll_timeout: Duration::from_secs(poll_secs),
            telegram_api_base: get_env_or_default("TELEGRAM_API_BASE", TELEGRAM_API_BASE),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Bot tokens look like `<numeric bot id>:<secret>`.
fn validate_token(token: &SecretString) -> Result<(), ConfigError> {
    let valid = token
        .expose_secret()
        .split_once(':')
        .is_some_and(|(id, secret)| {
            !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) && !secret.is_empty()
        });
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar(
            "BOT_TOKEN".to_string(),
            "expected '<bot id>:<secret>'".to_string(),
        ))
    }
}
