use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::interview::{
    GenerationSettings, DEFAULT_HISTORY_LIMIT, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_TRACKED_SESSIONS, DEFAULT_SESSION_IDLE_TTL, DEFAULT_SHOWN_LIMIT,
    DEFAULT_SIMILARITY_THRESHOLD,
};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    /// Shared secret for `POST /api/v1/results/callback`. Unset disables the endpoint.
    pub results_callback_token: Option<String>,
    pub generation: GenerationSettings,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let generation = GenerationSettings {
            similarity_threshold: env_or(
                "QUESTION_SIMILARITY_THRESHOLD",
                DEFAULT_SIMILARITY_THRESHOLD,
            )?,
            max_attempts: env_or("QUESTION_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
            history_limit: env_or("QUESTION_HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT)?,
            shown_limit: env_or("SHOWN_QUESTION_LIMIT", DEFAULT_SHOWN_LIMIT)?,
            llm_timeout: Duration::from_secs(env_or("LLM_TIMEOUT_SECS", 30u64)?),
            session_idle_ttl: Duration::from_secs(env_or(
                "SESSION_IDLE_TTL_SECS",
                DEFAULT_SESSION_IDLE_TTL.as_secs(),
            )?),
            max_tracked_sessions: env_or("MAX_TRACKED_SESSIONS", DEFAULT_MAX_TRACKED_SESSIONS)?,
        };
        generation
            .validate()
            .context("Invalid question generation settings")?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10)?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            results_callback_token: std::env::var("RESULTS_CALLBACK_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            generation,
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => parse_var(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'"))
}
