//! Environment configuration
//!
//! Read once at startup (after `dotenv`). Every value has a default except
//! the model API key; malformed numbers are rejected.

use crate::assistant::{DEFAULT_REPLY_CHAR_LIMIT, DEFAULT_SYSTEM_PROMPT};
use crate::error::AssistantError;
use crate::memory::DEFAULT_MAX_TURNS;
use crate::model::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::otp::DEFAULT_OTP_TTL_SECS;
use crate::upstream::CallPolicy;
use crate::Result;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATASET_PATH: &str = "data/dataset.json";
pub const DEFAULT_MAIL_SENDER: &str = "Credentic <no-reply@credentic.ai>";

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub gemini_api_key: String,
    pub model: String,
    pub gemini_base_url: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub dataset_path: PathBuf,
    pub mail_relay_url: Option<String>,
    pub mail_relay_token: Option<String>,
    pub mail_sender: String,
    pub system_prompt_path: Option<PathBuf>,
    pub upstream_timeout: Duration,
    pub retry_backoff: Duration,
    pub transcript_max_turns: usize,
    pub reply_char_limit: usize,
    pub otp_ttl_secs: i64,
}

impl AssistantConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let gemini_api_key = get("GEMINI_API_KEY")
            .or_else(|| get("GOOGLE_API_KEY"))
            .unwrap_or_else(|| {
                warn!("GEMINI_API_KEY not set; model requests will fail");
                String::new()
            });

        let port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => parse_value("PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            gemini_api_key,
            model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            port,
            database_url: get("DATABASE_URL").or_else(|| get("POSTGRES_URL")),
            dataset_path: get("DATASET_PATH")
                .unwrap_or_else(|| DEFAULT_DATASET_PATH.to_string())
                .into(),
            mail_relay_url: get("MAIL_RELAY_URL"),
            mail_relay_token: get("MAIL_RELAY_TOKEN"),
            mail_sender: get("MAIL_SENDER").unwrap_or_else(|| DEFAULT_MAIL_SENDER.to_string()),
            system_prompt_path: get("SYSTEM_PROMPT_PATH").map(PathBuf::from),
            upstream_timeout: Duration::from_secs(parse_or(&get, "UPSTREAM_TIMEOUT_SECS", 30)?),
            retry_backoff: Duration::from_millis(parse_or(&get, "RETRY_BACKOFF_MS", 500)?),
            transcript_max_turns: parse_or(&get, "TRANSCRIPT_MAX_TURNS", DEFAULT_MAX_TURNS)?,
            reply_char_limit: parse_or(&get, "REPLY_CHAR_LIMIT", DEFAULT_REPLY_CHAR_LIMIT)?,
            otp_ttl_secs: parse_or(&get, "OTP_TTL_SECS", DEFAULT_OTP_TTL_SECS)?,
        })
    }

    pub fn call_policy(&self) -> CallPolicy {
        CallPolicy {
            timeout: self.upstream_timeout,
            backoff: self.retry_backoff,
        }
    }

    /// Prompt file contents, or the built-in prompt when no path is set.
    pub fn load_system_prompt(&self) -> Result<String> {
        match &self.system_prompt_path {
            Some(path) => {
                let prompt = std::fs::read_to_string(path).map_err(|e| {
                    AssistantError::ConfigError(format!(
                        "Cannot read system prompt {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Ok(prompt.trim().to_string())
            }
            None => Ok(DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| AssistantError::ConfigError(format!("{} must be a number, got '{}'", key, raw)))
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}
