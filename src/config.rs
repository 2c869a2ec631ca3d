//! Runtime configuration
//!
//! Read from the environment (binaries load `.env` first via `dotenv`). A
//! missing API key is not an error: the conversation service degrades to its
//! "unavailable" reply instead.

use crate::error::BuddyError;
use crate::Result;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4.1";
pub const DEFAULT_PORT: u16 = 8080;

const PLACEHOLDER_KEY: &str = "your_openai_api_key_here";

/// Chat completions endpoint settings
#[derive(Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    /// SQLite URL for the slot store; in-memory when absent
    pub database_url: Option<String>,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = non_blank("OPENAI_API_KEY")
            .or_else(|| non_blank("EXPO_PUBLIC_OPENAI_API_KEY"))
            .filter(|key| key != PLACEHOLDER_KEY);

        let defaults = LlmConfig::default();
        let llm = LlmConfig {
            api_key,
            base_url: non_blank("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            model: non_blank("OPENAI_MODEL").unwrap_or(defaults.model),
            timeout: defaults.timeout,
        };

        let port = match non_blank("PORT").or_else(|| non_blank("API_PORT")) {
            Some(raw) => raw
                .parse()
                .map_err(|_| BuddyError::ConfigError(format!("Invalid port: {}", raw)))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            llm,
            database_url: non_blank("DATABASE_URL"),
            port,
        })
    }
}
