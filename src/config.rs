//! Runtime configuration from environment variables

use crate::session::SessionParams;
use crate::sessions::SessionScope;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Bot configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram_token: String,
    pub openai_api_key: String,
    /// `OpenAI`-compatible API root, e.g. a proxy
    pub openai_base_url: Option<String>,
    pub model: String,
    /// Directory whose files shadow the embedded content
    pub resources_dir: Option<PathBuf>,
    pub session_scope: SessionScope,
    pub poll_timeout: Duration,
    pub session: SessionParams,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let telegram_token =
            get("TELEGRAM_BOT_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;
        let openai_api_key = get("OPENAI_API_KEY")
            .or_else(|| get("CHATGPT_TOKEN"))
            .ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;

        let session_scope = get("BOT_SESSION_SCOPE")
            .map(|value| {
                SessionScope::parse(&value).ok_or(ConfigError::Invalid {
                    name: "BOT_SESSION_SCOPE",
                    value,
                })
            })
            .transpose()?
            .unwrap_or(SessionScope::Shared);

        let poll_timeout_secs = get("TELEGRAM_POLL_TIMEOUT_SECS")
            .map(|value| {
                value.trim().parse().map_err(|_| ConfigError::Invalid {
                    name: "TELEGRAM_POLL_TIMEOUT_SECS",
                    value,
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_POLL_TIMEOUT_SECS);

        Ok(Self {
            telegram_token,
            openai_api_key,
            openai_base_url: get("OPENAI_BASE_URL"),
            model: get("DEFAULT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            resources_dir: get("BOT_RESOURCES_DIR").map(PathBuf::from),
            session_scope,
            poll_timeout: Duration::from_secs(poll_timeout_secs),
            session: SessionParams::default(),
        })
    }
}
