//! Configuration for the Telegram hook.
//!
//! `HookConfig` is loaded with the `figment` crate: built-in defaults, then an
//! optional `telegram-hook.toml` file, then environment variables prefixed
//! with `TELEGRAM_HOOK_` (e.g. `TELEGRAM_HOOK_TOKEN`).

use crate::core::Severity;
use crate::notification::telegram::DEFAULT_API_URL;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;

/// Settings for building a [`crate::hook::TelegramHook`].
#[derive(Deserialize, Serialize, Clone, PartialEq)]
pub struct HookConfig {
    /// Name shown in every message, e.g. `<b>ERROR</b>@my-app - ...`.
    pub app_name: String,
    /// The bot token.
    pub token: String,
    /// The chat to post into.
    #[serde(deserialize_with = "string_or_integer")]
    pub chat_id: String,
    /// Optional forum topic inside the chat.
    #[serde(default, deserialize_with = "optional_string_or_integer")]
    pub thread_id: Option<String>,
    /// Lowest severity that is delivered.
    pub min_severity: Severity,
    /// Deliver without blocking the logging thread.
    pub async_delivery: bool,
    /// Per-request timeout in milliseconds. Unset means reqwest's default (30s).
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Base URL of the Bot API.
    pub api_url: String,
}

/// Chat and thread ids are numeric; figment parses numeric env values as
/// integers, so both forms are accepted.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrInteger {
    String(String),
    Integer(i64),
}

impl From<StringOrInteger> for String {
    fn from(value: StringOrInteger) -> Self {
        match value {
            StringOrInteger::String(s) => s,
            StringOrInteger::Integer(n) => n.to_string(),
        }
    }
}

fn string_or_integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    StringOrInteger::deserialize(deserializer).map(String::from)
}

fn optional_string_or_integer<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<StringOrInteger>::deserialize(deserializer)?.map(String::from))
}

impl HookConfig {
    /// Loads the configuration from defaults, the given TOML file (if any)
    /// and the environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(HookConfig::default()));
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }
        let config: HookConfig = figment
            // Allow overriding with environment variables, e.g., TELEGRAM_HOOK_ASYNC_DELIVERY=true
            .merge(Env::prefixed("TELEGRAM_HOOK_"))
            .extract()?;
        Ok(config)
    }
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            app_name: String::new(),
            token: String::new(),
            chat_id: String::new(),
            thread_id: None,
            min_severity: Severity::Error,
            async_delivery: false,
            timeout_ms: None,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

// The token must never end up in logs.
impl fmt::Debug for HookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookConfig")
            .field("app_name", &self.app_name)
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("thread_id", &self.thread_id)
            .field("min_severity", &self.min_severity)
            .field("async_delivery", &self.async_delivery)
            .field("timeout_ms", &self.timeout_ms)
            .field("api_url", &self.api_url)
            .finish()
    }
}
