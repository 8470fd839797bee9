//! A client for the Telegram Bot API.

use crate::error::{ApiError, TransportError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// The public Bot API base URL.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Formatting mode understood by `sendMessage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    #[serde(rename = "HTML")]
    Html,
}

/// The body of a `sendMessage` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub chat_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<String>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
}

impl OutboundMessage {
    /// Builds an HTML message. An empty thread id is treated as absent.
    pub fn html(chat_id: String, thread_id: Option<String>, text: String) -> Self {
        Self {
            chat_id,
            message_thread_id: thread_id.filter(|t| !t.is_empty()),
            text,
            parse_mode: Some(ParseMode::Html),
        }
    }
}

/// The envelope every Bot API method answers with.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl ApiResponse {
    /// Splits the envelope into its result or the reported error.
    pub fn into_result(self) -> Result<Option<Value>, ApiError> {
        if self.ok {
            Ok(self.result)
        } else {
            Err(ApiError {
                code: self.error_code,
                description: self.description,
            })
        }
    }
}

/// The two Bot API calls the hook needs.
///
/// The token is passed per call because it can be changed on a live hook.
pub trait TelegramClientTrait: Send + Sync {
    /// `GET /bot<token>/getMe`: checks that the token is accepted.
    fn get_me(&self, token: &str) -> Result<ApiResponse, TransportError>;

    /// `POST /bot<token>/sendMessage`.
    fn send_message(
        &self,
        token: &str,
        message: &OutboundMessage,
    ) -> Result<ApiResponse, TransportError>;
}

/// A blocking HTTP client for the Bot API.
///
/// The underlying `reqwest::blocking::Client` is built once and shared by
/// every call. It must not be driven from a Tokio worker thread;
/// [`crate::hook::TelegramHook`] takes care of that.
pub struct TelegramClient {
    client: reqwest::blocking::Client,
    api_url: String,
}

impl TelegramClient {
    /// Creates a new `TelegramClient`.
    ///
    /// With `timeout` set to `None` reqwest's blocking default (30 seconds)
    /// applies.
    pub fn new(api_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TransportError::client)?;
        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // Contains the token: never log or return this.
    fn endpoint(&self, token: &str, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url.trim_end_matches('/'), token, method)
    }

    fn decode(response: reqwest::blocking::Response) -> Result<ApiResponse, TransportError> {
        // Failures come back as 4xx with a JSON body, so the status is not checked.
        let status = response.status();
        let api_response = response.json::<ApiResponse>().map_err(TransportError::decode)?;
        debug!(status = %status, ok = api_response.ok, "Telegram API responded");
        Ok(api_response)
    }
}

impl TelegramClientTrait for TelegramClient {
    fn get_me(&self, token: &str) -> Result<ApiResponse, TransportError> {
        let response = self
            .client
            .get(self.endpoint(token, "getMe"))
            .send()
            .map_err(TransportError::request)?;
        Self::decode(response)
    }

    fn send_message(
        &self,
        token: &str,
        message: &OutboundMessage,
    ) -> Result<ApiResponse, TransportError> {
        let response = self
            .client
            .post(self.endpoint(token, "sendMessage"))
            .json(message)
            .send()
            .map_err(TransportError::request)?;
        Self::decode(response)
    }
}
