//! Error taxonomy for the Telegram hook.

use std::fmt;
use thiserror::Error;

/// The Telegram API could not be reached or answered with something that is
/// not a valid API response.
///
/// Wrapped `reqwest::Error`s never carry the request URL, which embeds the
/// bot token.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request to Telegram API failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("malformed response from Telegram API: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("failed to build Telegram API client: {0}")]
    Client(#[source] reqwest::Error),
}

impl TransportError {
    pub fn request(e: reqwest::Error) -> Self {
        TransportError::Request(e.without_url())
    }

    pub fn decode(e: reqwest::Error) -> Self {
        TransportError::Decode(e.without_url())
    }

    pub fn client(e: reqwest::Error) -> Self {
        TransportError::Client(e.without_url())
    }

    /// Whether the underlying request hit the configured timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Request(e) | TransportError::Decode(e) | TransportError::Client(e) => {
                e.is_timeout()
            }
        }
    }
}

/// An `ok: false` answer from the Telegram API.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiError {
    pub code: Option<i64>,
    pub description: Option<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Received error response from Telegram API")?;
        if let Some(code) = self.code {
            write!(f, " (error code {})", code)?;
        }
        if let Some(description) = &self.description {
            write!(f, ": {}", description)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Errors surfaced by [`crate::hook::TelegramHook`].
#[derive(Error, Debug)]
pub enum HookError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The credential check at construction was rejected.
    #[error("Telegram token validation failed: {0}")]
    Validation(#[source] ApiError),

    /// A `sendMessage` call was rejected.
    #[error("Telegram message delivery failed: {0}")]
    Delivery(#[source] ApiError),
}

impl HookError {
    /// The API-reported error, if the remote endpoint answered with one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            HookError::Validation(e) | HookError::Delivery(e) => Some(e),
            HookError::Transport(_) => None,
        }
    }
}
