/// telegram-hook - forwards log events to a Telegram chat
///
/// This library provides a hook that formats log events as HTML messages
/// and delivers them through the Telegram Bot API, either on the logging
/// thread or fire-and-forget, plus a `tracing` layer to register it with.
pub mod config;
pub mod core;
pub mod error;
pub mod formatting;
pub mod hook;
pub mod layer;
pub mod notification;

// Re-export core types for convenience
pub use crate::core::{Event, Hook, Severity};
pub use config::HookConfig;
pub use error::{ApiError, HookError, TransportError};
pub use hook::{TelegramHook, TelegramHookBuilder};
pub use layer::HookLayer;
