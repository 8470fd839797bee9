//! The Telegram hook: configuration store, credential check and dispatch.
//!
//! A [`TelegramHook`] is built through [`TelegramHookBuilder`], which checks
//! the bot token against the API before handing out a hook. A hook that
//! fails that check is never produced.
//!
//! Every setting can be read and changed at any time from any thread. Reads
//! take a shared lock, writes an exclusive one, and neither is held across a
//! remote call.

use crate::config::HookConfig;
use crate::core::{Event, Hook, Severity};
use crate::error::HookError;
use crate::formatting::{HtmlTextFormatter, TextFormatter};
use crate::notification::telegram::{
    OutboundMessage, TelegramClient, TelegramClientTrait, DEFAULT_API_URL,
};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, error, info, instrument};

/// Mutable settings shared by every `fire` call.
struct HookState {
    app_name: String,
    token: String,
    chat_id: String,
    thread_id: Option<String>,
    min_severity: Severity,
    async_delivery: bool,
}

impl fmt::Debug for HookState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookState")
            .field("app_name", &self.app_name)
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("thread_id", &self.thread_id)
            .field("min_severity", &self.min_severity)
            .field("async_delivery", &self.async_delivery)
            .finish()
    }
}

/// A hook that forwards log events to a Telegram chat.
pub struct TelegramHook {
    state: RwLock<HookState>,
    client: Arc<dyn TelegramClientTrait>,
    formatter: Arc<dyn TextFormatter>,
}

impl fmt::Debug for TelegramHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramHook")
            .field("state", &*self.read())
            .finish_non_exhaustive()
    }
}

impl TelegramHook {
    /// Creates a new `TelegramHookBuilder`.
    pub fn builder(
        app_name: impl Into<String>,
        token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> TelegramHookBuilder {
        TelegramHookBuilder::new(app_name, token, chat_id)
    }

    /// Creates a `TelegramHookBuilder` that talks to the API through
    /// `client` instead of a `TelegramClient` of its own.
    pub fn with_client(
        app_name: impl Into<String>,
        token: impl Into<String>,
        chat_id: impl Into<String>,
        client: Arc<dyn TelegramClientTrait>,
    ) -> TelegramHookBuilder {
        TelegramHookBuilder::new(app_name, token, chat_id).client(client)
    }

    /// Builds and validates a hook from loaded configuration.
    pub fn from_config(config: &HookConfig) -> Result<Self, HookError> {
        let mut builder = Self::builder(&config.app_name, &config.token, &config.chat_id)
            .thread_id(config.thread_id.clone())
            .min_severity(config.min_severity)
            .async_delivery(config.async_delivery)
            .api_url(&config.api_url);
        if let Some(ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        builder.build()
    }

    fn read(&self) -> RwLockReadGuard<'_, HookState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HookState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn app_name(&self) -> String {
        self.read().app_name.clone()
    }

    pub fn set_app_name(&self, app_name: impl Into<String>) {
        self.write().app_name = app_name.into();
    }

    pub fn token(&self) -> String {
        self.read().token.clone()
    }

    /// Replaces the bot token. No check is made; a bad token shows up as a
    /// failure on the next send.
    pub fn set_token(&self, token: impl Into<String>) {
        self.write().token = token.into();
    }

    pub fn chat_id(&self) -> String {
        self.read().chat_id.clone()
    }

    pub fn set_chat_id(&self, chat_id: impl Into<String>) {
        self.write().chat_id = chat_id.into();
    }

    pub fn thread_id(&self) -> Option<String> {
        self.read().thread_id.clone()
    }

    pub fn set_thread_id(&self, thread_id: Option<String>) {
        self.write().thread_id = thread_id;
    }

    pub fn min_severity(&self) -> Severity {
        self.read().min_severity
    }

    pub fn set_min_severity(&self, severity: Severity) {
        self.write().min_severity = severity;
    }

    pub fn is_async(&self) -> bool {
        self.read().async_delivery
    }

    /// Switches between blocking and fire-and-forget delivery.
    pub fn set_async(&self, async_delivery: bool) {
        self.write().async_delivery = async_delivery;
    }

    /// True when `severity` is at or above the configured minimum.
    pub fn should_handle(&self, severity: Severity) -> bool {
        severity >= self.min_severity()
    }

    /// Checks the current token with `getMe`.
    pub fn validate(&self) -> Result<(), HookError> {
        let token = self.token();
        let client = self.client.as_ref();
        let response = run_blocking(|| client.get_me(&token))?;
        response.into_result().map_err(HookError::Validation)?;
        Ok(())
    }

    fn spawn_delivery(&self, token: String, message: OutboundMessage) {
        let client = Arc::clone(&self.client);
        let job = move || match deliver(client.as_ref(), &token, &message) {
            Ok(()) => {
                metrics::counter!("telegram_messages_sent_total", "mode" => "async").increment(1);
            }
            Err(e) => {
                error!(error = %e, "Unable to send message to Telegram");
                metrics::counter!("telegram_messages_failed_total", "mode" => "async").increment(1);
            }
        };

        // Detached on purpose: nothing awaits the outcome.
        match Handle::try_current() {
            Ok(handle) => {
                let _ = handle.spawn_blocking(job);
            }
            Err(_) => {
                if let Err(e) = thread::Builder::new()
                    .name("telegram-hook-send".to_string())
                    .spawn(job)
                {
                    error!(error = %e, "Failed to spawn Telegram delivery thread");
                    metrics::counter!("telegram_messages_failed_total", "mode" => "async")
                        .increment(1);
                }
            }
        }
    }
}

impl Hook for TelegramHook {
    fn levels(&self) -> Vec<Severity> {
        let min = self.min_severity();
        Severity::ALL.into_iter().filter(|s| *s >= min).collect()
    }

    fn accepts(&self, severity: Severity) -> bool {
        self.should_handle(severity)
    }

    fn fire(&self, event: &Event) -> Result<(), HookError> {
        if !self.should_handle(event.severity) {
            metrics::counter!("telegram_events_filtered_total").increment(1);
            return Ok(());
        }

        let text = self.formatter.format_event(event, &self.app_name());
        let (token, message, async_delivery) = {
            let state = self.read();
            (
                state.token.clone(),
                OutboundMessage::html(state.chat_id.clone(), state.thread_id.clone(), text),
                state.async_delivery,
            )
        };

        if async_delivery {
            self.spawn_delivery(token, message);
            return Ok(());
        }

        let client = self.client.as_ref();
        match run_blocking(|| deliver(client, &token, &message)) {
            Ok(()) => {
                metrics::counter!("telegram_messages_sent_total", "mode" => "sync").increment(1);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Unable to send message to Telegram");
                metrics::counter!("telegram_messages_failed_total", "mode" => "sync").increment(1);
                Err(e)
            }
        }
    }
}

/// One `sendMessage` round trip.
fn deliver(
    client: &dyn TelegramClientTrait,
    token: &str,
    message: &OutboundMessage,
) -> Result<(), HookError> {
    client
        .send_message(token, message)?
        .into_result()
        .map_err(HookError::Delivery)?;
    debug!(chat_id = %message.chat_id, "Sent message to Telegram");
    Ok(())
}

/// Runs a blocking call, moving it to a scoped thread when the current
/// thread belongs to a Tokio runtime. The caller still waits for the result.
fn run_blocking<T, F>(f: F) -> T
where
    T: Send,
    F: FnOnce() -> T + Send,
{
    if Handle::try_current().is_err() {
        return f();
    }
    thread::scope(|s| match s.spawn(f).join() {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    })
}

/// Builder for [`TelegramHook`].
pub struct TelegramHookBuilder {
    app_name: String,
    token: String,
    chat_id: String,
    thread_id: Option<String>,
    min_severity: Severity,
    async_delivery: bool,
    timeout: Option<Duration>,
    api_url: String,
    client_override: Option<Arc<dyn TelegramClientTrait>>,
    formatter: Arc<dyn TextFormatter>,
}

impl TelegramHookBuilder {
    fn new(app_name: impl Into<String>, token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            token: token.into(),
            chat_id: chat_id.into(),
            thread_id: None,
            min_severity: Severity::Error,
            async_delivery: false,
            timeout: None,
            api_url: DEFAULT_API_URL.to_string(),
            client_override: None,
            formatter: Arc::new(HtmlTextFormatter),
        }
    }

    /// Forum topic to post into.
    pub fn thread_id(mut self, thread_id: Option<String>) -> Self {
        self.thread_id = thread_id;
        self
    }

    /// Lowest severity that is delivered. Defaults to `Severity::Error`.
    pub fn min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = severity;
        self
    }

    /// Deliver on a detached task instead of the calling thread.
    ///
    /// Synchronous delivery blocks the caller for the whole round trip.
    pub fn async_delivery(mut self, async_delivery: bool) -> Self {
        self.async_delivery = async_delivery;
        self
    }

    /// Bounds each API call. A zero duration is ignored; without a timeout
    /// reqwest's blocking default of 30 seconds applies.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.timeout = Some(timeout);
        }
        self
    }

    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Use a caller-supplied client instead of building a `TelegramClient`.
    /// `api_url` and `timeout` are then ignored.
    pub fn client(mut self, client: Arc<dyn TelegramClientTrait>) -> Self {
        self.client_override = Some(client);
        self
    }

    pub fn formatter(mut self, formatter: Arc<dyn TextFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Builds the hook and validates its token against the API.
    #[instrument(skip_all, fields(app_name = %self.app_name))]
    pub fn build(self) -> Result<TelegramHook, HookError> {
        let client = match self.client_override {
            Some(client) => client,
            None => {
                let api_url = self.api_url;
                let timeout = self.timeout;
                let client = run_blocking(move || TelegramClient::new(api_url, timeout))?;
                Arc::new(client) as Arc<dyn TelegramClientTrait>
            }
        };

        let hook = TelegramHook {
            state: RwLock::new(HookState {
                app_name: self.app_name,
                token: self.token,
                chat_id: self.chat_id,
                thread_id: self.thread_id,
                min_severity: self.min_severity,
                async_delivery: self.async_delivery,
            }),
            client,
            formatter: self.formatter,
        };

        if let Err(e) = hook.validate() {
            error!(error = %e, "Telegram token validation failed");
            return Err(e);
        }

        info!(min_severity = %hook.min_severity(), async_delivery = hook.is_async(), "Telegram hook ready");
        Ok(hook)
    }
}
