//! Binds a [`Hook`] into a `tracing` subscriber stack.
//!
//! ```ignore
//! use std::sync::Arc;
//! use telegram_hook::{HookLayer, TelegramHook};
//! use tracing_subscriber::prelude::*;
//!
//! let hook = Arc::new(TelegramHook::builder("svc", token, chat_id).build()?);
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(HookLayer::new(hook.clone()))
//!     .init();
//! ```

use crate::core::{Event, Hook, Severity};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, Layer};

/// Targets whose events are never forwarded: this crate's own diagnostics
/// and the HTTP stack used to deliver them.
const SKIPPED_TARGETS: &[&str] = &["telegram_hook", "reqwest", "hyper", "h2"];

/// A `tracing_subscriber::Layer` that forwards events to a [`Hook`].
///
/// Filtering happens in `on_event` against [`Hook::accepts`], so the layer
/// never hides events from other layers in the same stack.
pub struct HookLayer<H> {
    hook: H,
}

impl<H: Hook> HookLayer<H> {
    pub fn new(hook: H) -> Self {
        Self { hook }
    }

    pub fn hook(&self) -> &H {
        &self.hook
    }
}

fn is_skipped(target: &str) -> bool {
    SKIPPED_TARGETS.iter().any(|prefix| {
        target == *prefix
            || target
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with("::"))
    })
}

impl<S, H> Layer<S> for HookLayer<H>
where
    S: Subscriber,
    H: Hook + 'static,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_skipped(metadata.target()) {
            return;
        }

        let severity = Severity::from(*metadata.level());
        if !self.hook.accepts(severity) {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        // The hook reports its own failures.
        let _ = self.hook.fire(&visitor.into_event(severity));
    }
}

/// Collects the `message` field and every other field of a `tracing` event.
#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: BTreeMap<String, Value>,
}

impl EventVisitor {
    fn into_event(self, severity: Severity) -> Event {
        Event {
            severity,
            message: self.message,
            fields: self.fields,
        }
    }

    fn insert(&mut self, field: &Field, value: Value) {
        // Metadata added by tracing-log when bridging `log` records.
        if field.name().starts_with("log.") {
            return;
        }
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.insert(field, Value::String(format!("{:?}", value)));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.insert(field, Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::String(value.to_string()));
    }
}
