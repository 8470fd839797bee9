//! Core domain types and the hook contract.
//!
//! A logging pipeline hands every emitted event to the registered [`Hook`]s
//! whose [`Hook::levels`] contain the event's severity. The types here are
//! independent of any concrete logging backend; see [`crate::layer`] for the
//! `tracing` binding.

use crate::error::HookError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Event severity, declared in ascending order of severity.
///
/// `Ord` follows the declaration order, so `Severity::Error > Severity::Info`.
/// Note that `tracing::Level` orders the other way round (`TRACE` is the
/// greatest); always convert through [`Severity::from`] before comparing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Panic,
}

impl Severity {
    /// Every severity, least severe first.
    pub const ALL: [Severity; 7] = [
        Severity::Trace,
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Fatal,
        Severity::Panic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "trace",
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
            Severity::Panic => "panic",
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a [`Severity`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity: {0}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Severity::Trace),
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            "panic" => Ok(Severity::Panic),
            other => Err(ParseSeverityError(other.to_string())),
        }
    }
}

impl From<tracing::Level> for Severity {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Severity::Trace,
            tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::WARN => Severity::Warn,
            _ => Severity::Error,
        }
    }
}

/// A single log event as seen by a hook.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    pub severity: Severity,
    pub message: String,
    /// Structured key/value pairs. Ordered by key so formatting is stable.
    pub fields: BTreeMap<String, Value>,
}

impl Event {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Adds a field, replacing any previous value under the same key.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// A consumer registered with the logging pipeline.
pub trait Hook: Send + Sync {
    /// The severities this hook wants to receive.
    fn levels(&self) -> Vec<Severity>;

    /// Whether events of `severity` should be passed to [`Hook::fire`].
    /// Must agree with [`Hook::levels`]; override to avoid the allocation.
    fn accepts(&self, severity: Severity) -> bool {
        self.levels().contains(&severity)
    }

    /// Handles one event. Errors are reported to the pipeline, which
    /// typically logs and otherwise ignores them.
    fn fire(&self, event: &Event) -> Result<(), HookError>;
}

impl<H: Hook + ?Sized> Hook for Arc<H> {
    fn levels(&self) -> Vec<Severity> {
        (**self).levels()
    }

    fn accepts(&self, severity: Severity) -> bool {
        (**self).accepts(severity)
    }

    fn fire(&self, event: &Event) -> Result<(), HookError> {
        (**self).fire(event)
    }
}
