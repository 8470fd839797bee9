// src/formatting.rs

use crate::core::{Event, Severity};
use serde_json::Value;

/// A trait for turning a log event into the text of a notification.
pub trait TextFormatter: Send + Sync {
    fn format_event(&self, event: &Event, app_name: &str) -> String;
}

/// A formatter for Telegram's HTML parse mode.
///
/// Produces `<label>@<app> - <message>`, followed by a `<pre>` block with one
/// `key: value` line per field when the event carries any fields.
///
/// Unlike the logrus hook this format comes from, the app name and the
/// message are escaped as well, so markup placed in a message is shown
/// literally rather than rendered.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTextFormatter;

impl HtmlTextFormatter {
    /// The bold severity tag. `Trace` has no label and yields an empty string.
    fn label(&self, severity: Severity) -> &'static str {
        match severity {
            Severity::Panic => "<b>PANIC</b>",
            Severity::Fatal => "<b>FATAL</b>",
            Severity::Error => "<b>ERROR</b>",
            Severity::Warn => "<b>WARNING</b>",
            Severity::Info => "<b>INFO</b>",
            Severity::Debug => "<b>DEBUG</b>",
            Severity::Trace => "",
        }
    }
}

impl TextFormatter for HtmlTextFormatter {
    fn format_event(&self, event: &Event, app_name: &str) -> String {
        let mut msg = format!(
            "{}@{} - {}",
            self.label(event.severity),
            escape_html(app_name),
            escape_html(&event.message)
        );

        if !event.fields.is_empty() {
            msg.push_str("\n<pre>");
            for (key, value) in &event.fields {
                msg.push('\n');
                msg.push_str(&escape_html(&format!("\t{}: {}", key, render_value(value))));
            }
            msg.push_str("\n</pre>");
        }

        msg
    }
}

/// Renders a field value. Strings appear without JSON quotes.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Escapes the characters that are significant in Telegram HTML.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
