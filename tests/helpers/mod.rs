#![allow(dead_code)]

pub mod fake_telegram;
pub mod test_metrics;

use mockito::{Mock, ServerGuard};

pub const TOKEN: &str = "123456:test-token";

/// Mounts a `getMe` mock that accepts `TOKEN`.
pub fn mock_get_me_ok(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", format!("/bot{}/getMe", TOKEN).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok":true,"result":{"id":123456,"is_bot":true,"first_name":"alerts"}}"#)
        .create()
}

/// Mounts a `sendMessage` mock answering with the given status and body.
pub fn mock_send_message(server: &mut ServerGuard, status: usize, body: &str) -> Mock {
    server
        .mock("POST", format!("/bot{}/sendMessage", TOKEN).as_str())
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create()
}
