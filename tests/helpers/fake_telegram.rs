//! A fake Telegram client for injecting failures and slow responses.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use telegram_hook::notification::telegram::{ApiResponse, OutboundMessage, TelegramClientTrait};
use telegram_hook::TransportError;

/// How `send_message` answers.
#[derive(Clone, Debug)]
pub enum SendBehavior {
    Accept,
    Reject { code: i64, description: String },
    Hang(Duration),
}

#[derive(Debug)]
pub struct FakeTelegramClient {
    behavior: SendBehavior,
    pub sent: Mutex<Vec<OutboundMessage>>,
    pub completed: AtomicUsize,
}

impl FakeTelegramClient {
    pub fn new(behavior: SendBehavior) -> Self {
        Self {
            behavior,
            sent: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(0),
        }
    }

    pub fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Polls until `count` sends have finished or `timeout` elapses.
    pub fn wait_for_completed(&self, count: usize, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        while std::time::Instant::now() < deadline {
            if self.completed() >= count {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        self.completed() >= count
    }
}

impl TelegramClientTrait for FakeTelegramClient {
    fn get_me(&self, _token: &str) -> Result<ApiResponse, TransportError> {
        Ok(ApiResponse {
            ok: true,
            ..Default::default()
        })
    }

    fn send_message(
        &self,
        _token: &str,
        message: &OutboundMessage,
    ) -> Result<ApiResponse, TransportError> {
        self.sent.lock().unwrap().push(message.clone());
        let response = match &self.behavior {
            SendBehavior::Accept => ApiResponse {
                ok: true,
                ..Default::default()
            },
            SendBehavior::Reject { code, description } => ApiResponse {
                ok: false,
                error_code: Some(*code),
                description: Some(description.clone()),
                result: None,
            },
            SendBehavior::Hang(delay) => {
                std::thread::sleep(*delay);
                ApiResponse {
                    ok: true,
                    ..Default::default()
                }
            }
        };
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(response)
    }
}
