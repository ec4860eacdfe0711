//! Notification module for alerting an operator about matches
//!
//! Notifiers are best effort: delivery failures are logged and swallowed so
//! they can never stall or abort a scan.

mod telegram;

pub use telegram::TelegramNotifier;

use crate::config::TelegramConfig;
use crate::state::PageResult;
use async_trait::async_trait;
use reqwest::Client;

/// Delivers a free-text alert to a human
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short label for logs
    fn name(&self) -> &'static str;

    /// Sends `message`, logging rather than returning any failure
    async fn notify(&self, message: &str);
}

/// Fallback notifier that only writes the alert to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn notify(&self, message: &str) {
        tracing::info!("Notification: {}", message);
    }
}

/// Picks the notifier for the given Telegram settings
///
/// Falls back to [`LogNotifier`] when the token or chat id is missing.
pub fn build_notifier(client: Client, telegram: Option<&TelegramConfig>) -> Box<dyn Notifier> {
    match telegram {
        Some(TelegramConfig {
            token: Some(token),
            chat_id: Some(chat_id),
            api_base,
        }) => Box::new(TelegramNotifier::new(client, api_base, token, chat_id)),
        _ => {
            tracing::info!("Telegram token/chat id not configured; matches will only be logged");
            Box::new(LogNotifier)
        }
    }
}

/// Formats the alert sent for a page with matches
pub fn format_match_message(result: &PageResult) -> String {
    let mut message = format!(
        "Page {} has {} matching address(es):",
        result.page,
        result.matches.len()
    );
    for address in &result.matches {
        message.push('\n');
        message.push_str(address);
    }
    message
}
