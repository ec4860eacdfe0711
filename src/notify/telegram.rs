//! Telegram bot notifier

use crate::notify::Notifier;
use async_trait::async_trait;
use reqwest::Client;

/// Sends alerts through the Telegram Bot API `sendMessage` method
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Creates a notifier for `chat_id` using the bot `token`
    ///
    /// `api_base` is normally `https://api.telegram.org`.
    pub fn new(client: Client, api_base: &str, token: &str, chat_id: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/bot{}/sendMessage", api_base.trim_end_matches('/'), token),
            chat_id: chat_id.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn notify(&self, message: &str) {
        let params = [("chat_id", self.chat_id.as_str()), ("text", message)];

        match self.client.post(&self.endpoint).form(&params).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!("Telegram notification delivered");
            }
            Ok(response) => {
                tracing::warn!(
                    "Telegram rejected notification (status {})",
                    response.status()
                );
            }
            Err(e) => {
                tracing::warn!("Failed to send Telegram notification: {}", e);
            }
        }
    }
}
