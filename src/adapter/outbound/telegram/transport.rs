//! Telegram delivery via the Bot API.
//!
//! Messages are sent with MarkdownV2 formatting and fall back to the plain
//! representation when Telegram rejects the markup. Thread targeting uses
//! reply chains: the thread handle is the root message's id, and threaded
//! posts are sent as replies to it.

use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode, ReplyParameters};
use tracing::{debug, warn};

use crate::port::outbound::{
    ChatTransport, Delivery, DeliveryTarget, OutboundMessage, ThreadHandle,
};

/// Configuration for the Telegram transport.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot API token obtained from BotFather.
    pub bot_token: String,
    /// Target chat ID for deal messages.
    pub chat_id: i64,
}

impl TelegramConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`. Returns `None`
    /// if either is missing or invalid.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").ok()?;
        let chat_id = std::env::var("TELEGRAM_CHAT_ID")
            .ok()
            .and_then(|s| s.parse().ok())?;

        Some(Self { bot_token, chat_id })
    }
}

/// Telegram transport implementing [`ChatTransport`].
pub struct TelegramTransport {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramTransport {
    /// Create a new transport for the configured chat.
    #[must_use]
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            bot: Bot::new(&config.bot_token),
            chat_id: ChatId(config.chat_id),
        }
    }

    async fn send(&self, message: &OutboundMessage, reply_to: Option<MessageId>) -> Delivery {
        let mut request = self
            .bot
            .send_message(self.chat_id, &message.markup)
            .parse_mode(ParseMode::MarkdownV2);
        if let Some(root) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(root));
        }

        match request.await {
            Ok(sent) => {
                debug!(message_id = sent.id.0, "Message sent");
                return Delivery::Sent(handle_for(sent.id));
            }
            Err(e) => {
                warn!(error = %e, "Markup send rejected, retrying plain");
            }
        }

        // Markup rejected: the plain form carries the same information.
        let mut request = self.bot.send_message(self.chat_id, &message.plain);
        if let Some(root) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(root));
        }

        match request.await {
            Ok(sent) => {
                debug!(message_id = sent.id.0, "Plain message sent");
                Delivery::Sent(handle_for(sent.id))
            }
            Err(e) => Delivery::Failed(e.to_string()),
        }
    }
}

impl ChatTransport for TelegramTransport {
    async fn deliver(&self, message: &OutboundMessage, target: &DeliveryTarget) -> Delivery {
        match target {
            DeliveryTarget::Channel => self.send(message, None).await,
            DeliveryTarget::Thread(handle) => match parse_handle(handle) {
                Some(root) => self.send(message, Some(root)).await,
                None => Delivery::Failed(format!("invalid thread handle: {handle}")),
            },
        }
    }

    async fn create_thread_root(&self, message: &OutboundMessage) -> Delivery {
        self.send(message, None).await
    }
}

fn handle_for(id: MessageId) -> ThreadHandle {
    ThreadHandle::new(id.0.to_string())
}

fn parse_handle(handle: &ThreadHandle) -> Option<MessageId> {
    handle.as_str().parse().ok().map(MessageId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize tests that modify environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn from_env_missing_token() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("TELEGRAM_BOT_TOKEN");
        std::env::remove_var("TELEGRAM_CHAT_ID");

        assert!(TelegramConfig::from_env().is_none());
    }

    #[test]
    fn from_env_invalid_chat_id() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("TELEGRAM_BOT_TOKEN", "test-token");
        std::env::set_var("TELEGRAM_CHAT_ID", "not-a-number");

        assert!(TelegramConfig::from_env().is_none());

        std::env::remove_var("TELEGRAM_BOT_TOKEN");
        std::env::remove_var("TELEGRAM_CHAT_ID");
    }

    #[test]
    fn from_env_valid() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("TELEGRAM_BOT_TOKEN", "test-token");
        std::env::set_var("TELEGRAM_CHAT_ID", "12345");

        let config = TelegramConfig::from_env().unwrap();
        assert_eq!(config.bot_token, "test-token");
        assert_eq!(config.chat_id, 12345);

        std::env::remove_var("TELEGRAM_BOT_TOKEN");
        std::env::remove_var("TELEGRAM_CHAT_ID");
    }

    #[test]
    fn handle_roundtrip() {
        let handle = handle_for(MessageId(77));
        assert_eq!(handle.as_str(), "77");
        assert_eq!(parse_handle(&handle), Some(MessageId(77)));
    }

    #[test]
    fn parse_handle_rejects_garbage() {
        assert_eq!(parse_handle(&ThreadHandle::new("not-an-id")), None);
    }
}
