//! Telegram chat transport.

mod transport;

pub use transport::{TelegramConfig, TelegramTransport};
