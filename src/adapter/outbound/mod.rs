//! Outbound adapters: upstream API clients, persistence, chat delivery.

pub mod cheapshark;
pub mod epic;
pub mod frankfurter;
pub mod itad;
pub mod sqlite;
pub mod telegram;
