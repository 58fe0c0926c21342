//! Outbound ports: persistence, chat delivery, price history.

mod history;
mod store;
mod transport;

pub use history::HistoricalLowChecker;
pub use store::{FlagStore, PostedStore, ThreadStore, FIRST_RUN_FLAG};
pub use transport::{ChatTransport, Delivery, DeliveryTarget, OutboundMessage, ThreadHandle};
