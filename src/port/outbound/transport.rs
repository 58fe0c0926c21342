//! Chat transport port for delivering deal messages.
//!
//! The transport reports success or typed failure through [`Delivery`]
//! instead of raising, so the pipeline never inspects transport-specific
//! response types.

use std::fmt;
use std::future::Future;

/// A composed message in both representations.
///
/// `plain` must stand alone - transports may display either form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub plain: String,
    /// Rich-markup form (Telegram MarkdownV2). User-derived text is
    /// escaped by the composer before it lands here.
    pub markup: String,
}

/// Opaque identity of a delivered root message, usable as a thread anchor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThreadHandle(String);

impl ThreadHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a message should land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryTarget {
    /// The main room timeline.
    Channel,
    /// An existing thread, anchored at its root message.
    Thread(ThreadHandle),
}

/// Outcome of a delivery attempt. Never an error type - transport faults
/// are expected to self-heal and are retried on the next polling cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Delivered; the handle identifies the sent message.
    Sent(ThreadHandle),
    /// Transport rejected or errored.
    Failed(String),
}

impl Delivery {
    #[must_use]
    pub fn is_sent(&self) -> bool {
        matches!(self, Delivery::Sent(_))
    }
}

/// Trait for chat delivery backends.
pub trait ChatTransport: Send + Sync {
    /// Deliver a message to the main channel or into an existing thread.
    fn deliver(
        &self,
        message: &OutboundMessage,
        target: &DeliveryTarget,
    ) -> impl Future<Output = Delivery> + Send;

    /// Deliver a new top-level message intended to anchor a thread.
    fn create_thread_root(
        &self,
        message: &OutboundMessage,
    ) -> impl Future<Output = Delivery> + Send;
}
