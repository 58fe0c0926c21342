//! Category-to-thread routing.
//!
//! A create-on-first-use cache with no invalidation: once a mapping is
//! persisted it is trusted for the lifetime of the store. Creation races
//! between processes are not guarded - the pipeline is sequential within
//! one process, which is the supported deployment.

use std::sync::Arc;

use tracing::{info, warn};

use crate::app::composer;
use crate::domain::Category;
use crate::port::outbound::{ChatTransport, Delivery, ThreadHandle, ThreadStore};

/// Resolves a category to its durable thread root, creating the root
/// message on first use.
pub struct ThreadRouter<S, T> {
    store: Arc<S>,
    transport: Arc<T>,
}

impl<S, T> ThreadRouter<S, T>
where
    S: ThreadStore,
    T: ChatTransport,
{
    #[must_use]
    pub fn new(store: Arc<S>, transport: Arc<T>) -> Self {
        Self { store, transport }
    }

    /// Return the thread handle for a category, or `None` when no thread
    /// can be resolved right now.
    ///
    /// `None` is a presentation fallback, not an error: the caller delivers
    /// to the main channel instead, and the next candidate of this category
    /// retries creation.
    pub async fn route(&self, category: Category) -> Option<ThreadHandle> {
        match self.store.thread_root(category).await {
            Ok(Some(handle)) => return Some(handle),
            Ok(None) => {}
            Err(e) => {
                warn!(category = category.as_str(), error = %e, "Thread lookup failed");
                return None;
            }
        }

        let root = composer::compose_thread_root(category);
        match self.transport.create_thread_root(&root).await {
            Delivery::Sent(handle) => {
                info!(category = category.as_str(), %handle, "Created thread root");
                if let Err(e) = self.store.save_thread_root(category, &handle).await {
                    // The root message exists in the room; use it for this
                    // delivery even though the mapping didn't stick.
                    warn!(category = category.as_str(), error = %e, "Failed to persist thread root");
                }
                Some(handle)
            }
            Delivery::Failed(reason) => {
                warn!(category = category.as_str(), reason = %reason, "Thread root creation failed");
                None
            }
        }
    }
}
