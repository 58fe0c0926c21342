//! Persistence ports for posted deals, thread roots, and flags.
//!
//! Storage errors surface to the caller instead of being swallowed: a
//! masked lookup failure would risk a duplicate post, and a masked write
//! failure would silently lose a candidate.

use std::future::Future;

use crate::domain::{Category, DealKey, Source};
use crate::error::Result;
use crate::port::outbound::transport::ThreadHandle;

/// Flag key recording that first-run population has completed.
pub const FIRST_RUN_FLAG: &str = "first_run_done";

/// The dedup set of previously-announced identity keys.
pub trait PostedStore: Send + Sync {
    /// Pure lookup, no side effect.
    fn has_posted(&self, key: &DealKey) -> impl Future<Output = Result<bool>> + Send;

    /// Insert-if-absent. Inserting an already-present key is a no-op, not
    /// an error, so at-least-once retries upstream stay safe.
    fn mark_posted(
        &self,
        key: &DealKey,
        source: Source,
        title: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete records older than the retention window. Returns count removed.
    fn prune(&self, retention: chrono::Duration) -> impl Future<Output = Result<usize>> + Send;
}

/// Durable category-to-thread-root mappings. Created lazily, never deleted.
pub trait ThreadStore: Send + Sync {
    fn thread_root(
        &self,
        category: Category,
    ) -> impl Future<Output = Result<Option<ThreadHandle>>> + Send;

    fn save_thread_root(
        &self,
        category: Category,
        handle: &ThreadHandle,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Single-value configuration flags, e.g. [`FIRST_RUN_FLAG`].
pub trait FlagStore: Send + Sync {
    fn flag(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    fn set_flag(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;
}
