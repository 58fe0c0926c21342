//! Shared test harness: recording transport, failable store wrapper, and
//! candidate builders.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use dealhound::adapter::outbound::sqlite::{create_pool, run_migrations, SqliteStore};
use dealhound::domain::{Candidate, Category, DealKey, DiscountOffer, FreeOffer, Offer, Source};
use dealhound::error::{Error, Result};
use dealhound::port::outbound::{
    ChatTransport, Delivery, DeliveryTarget, FlagStore, HistoricalLowChecker, OutboundMessage,
    PostedStore, ThreadHandle, ThreadStore,
};

/// An in-memory SQLite store with migrations applied.
pub fn memory_store() -> Arc<SqliteStore> {
    let pool = create_pool(":memory:").expect("create pool");
    run_migrations(&pool).expect("run migrations");
    Arc::new(SqliteStore::new(pool))
}

/// Chat transport that records every call and can be told to fail.
#[derive(Default)]
pub struct RecordingTransport {
    pub deliveries: Mutex<Vec<(OutboundMessage, DeliveryTarget)>>,
    pub root_creations: Mutex<Vec<OutboundMessage>>,
    pub fail_deliveries: AtomicBool,
    pub fail_root_creations: AtomicBool,
    next_id: AtomicI32,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn delivery_count(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }

    pub fn root_creation_count(&self) -> usize {
        self.root_creations.lock().unwrap().len()
    }

    pub fn delivered_targets(&self) -> Vec<DeliveryTarget> {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .map(|(_, target)| target.clone())
            .collect()
    }

    pub fn delivered_plain_bodies(&self) -> Vec<String> {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .map(|(message, _)| message.plain.clone())
            .collect()
    }

    fn next_handle(&self) -> ThreadHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        ThreadHandle::new(id.to_string())
    }
}

impl ChatTransport for RecordingTransport {
    async fn deliver(&self, message: &OutboundMessage, target: &DeliveryTarget) -> Delivery {
        if self.fail_deliveries.load(Ordering::SeqCst) {
            return Delivery::Failed("scripted delivery failure".to_string());
        }
        self.deliveries
            .lock()
            .unwrap()
            .push((message.clone(), target.clone()));
        Delivery::Sent(self.next_handle())
    }

    async fn create_thread_root(&self, message: &OutboundMessage) -> Delivery {
        if self.fail_root_creations.load(Ordering::SeqCst) {
            return Delivery::Failed("scripted root failure".to_string());
        }
        self.root_creations.lock().unwrap().push(message.clone());
        Delivery::Sent(self.next_handle())
    }
}

/// Store wrapper that can be told to fail `mark_posted`, for crash-safety
/// tests. Everything else delegates to the inner SQLite store.
pub struct FailingMarkStore {
    inner: Arc<SqliteStore>,
    pub fail_marks: AtomicBool,
}

impl FailingMarkStore {
    pub fn new(inner: Arc<SqliteStore>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_marks: AtomicBool::new(false),
        })
    }
}

impl PostedStore for FailingMarkStore {
    async fn has_posted(&self, key: &DealKey) -> Result<bool> {
        self.inner.has_posted(key).await
    }

    async fn mark_posted(&self, key: &DealKey, source: Source, title: &str) -> Result<()> {
        if self.fail_marks.load(Ordering::SeqCst) {
            return Err(Error::Database("scripted write failure".to_string()));
        }
        self.inner.mark_posted(key, source, title).await
    }

    async fn prune(&self, retention: chrono::Duration) -> Result<usize> {
        self.inner.prune(retention).await
    }
}

impl ThreadStore for FailingMarkStore {
    async fn thread_root(&self, category: Category) -> Result<Option<ThreadHandle>> {
        self.inner.thread_root(category).await
    }

    async fn save_thread_root(&self, category: Category, handle: &ThreadHandle) -> Result<()> {
        self.inner.save_thread_root(category, handle).await
    }
}

impl FlagStore for FailingMarkStore {
    async fn flag(&self, key: &str) -> Result<Option<String>> {
        self.inner.flag(key).await
    }

    async fn set_flag(&self, key: &str, value: &str) -> Result<()> {
        self.inner.set_flag(key, value).await
    }
}

/// Historical-low checker that always answers the same thing.
pub struct StubHistory {
    pub answer: bool,
}

impl HistoricalLowChecker for StubHistory {
    async fn is_historical_low(&self, _history_ref: &str, _current_price: Decimal) -> bool {
        self.answer
    }
}

/// A CheapShark-style discount candidate.
pub fn discount_candidate(game_id: &str, last_change: i64, title: &str) -> Candidate {
    Candidate {
        key: DealKey::cheapshark(game_id, last_change),
        source: Source::CheapShark,
        title: title.to_string(),
        category: Category::GameDeals,
        offer: Offer::Discount(DiscountOffer {
            sale_usd: dec!(9.99),
            normal_usd: dec!(19.99),
            cut: 50,
            shop: "Steam".to_string(),
            expiry: None,
        }),
        url: "https://example.com/deal".to_string(),
        history_ref: Some("620".to_string()),
        known_historical_low: false,
    }
}

/// An Epic-style free candidate.
pub fn free_candidate(game_id: &str, title: &str) -> Candidate {
    Candidate {
        key: DealKey::epic(game_id),
        source: Source::Epic,
        title: title.to_string(),
        category: Category::EpicFree,
        offer: Offer::Free(FreeOffer {
            until: None,
            upcoming: false,
        }),
        url: "https://example.com/free".to_string(),
        history_ref: None,
        known_historical_low: false,
    }
}
