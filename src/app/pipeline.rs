//! The delivery pipeline: dedup, classify, compose, route, deliver, persist.
//!
//! Candidates are processed strictly sequentially within a cycle so the
//! check-then-act dedup sequence cannot race against itself. The ordering
//! of the final two steps is deliberate: deliver first, persist second. A
//! crash or storage error between them causes at most a duplicate post on
//! the next cycle, never a silently dropped deal.

use std::sync::Arc;

use tracing::{info, warn};

use crate::adapter::outbound::frankfurter::RateCache;
use crate::app::composer::{self, PriceLines};
use crate::app::router::ThreadRouter;
use crate::domain::{Candidate, Offer};
use crate::error::Result;
use crate::port::outbound::{
    ChatTransport, Delivery, DeliveryTarget, FlagStore, HistoricalLowChecker, PostedStore,
    ThreadStore, FIRST_RUN_FLAG,
};

/// Pipeline policy knobs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Post into per-category threads instead of the room timeline.
    pub use_threads: bool,
    /// Posted-record retention window for pruning.
    pub retention: chrono::Duration,
}

/// What [`DeliveryPipeline::process`] did with a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Delivered and recorded.
    Posted,
    /// Identity key already recorded; nothing happened.
    AlreadyPosted,
    /// Transport refused; will retry next cycle.
    DeliveryFailed,
}

/// Orchestrates the per-candidate decision and delivery flow.
pub struct DeliveryPipeline<S, T, H> {
    store: Arc<S>,
    transport: Arc<T>,
    history: Option<Arc<H>>,
    rates: Arc<RateCache>,
    router: ThreadRouter<S, T>,
    config: PipelineConfig,
}

impl<S, T, H> DeliveryPipeline<S, T, H>
where
    S: PostedStore + ThreadStore + FlagStore,
    T: ChatTransport,
    H: HistoricalLowChecker,
{
    #[must_use]
    pub fn new(
        store: Arc<S>,
        transport: Arc<T>,
        history: Option<Arc<H>>,
        rates: Arc<RateCache>,
        config: PipelineConfig,
    ) -> Self {
        let router = ThreadRouter::new(Arc::clone(&store), Arc::clone(&transport));
        Self {
            store,
            transport,
            history,
            rates,
            router,
            config,
        }
    }

    /// Process one fetch cycle's batch in order, then prune old records.
    ///
    /// A storage fault on one candidate aborts only that candidate; the
    /// rest of the batch is still attempted.
    pub async fn run_cycle(&self, candidates: &[Candidate]) {
        for candidate in candidates {
            if let Err(e) = self.process(candidate).await {
                warn!(
                    key = %candidate.key,
                    title = %candidate.title,
                    error = %e,
                    "Candidate processing failed, will retry next cycle"
                );
            }
        }

        match self.store.prune(self.config.retention).await {
            Ok(0) => {}
            Ok(removed) => info!(removed, "Pruned old posted records"),
            Err(e) => warn!(error = %e, "Prune failed"),
        }
    }

    /// Decide-and-deliver for a single candidate.
    ///
    /// # Errors
    /// Returns an error only for storage faults; delivery failures are a
    /// normal [`ProcessOutcome`].
    pub async fn process(&self, candidate: &Candidate) -> Result<ProcessOutcome> {
        if self.store.has_posted(&candidate.key).await? {
            return Ok(ProcessOutcome::AlreadyPosted);
        }

        let is_historical_low = self.classify(candidate).await;
        let prices = self.price_lines(candidate);
        let message = composer::compose(candidate, is_historical_low, prices.as_ref());

        let target = self.resolve_target(candidate).await;
        match self.transport.deliver(&message, &target).await {
            Delivery::Sent(_) => {
                self.store
                    .mark_posted(&candidate.key, candidate.source, &candidate.title)
                    .await?;
                info!(key = %candidate.key, title = %candidate.title, "Posted deal");
                Ok(ProcessOutcome::Posted)
            }
            Delivery::Failed(reason) => {
                warn!(
                    key = %candidate.key,
                    title = %candidate.title,
                    reason = %reason,
                    "Failed to post deal, will retry next cycle"
                );
                Ok(ProcessOutcome::DeliveryFailed)
            }
        }
    }

    /// Record candidates as posted without delivering anything.
    ///
    /// Used on first startup for the steady sources, so the backlog of
    /// already-live deals doesn't burst into the room.
    pub async fn populate_silently(&self, candidates: &[Candidate]) -> Result<usize> {
        for candidate in candidates {
            self.store
                .mark_posted(&candidate.key, candidate.source, &candidate.title)
                .await?;
        }
        Ok(candidates.len())
    }

    /// Whether first-run population has already completed.
    pub async fn first_run_done(&self) -> Result<bool> {
        Ok(self.store.flag(FIRST_RUN_FLAG).await?.as_deref() == Some("true"))
    }

    /// Record that first-run population completed.
    pub async fn mark_first_run_done(&self) -> Result<()> {
        self.store.set_flag(FIRST_RUN_FLAG, "true").await
    }

    async fn classify(&self, candidate: &Candidate) -> bool {
        if candidate.known_historical_low {
            return true;
        }
        let Some(history) = &self.history else {
            return false;
        };
        let Some(history_ref) = &candidate.history_ref else {
            return false;
        };
        let Some(price) = candidate.sale_price_usd() else {
            return false;
        };
        history.is_historical_low(history_ref, price).await
    }

    fn price_lines(&self, candidate: &Candidate) -> Option<PriceLines> {
        match &candidate.offer {
            Offer::Discount(offer) => Some(PriceLines {
                sale: self.rates.format_price(offer.sale_usd),
                normal: self.rates.format_price(offer.normal_usd),
            }),
            Offer::Free(_) => None,
        }
    }

    async fn resolve_target(&self, candidate: &Candidate) -> DeliveryTarget {
        if !self.config.use_threads {
            return DeliveryTarget::Channel;
        }
        match self.router.route(candidate.category).await {
            Some(handle) => DeliveryTarget::Thread(handle),
            None => DeliveryTarget::Channel,
        }
    }
}
