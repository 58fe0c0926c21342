//! App orchestration module.
//!
//! Wires the adapters into the delivery pipeline and runs the polling
//! scheduler. One select-driven loop multiplexes the per-source timers, so
//! a cycle always runs to completion before the next one starts.

pub mod composer;
pub mod pipeline;
pub mod preflight;
pub mod router;

use std::sync::Arc;

use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::info;

use crate::adapter::outbound::cheapshark::{CheapSharkClient, DealFilters};
use crate::adapter::outbound::epic::EpicClient;
use crate::adapter::outbound::frankfurter::RateCache;
use crate::adapter::outbound::itad::{ItadDealsClient, ItadFilters, ItadHistory};
use crate::adapter::outbound::sqlite::{create_pool, run_migrations, SqliteStore};
use crate::adapter::outbound::telegram::TelegramTransport;
use crate::config::Config;
use crate::error::Result;
use self::pipeline::{DeliveryPipeline, PipelineConfig};

type Pipeline = DeliveryPipeline<SqliteStore, TelegramTransport, ItadHistory>;

/// Main application struct.
pub struct App;

impl App {
    /// Run the watcher until the task is cancelled.
    ///
    /// Initializes storage, performs first-run population when needed, and
    /// then polls each source on its own fixed interval. The first tick of
    /// every timer fires immediately, so a fresh start checks all sources
    /// right away.
    pub async fn run(config: Config) -> Result<()> {
        let pool = create_pool(&config.database.path)?;
        run_migrations(&pool)?;
        info!(path = %config.database.path, "Database initialized");

        let store = Arc::new(SqliteStore::new(pool));
        let transport = Arc::new(TelegramTransport::new(&config.telegram_transport()));
        let rates = Arc::new(RateCache::new(config.rate_cache()));

        let itad_enabled = !config.secrets.itad_api_key.is_empty();
        let history =
            itad_enabled.then(|| Arc::new(ItadHistory::new(config.secrets.itad_api_key.clone())));

        let pipeline = DeliveryPipeline::new(
            store,
            transport,
            history,
            Arc::clone(&rates),
            PipelineConfig {
                use_threads: config.telegram.use_threads,
                retention: config.retention(),
            },
        );

        let cheapshark = CheapSharkClient::new();
        let epic = EpicClient::new();
        let itad = ItadDealsClient::new(config.secrets.itad_api_key.clone());

        let deal_filters = config.deal_filters();
        let itad_filters = config.itad_filters();

        if !pipeline.first_run_done().await? {
            first_run_population(
                &pipeline,
                &cheapshark,
                &itad,
                &rates,
                &deal_filters,
                &itad_filters,
            )
            .await?;
        }

        let mut cheapshark_timer = source_timer(config.sources.cheapshark_interval_hours);
        let mut epic_timer = source_timer(config.sources.epic_interval_hours);
        let mut itad_timer = source_timer(config.sources.itad_interval_hours);

        info!(itad_enabled, "Scheduler running");

        loop {
            tokio::select! {
                _ = cheapshark_timer.tick() => {
                    cheapshark_cycle(&pipeline, &cheapshark, &rates, &deal_filters).await;
                }
                _ = epic_timer.tick() => {
                    epic_cycle(&pipeline, &epic).await;
                }
                _ = itad_timer.tick(), if itad_enabled => {
                    itad_cycle(&pipeline, &itad, &rates, &itad_filters).await;
                }
            }
        }
    }
}

fn source_timer(hours: u64) -> tokio::time::Interval {
    let mut timer = interval(Duration::from_secs(hours * 3600));
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

/// Record the steady sources' current deals without posting, so the first
/// real cycle doesn't burst every live deal into the room.
///
/// The Epic rotation is deliberately excluded: its handful of weekly games
/// should post normally on the first cycle.
async fn first_run_population(
    pipeline: &Pipeline,
    cheapshark: &CheapSharkClient,
    itad: &ItadDealsClient,
    rates: &RateCache,
    deal_filters: &DealFilters,
    itad_filters: &ItadFilters,
) -> Result<()> {
    info!("First run detected - populating store without posting");
    rates.ensure_fresh().await;

    let mut recorded = 0;
    recorded += pipeline
        .populate_silently(&cheapshark.fetch_deals(deal_filters).await)
        .await?;
    recorded += pipeline
        .populate_silently(&itad.fetch_deals(rates, itad_filters).await)
        .await?;
    pipeline.mark_first_run_done().await?;

    info!(recorded, "First run: recorded existing deals");
    Ok(())
}

async fn cheapshark_cycle(
    pipeline: &Pipeline,
    client: &CheapSharkClient,
    rates: &RateCache,
    filters: &DealFilters,
) {
    info!("Checking CheapShark for deals");
    rates.ensure_fresh().await;
    let deals = client.fetch_deals(filters).await;
    pipeline.run_cycle(&deals).await;
}

async fn epic_cycle(pipeline: &Pipeline, client: &EpicClient) {
    info!("Checking Epic Games Store for free games");
    let games = client.fetch_free_games().await;
    let mut batch = games.current;
    batch.extend(games.upcoming);
    pipeline.run_cycle(&batch).await;
}

async fn itad_cycle(
    pipeline: &Pipeline,
    client: &ItadDealsClient,
    rates: &RateCache,
    filters: &ItadFilters,
) {
    info!("Checking IsThereAnyDeal for deals");
    rates.ensure_fresh().await;
    let deals = client.fetch_deals(rates, filters).await;
    pipeline.run_cycle(&deals).await;
}
