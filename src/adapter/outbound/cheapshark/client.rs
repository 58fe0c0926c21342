//! HTTP client for the CheapShark REST API.
//!
//! Fetches top-rated deals across a fixed allowlist of PC storefronts and
//! normalises them into [`Candidate`]s. Transient API failures yield an
//! empty list; the next polling cycle retries.

use std::time::Duration;

use reqwest::Client as HttpClient;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::{Candidate, Category, DealKey, DiscountOffer, Offer, Source};
use crate::error::Result;

/// CheapShark API base URL.
pub const BASE_URL: &str = "https://www.cheapshark.com/api/1.0";

/// CheapShark store IDs for PC/digital storefronts.
const STORES: &[(&str, &str)] = &[
    ("1", "Steam"),
    ("7", "GOG"),
    ("11", "Humble Store"),
    ("23", "GreenManGaming"),
];

const PAGE_SIZE: usize = 10;

/// Client-side filters applied to the raw deal list.
#[derive(Debug, Clone)]
pub struct DealFilters {
    pub max_price_usd: Decimal,
    /// Deal-rating floor on CheapShark's 0-10 scale. Unrated deals
    /// (rating 0) pass.
    pub min_deal_rating: f64,
    pub min_discount_percent: u8,
}

/// One raw deal as returned by `/deals`.
#[derive(Debug, Deserialize)]
struct RawDeal {
    #[serde(rename = "dealID")]
    deal_id: String,
    #[serde(rename = "gameID")]
    game_id: String,
    title: String,
    #[serde(rename = "salePrice")]
    sale_price: String,
    #[serde(rename = "normalPrice")]
    normal_price: String,
    #[serde(default)]
    savings: String,
    #[serde(rename = "dealRating", default)]
    deal_rating: String,
    #[serde(rename = "storeID")]
    store_id: String,
    #[serde(rename = "lastChange", default)]
    last_change: i64,
    #[serde(rename = "steamAppID")]
    steam_app_id: Option<String>,
}

/// HTTP client for CheapShark.
pub struct CheapSharkClient {
    http: HttpClient,
    base_url: String,
}

impl CheapSharkClient {
    /// Create a new client with a 30 second request timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL.to_string())
    }

    #[must_use]
    pub fn with_base_url(base_url: String) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        Self { http, base_url }
    }

    /// Fetch top deals across the configured stores.
    ///
    /// Returns an empty list on any transient API failure.
    pub async fn fetch_deals(&self, filters: &DealFilters) -> Vec<Candidate> {
        match self.try_fetch(filters).await {
            Ok(deals) => deals,
            Err(e) => {
                warn!(error = %e, "CheapShark API error");
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self, filters: &DealFilters) -> Result<Vec<Candidate>> {
        let store_ids: Vec<&str> = STORES.iter().map(|(id, _)| *id).collect();
        let raw: Vec<RawDeal> = self
            .http
            .get(format!("{}/deals", self.base_url))
            .query(&[
                ("storeID", store_ids.join(",")),
                ("upperPrice", filters.max_price_usd.trunc().to_string()),
                ("sortBy", "Deal Rating".to_string()),
                ("desc", "1".to_string()),
                ("pageSize", PAGE_SIZE.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        info!(raw = raw.len(), "CheapShark returned deals before filtering");

        let deals: Vec<Candidate> = raw
            .into_iter()
            .filter_map(|d| normalize(d, filters))
            .collect();

        info!(deals = deals.len(), "CheapShark returned deals after filtering");
        Ok(deals)
    }
}

impl Default for CheapSharkClient {
    fn default() -> Self {
        Self::new()
    }
}

fn store_name(store_id: &str) -> String {
    STORES
        .iter()
        .find(|(id, _)| *id == store_id)
        .map_or_else(|| format!("Store {store_id}"), |(_, name)| (*name).to_string())
}

/// Apply filters and map one raw deal into a candidate.
fn normalize(raw: RawDeal, filters: &DealFilters) -> Option<Candidate> {
    let savings: f64 = raw.savings.parse().unwrap_or(0.0);
    let rating: f64 = raw.deal_rating.parse().unwrap_or(0.0);

    if savings < f64::from(filters.min_discount_percent) {
        debug!(title = %raw.title, savings, "Filtered out: discount below threshold");
        return None;
    }
    if rating > 0.0 && rating < filters.min_deal_rating {
        debug!(title = %raw.title, rating, "Filtered out: rating below threshold");
        return None;
    }

    let sale_usd: Decimal = raw.sale_price.parse().ok()?;
    let normal_usd: Decimal = raw.normal_price.parse().ok()?;

    let history_ref = raw
        .steam_app_id
        .filter(|id| !id.is_empty() && id != "0");

    Some(Candidate {
        key: DealKey::cheapshark(&raw.game_id, raw.last_change),
        source: Source::CheapShark,
        title: raw.title,
        category: Category::GameDeals,
        offer: Offer::Discount(DiscountOffer {
            sale_usd,
            normal_usd,
            cut: savings as u8,
            shop: store_name(&raw.store_id),
            expiry: None,
        }),
        url: format!("https://www.cheapshark.com/redirect?dealID={}", raw.deal_id),
        history_ref,
        known_historical_low: false,
    })
}
