//! Cross-region deal feed from the IsThereAnyDeal `/deals/v2` endpoint.
//!
//! Deals are fetched per country, merged so that the first-listed country
//! wins when the same game and shop appear in multiple regions, and sorted
//! newest-first by the deal timestamp (the API itself only sorts by
//! discount or price).

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::adapter::outbound::frankfurter::RateCache;
use crate::domain::{Candidate, Category, DealKey, DiscountOffer, Offer, Source};
use crate::error::Result;

use super::BASE_URL;

const MAX_LIMIT: usize = 200;

/// Filters applied to the raw per-country deal lists.
#[derive(Debug, Clone)]
pub struct ItadFilters {
    /// Country codes to fetch, first-listed wins on cross-region duplicates.
    pub countries: Vec<String>,
    pub max_price_usd: Decimal,
    pub min_discount_percent: u8,
    /// Per-country fetch limit, capped at 200 by the API.
    pub limit: usize,
    /// Keep non-game entries (software, courses) instead of dropping them.
    pub include_non_games: bool,
}

#[derive(Debug, Deserialize)]
struct DealsResponse {
    #[serde(default)]
    list: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "type")]
    entry_type: Option<String>,
    deal: Option<DealNode>,
}

#[derive(Debug, Deserialize)]
struct DealNode {
    price: PriceNode,
    regular: PriceNode,
    #[serde(default)]
    cut: u8,
    flag: Option<String>,
    shop: ShopNode,
    #[serde(default)]
    url: String,
    timestamp: Option<String>,
    expiry: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PriceNode {
    amount: Decimal,
    #[serde(default = "usd")]
    currency: String,
}

fn usd() -> String {
    "USD".to_string()
}

#[derive(Debug, Deserialize)]
struct ShopNode {
    #[serde(default)]
    id: i64,
    #[serde(default = "unknown_shop")]
    name: String,
}

fn unknown_shop() -> String {
    "Unknown".to_string()
}

/// HTTP client for the ITAD deal feed.
pub struct ItadDealsClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl ItadDealsClient {
    /// Create a new client with a 30 second request timeout.
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, BASE_URL.to_string())
    }

    #[must_use]
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        Self {
            http,
            base_url,
            api_key,
        }
    }

    /// Fetch current deals across the configured countries.
    ///
    /// Returns an empty list when no API key is configured or on transient
    /// API failure.
    pub async fn fetch_deals(&self, rates: &RateCache, filters: &ItadFilters) -> Vec<Candidate> {
        if self.api_key.is_empty() {
            return Vec::new();
        }

        // Cross-country dedup on game+shop; first-listed country wins.
        let mut seen: HashSet<String> = HashSet::new();
        let mut all: Vec<(Option<DateTime<Utc>>, Candidate)> = Vec::new();

        for country in &filters.countries {
            let country_deals = match self.fetch_country(country, filters).await {
                Ok(deals) => deals,
                Err(e) => {
                    warn!(country = %country, error = %e, "ITAD deals API error");
                    continue;
                }
            };

            for entry in country_deals {
                let Some(normalized) = normalize(entry, rates, filters) else {
                    continue;
                };
                let (merge_key, timestamp, candidate) = normalized;
                if seen.insert(merge_key) {
                    all.push((timestamp, candidate));
                } else {
                    debug!(title = %candidate.title, country = %country, "Skipping cross-region duplicate");
                }
            }
        }

        // Newest first; deals without a timestamp sort last.
        all.sort_by(|(a, _), (b, _)| b.cmp(a));

        info!(
            deals = all.len(),
            countries = filters.countries.len(),
            "ITAD deals after cross-region merge"
        );
        all.into_iter().map(|(_, candidate)| candidate).collect()
    }

    async fn fetch_country(&self, country: &str, filters: &ItadFilters) -> Result<Vec<Entry>> {
        let limit = filters.limit.min(MAX_LIMIT);
        let response: DealsResponse = self
            .http
            .get(format!("{}/deals/v2", self.base_url))
            .query(&[
                ("key", self.api_key.as_str()),
                ("country", country),
                ("sort", "-cut"),
                ("limit", &limit.to_string()),
                ("nondeals", "false"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        info!(
            raw = response.list.len(),
            country, "ITAD returned deals before filtering"
        );
        Ok(response.list)
    }
}

type Normalized = (String, Option<DateTime<Utc>>, Candidate);

/// Apply filters and map one feed entry into a candidate, returning the
/// cross-region merge key and the deal timestamp alongside it.
fn normalize(entry: Entry, rates: &RateCache, filters: &ItadFilters) -> Option<Normalized> {
    let deal = entry.deal?;

    let entry_type = entry.entry_type.as_deref().unwrap_or_default();
    let category = Category::from_itad_type(entry_type);
    if category == Category::NonGameDeals && !filters.include_non_games {
        debug!(title = %entry.title, entry_type, "Filtered out: non-game content");
        return None;
    }

    // Normalise to the base currency so prices compare across regions.
    let sale_usd = rates.to_base(deal.price.amount, &deal.price.currency);
    let normal_usd = rates.to_base(deal.regular.amount, &deal.price.currency);

    if deal.cut < filters.min_discount_percent {
        debug!(title = %entry.title, cut = deal.cut, "Filtered out: discount below threshold");
        return None;
    }
    if sale_usd > filters.max_price_usd {
        debug!(title = %entry.title, %sale_usd, "Filtered out: price above threshold");
        return None;
    }

    let known_historical_low = matches!(deal.flag.as_deref(), Some("H") | Some("N"));
    let timestamp = deal
        .timestamp
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc));
    let expiry = deal
        .expiry
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc));

    let merge_key = format!("{}-{}", entry.id, deal.shop.id);
    let candidate = Candidate {
        key: DealKey::itad(&entry.id, deal.shop.id, deal.cut),
        source: Source::Itad,
        title: entry.title,
        category,
        offer: Offer::Discount(DiscountOffer {
            sale_usd,
            normal_usd,
            cut: deal.cut,
            shop: deal.shop.name,
            expiry,
        }),
        url: deal.url,
        history_ref: None,
        known_historical_low,
    };

    Some((merge_key, timestamp, candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::frankfurter::RateCacheConfig;
    use rust_decimal_macros::dec;

    fn filters() -> ItadFilters {
        ItadFilters {
            countries: vec!["US".to_string()],
            max_price_usd: dec!(20),
            min_discount_percent: 50,
            limit: 100,
            include_non_games: false,
        }
    }

    fn rates() -> RateCache {
        RateCache::new(RateCacheConfig::default())
    }

    fn entry(json: &str) -> Entry {
        serde_json::from_str(json).unwrap()
    }

    const HADES: &str = r#"{
        "id": "uuid-hades",
        "slug": "hades",
        "title": "Hades",
        "type": "game",
        "deal": {
            "price": {"amount": 9.99, "currency": "USD"},
            "regular": {"amount": 24.99, "currency": "USD"},
            "cut": 60,
            "flag": "H",
            "shop": {"id": 61, "name": "Steam"},
            "url": "https://example.com/hades",
            "timestamp": "2025-06-10T08:00:00Z",
            "expiry": "2025-06-20T08:00:00Z"
        }
    }"#;

    #[test]
    fn normalizes_a_qualifying_deal() {
        let (merge_key, timestamp, deal) = normalize(entry(HADES), &rates(), &filters()).unwrap();

        assert_eq!(merge_key, "uuid-hades-61");
        assert!(timestamp.is_some());
        assert_eq!(deal.key.as_str(), "itad-uuid-hades-61-60");
        assert_eq!(deal.source, Source::Itad);
        assert_eq!(deal.category, Category::GameDeals);
        assert!(deal.known_historical_low);
        assert!(deal.history_ref.is_none());

        match deal.offer {
            Offer::Discount(d) => {
                assert_eq!(d.sale_usd, dec!(9.99));
                assert_eq!(d.cut, 60);
                assert_eq!(d.shop, "Steam");
                assert!(d.expiry.is_some());
            }
            Offer::Free(_) => panic!("expected a discount offer"),
        }
    }

    #[test]
    fn dlc_maps_to_dlc_category() {
        let json = HADES.replace("\"type\": \"game\"", "\"type\": \"dlc\"");
        let (_, _, deal) = normalize(entry(&json), &rates(), &filters()).unwrap();
        assert_eq!(deal.category, Category::DlcDeals);
    }

    #[test]
    fn non_game_content_is_dropped_by_default() {
        let json = HADES.replace("\"type\": \"game\"", "\"type\": \"course\"");
        assert!(normalize(entry(&json), &rates(), &filters()).is_none());

        let mut keep = filters();
        keep.include_non_games = true;
        let (_, _, deal) = normalize(entry(&json), &rates(), &keep).unwrap();
        assert_eq!(deal.category, Category::NonGameDeals);
    }

    #[test]
    fn filters_low_discount_and_high_price() {
        let low_cut = HADES.replace("\"cut\": 60", "\"cut\": 30");
        assert!(normalize(entry(&low_cut), &rates(), &filters()).is_none());

        let pricey = HADES.replace("\"amount\": 9.99", "\"amount\": 29.99");
        assert!(normalize(entry(&pricey), &rates(), &filters()).is_none());
    }

    #[test]
    fn foreign_currency_is_normalised_before_filtering() {
        let cache = rates();
        cache.seed_rates(&[("EUR", dec!(0.92))]);

        let json = HADES
            .replace("\"amount\": 9.99, \"currency\": \"USD\"", "\"amount\": 9.20, \"currency\": \"EUR\"");
        let (_, _, deal) = normalize(entry(&json), &cache, &filters()).unwrap();
        match deal.offer {
            Offer::Discount(d) => assert_eq!(d.sale_usd, dec!(10.00)),
            Offer::Free(_) => panic!("expected a discount offer"),
        }
    }

    #[test]
    fn regular_flag_is_not_historical_low() {
        let json = HADES.replace("\"flag\": \"H\"", "\"flag\": \"S\"");
        let (_, _, deal) = normalize(entry(&json), &rates(), &filters()).unwrap();
        assert!(!deal.known_historical_low);

        let json = HADES.replace("\"flag\": \"H\"", "\"flag\": \"N\"");
        let (_, _, deal) = normalize(entry(&json), &rates(), &filters()).unwrap();
        assert!(deal.known_historical_low);
    }

    #[test]
    fn entry_without_deal_is_skipped() {
        let json = r#"{"id": "x", "title": "No deal", "type": "game"}"#;
        assert!(normalize(entry(json), &rates(), &filters()).is_none());
    }
}
