//! HTTP client for the Epic Games Store free-games promotion feed.
//!
//! The feed is one JSON document listing every store element with its
//! promotional offers. An offer with a discount percentage of zero is a
//! free promotion; current offers must be active right now, upcoming ones
//! are announced for a later start.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::{Candidate, Category, DealKey, FreeOffer, Offer, Source};
use crate::error::Result;

/// Epic free-games promotions endpoint.
pub const FREE_GAMES_URL: &str =
    "https://store-site-backend-static.ak.epicgames.com/freeGamesPromotions";

/// Current and upcoming free games, in feed order.
#[derive(Debug, Default)]
pub struct FreeGames {
    pub current: Vec<Candidate>,
    pub upcoming: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    data: DataNode,
}

#[derive(Debug, Default, Deserialize)]
struct DataNode {
    #[serde(rename = "Catalog", default)]
    catalog: CatalogNode,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogNode {
    #[serde(rename = "searchStore", default)]
    search_store: SearchStoreNode,
}

#[derive(Debug, Default, Deserialize)]
struct SearchStoreNode {
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
struct Element {
    #[serde(default = "unknown_title")]
    title: String,
    #[serde(default)]
    id: String,
    #[serde(rename = "productSlug")]
    product_slug: Option<String>,
    #[serde(rename = "urlSlug")]
    url_slug: Option<String>,
    #[serde(rename = "catalogNs", default)]
    catalog_ns: CatalogNs,
    promotions: Option<Promotions>,
}

fn unknown_title() -> String {
    "Unknown".to_string()
}

#[derive(Debug, Default, Deserialize)]
struct CatalogNs {
    #[serde(default)]
    mappings: Vec<Mapping>,
}

#[derive(Debug, Deserialize)]
struct Mapping {
    #[serde(rename = "pageSlug")]
    page_slug: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Promotions {
    #[serde(rename = "promotionalOffers", default)]
    current: Vec<OfferGroup>,
    #[serde(rename = "upcomingPromotionalOffers", default)]
    upcoming: Vec<OfferGroup>,
}

#[derive(Debug, Deserialize)]
struct OfferGroup {
    #[serde(rename = "promotionalOffers", default)]
    offers: Vec<PromotionalOffer>,
}

#[derive(Debug, Deserialize)]
struct PromotionalOffer {
    #[serde(rename = "startDate")]
    start_date: Option<String>,
    #[serde(rename = "endDate")]
    end_date: Option<String>,
    #[serde(rename = "discountSetting")]
    discount_setting: Option<DiscountSetting>,
}

#[derive(Debug, Deserialize)]
struct DiscountSetting {
    #[serde(rename = "discountPercentage")]
    discount_percentage: Option<i64>,
}

impl PromotionalOffer {
    /// A promotion is free when the discounted percentage of the original
    /// price is zero.
    fn is_free(&self) -> bool {
        self.discount_setting
            .as_ref()
            .and_then(|d| d.discount_percentage)
            .unwrap_or(100)
            == 0
    }
}

/// HTTP client for the Epic free-games feed.
pub struct EpicClient {
    http: HttpClient,
    url: String,
}

impl EpicClient {
    /// Create a new client with a 30 second request timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_url(FREE_GAMES_URL.to_string())
    }

    #[must_use]
    pub fn with_url(url: String) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        Self { http, url }
    }

    /// Fetch current and upcoming free games.
    ///
    /// Returns empty lists on any transient API failure.
    pub async fn fetch_free_games(&self) -> FreeGames {
        match self.try_fetch().await {
            Ok(games) => games,
            Err(e) => {
                warn!(error = %e, "Epic Games Store API error");
                FreeGames::default()
            }
        }
    }

    async fn try_fetch(&self) -> Result<FreeGames> {
        let feed: FeedResponse = self
            .http
            .get(&self.url)
            .query(&[("locale", "en-US")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let elements = feed.data.catalog.search_store.elements;
        if elements.is_empty() {
            warn!("No elements found in Epic free games response");
            return Ok(FreeGames::default());
        }

        let games = parse_promotions(elements, Utc::now());
        info!(
            current = games.current.len(),
            upcoming = games.upcoming.len(),
            "Epic free games fetched"
        );
        Ok(games)
    }
}

impl Default for EpicClient {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn store_url(element: &Element) -> String {
    let slug = element
        .product_slug
        .clone()
        .or_else(|| element.url_slug.clone())
        .or_else(|| {
            element
                .catalog_ns
                .mappings
                .first()
                .and_then(|m| m.page_slug.clone())
        })
        .unwrap_or_default();

    if slug.is_empty() {
        String::new()
    } else {
        format!("https://store.epicgames.com/en-US/p/{slug}")
    }
}

fn candidate(element: &Element, until: Option<DateTime<Utc>>, upcoming: bool) -> Candidate {
    Candidate {
        key: DealKey::epic(&element.id),
        source: Source::Epic,
        title: element.title.clone(),
        category: Category::EpicFree,
        offer: Offer::Free(FreeOffer { until, upcoming }),
        url: store_url(element),
        history_ref: None,
        known_historical_low: false,
    }
}

/// Split store elements into currently-free and upcoming-free candidates.
fn parse_promotions(elements: Vec<Element>, now: DateTime<Utc>) -> FreeGames {
    let mut games = FreeGames::default();

    for element in &elements {
        let Some(promotions) = &element.promotions else {
            continue;
        };

        for offer in promotions.current.iter().flat_map(|g| &g.offers) {
            if !offer.is_free() {
                continue;
            }
            // A current offer must already have started and not yet ended.
            let start = offer.start_date.as_deref().and_then(parse_date);
            if start.is_some_and(|s| s > now) {
                continue;
            }
            let end = offer.end_date.as_deref().and_then(parse_date);
            if end.is_some_and(|e| e < now) {
                continue;
            }
            games.current.push(candidate(element, end, false));
        }

        for offer in promotions.upcoming.iter().flat_map(|g| &g.offers) {
            if !offer.is_free() {
                continue;
            }
            let end = offer.end_date.as_deref().and_then(parse_date);
            games.upcoming.push(candidate(element, end, true));
        }
    }

    games
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elements(json: &str) -> Vec<Element> {
        serde_json::from_str(json).unwrap()
    }

    fn fixed_now() -> DateTime<Utc> {
        parse_date("2025-06-15T12:00:00Z").unwrap()
    }

    const ACTIVE_FREE: &str = r#"[{
        "title": "Control",
        "id": "ctrl-1",
        "productSlug": "control",
        "promotions": {
            "promotionalOffers": [{
                "promotionalOffers": [{
                    "startDate": "2025-06-12T15:00:00Z",
                    "endDate": "2025-06-19T15:00:00Z",
                    "discountSetting": { "discountPercentage": 0 }
                }]
            }],
            "upcomingPromotionalOffers": []
        }
    }]"#;

    #[test]
    fn active_free_game_is_current() {
        let games = parse_promotions(elements(ACTIVE_FREE), fixed_now());

        assert_eq!(games.current.len(), 1);
        assert!(games.upcoming.is_empty());

        let game = &games.current[0];
        assert_eq!(game.key.as_str(), "epic-ctrl-1");
        assert_eq!(game.category, Category::EpicFree);
        assert_eq!(game.url, "https://store.epicgames.com/en-US/p/control");
        match &game.offer {
            Offer::Free(free) => {
                assert!(!free.upcoming);
                assert!(free.until.is_some());
            }
            Offer::Discount(_) => panic!("expected a free offer"),
        }
    }

    #[test]
    fn discounted_offer_is_not_free() {
        let json = ACTIVE_FREE.replace("\"discountPercentage\": 0", "\"discountPercentage\": 50");
        let games = parse_promotions(elements(&json), fixed_now());
        assert!(games.current.is_empty());
    }

    #[test]
    fn missing_discount_percentage_is_not_free() {
        let json =
            ACTIVE_FREE.replace("{ \"discountPercentage\": 0 }", "{ \"discountPercentage\": null }");
        let games = parse_promotions(elements(&json), fixed_now());
        assert!(games.current.is_empty());
    }

    #[test]
    fn not_yet_started_offer_is_skipped() {
        let json = ACTIVE_FREE.replace("2025-06-12T15:00:00Z", "2025-06-16T15:00:00Z");
        let games = parse_promotions(elements(&json), fixed_now());
        assert!(games.current.is_empty());
    }

    #[test]
    fn already_ended_offer_is_skipped() {
        let json = ACTIVE_FREE.replace("2025-06-19T15:00:00Z", "2025-06-14T15:00:00Z");
        let games = parse_promotions(elements(&json), fixed_now());
        assert!(games.current.is_empty());
    }

    #[test]
    fn upcoming_offers_are_separate() {
        let json = r#"[{
            "title": "Alan Wake",
            "id": "aw-1",
            "urlSlug": "alan-wake",
            "promotions": {
                "promotionalOffers": [],
                "upcomingPromotionalOffers": [{
                    "promotionalOffers": [{
                        "startDate": "2025-06-19T15:00:00Z",
                        "endDate": "2025-06-26T15:00:00Z",
                        "discountSetting": { "discountPercentage": 0 }
                    }]
                }]
            }
        }]"#;

        let games = parse_promotions(elements(json), fixed_now());
        assert!(games.current.is_empty());
        assert_eq!(games.upcoming.len(), 1);
        match &games.upcoming[0].offer {
            Offer::Free(free) => assert!(free.upcoming),
            Offer::Discount(_) => panic!("expected a free offer"),
        }
    }

    #[test]
    fn element_without_promotions_is_skipped() {
        let json = r#"[{ "title": "Base Game", "id": "bg-1" }]"#;
        let games = parse_promotions(elements(json), fixed_now());
        assert!(games.current.is_empty());
        assert!(games.upcoming.is_empty());
    }

    #[test]
    fn page_slug_fallback_builds_url() {
        let json = r#"[{
            "title": "Slugless",
            "id": "s-1",
            "catalogNs": { "mappings": [{ "pageSlug": "slugless-page" }] },
            "promotions": {
                "promotionalOffers": [{
                    "promotionalOffers": [{
                        "discountSetting": { "discountPercentage": 0 }
                    }]
                }],
                "upcomingPromotionalOffers": []
            }
        }]"#;

        let games = parse_promotions(elements(json), fixed_now());
        assert_eq!(
            games.current[0].url,
            "https://store.epicgames.com/en-US/p/slugless-page"
        );
    }
}
