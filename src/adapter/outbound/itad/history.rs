//! Historical-low lookups against the IsThereAnyDeal price history.
//!
//! Two-step lookup: resolve the Steam app id to an ITAD game UUID, then
//! read the lowest recorded price from the games overview. Every failure
//! path degrades to `false` - the milestone annotation never blocks a post.

use std::time::Duration;

use reqwest::Client as HttpClient;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::port::outbound::HistoricalLowChecker;

use super::BASE_URL;

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    found: bool,
    game: Option<LookupGame>,
}

#[derive(Debug, Deserialize)]
struct LookupGame {
    id: String,
}

#[derive(Debug, Deserialize)]
struct OverviewResponse {
    #[serde(default)]
    prices: Vec<PriceEntry>,
}

#[derive(Debug, Deserialize)]
struct PriceEntry {
    lowest: Option<PricePoint>,
}

#[derive(Debug, Deserialize)]
struct PricePoint {
    price: Option<PriceAmount>,
}

#[derive(Debug, Deserialize)]
struct PriceAmount {
    amount: Decimal,
}

/// ITAD-backed implementation of [`HistoricalLowChecker`].
pub struct ItadHistory {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl ItadHistory {
    /// Create a new checker with a 30 second request timeout.
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

    /// Resolve a Steam app id to an ITAD game UUID.
    async fn lookup_game_id(&self, steam_app_id: &str) -> Option<String> {
        let result: Result<LookupResponse> = async {
            Ok(self
                .http
                .get(format!("{}/games/lookup/v1", self.base_url))
                .query(&[("key", self.api_key.as_str()), ("appid", steam_app_id)])
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?)
        }
        .await;

        match result {
            Ok(resp) if resp.found => resp.game.map(|g| g.id),
            Ok(_) => None,
            Err(e) => {
                warn!(app_id = steam_app_id, error = %e, "ITAD lookup error");
                None
            }
        }
    }

    /// Lowest price ever recorded for the given ITAD game UUID.
    async fn lowest_recorded(&self, game_id: &str) -> Option<Decimal> {
        let result: Result<OverviewResponse> = async {
            Ok(self
                .http
                .post(format!("{}/games/overview/v2", self.base_url))
                .query(&[("key", self.api_key.as_str())])
                .json(&[game_id])
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?)
        }
        .await;

        match result {
            Ok(resp) => resp
                .prices
                .into_iter()
                .next()
                .and_then(|entry| entry.lowest)
                .and_then(|lowest| lowest.price)
                .map(|p| p.amount),
            Err(e) => {
                warn!(game_id, error = %e, "ITAD overview error");
                None
            }
        }
    }
}

impl HistoricalLowChecker for ItadHistory {
    async fn is_historical_low(&self, history_ref: &str, current_price: Decimal) -> bool {
        if self.api_key.is_empty() || history_ref.is_empty() {
            return false;
        }

        let Some(game_id) = self.lookup_game_id(history_ref).await else {
            return false;
        };

        match self.lowest_recorded(&game_id).await {
            Some(lowest) => {
                let is_low = current_price <= lowest;
                debug!(app_id = history_ref, %current_price, %lowest, is_low, "Historical-low check");
                is_low
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_response_parses() {
        let resp: LookupResponse =
            serde_json::from_str(r#"{"found": true, "game": {"id": "uuid-1", "slug": "x"}}"#)
                .unwrap();
        assert!(resp.found);
        assert_eq!(resp.game.unwrap().id, "uuid-1");
    }

    #[test]
    fn lookup_not_found_parses() {
        let resp: LookupResponse = serde_json::from_str(r#"{"found": false}"#).unwrap();
        assert!(!resp.found);
        assert!(resp.game.is_none());
    }

    #[test]
    fn overview_extracts_lowest_amount() {
        let resp: OverviewResponse = serde_json::from_str(
            r#"{"prices": [{
                "id": "uuid-1",
                "current": {"price": {"amount": 9.99, "currency": "USD"}},
                "lowest": {"price": {"amount": 4.99, "currency": "USD"}}
            }]}"#,
        )
        .unwrap();

        let lowest = resp
            .prices
            .into_iter()
            .next()
            .and_then(|e| e.lowest)
            .and_then(|l| l.price)
            .map(|p| p.amount);
        assert_eq!(lowest, Some(Decimal::new(499, 2)));
    }

    #[test]
    fn overview_tolerates_missing_lowest() {
        let resp: OverviewResponse =
            serde_json::from_str(r#"{"prices": [{"id": "uuid-1", "lowest": null}]}"#).unwrap();
        assert!(resp.prices[0].lowest.is_none());
    }
}
