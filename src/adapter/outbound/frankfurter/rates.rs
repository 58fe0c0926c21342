//! Cached exchange rates for multi-currency price display.
//!
//! Rates come from the Frankfurter API (ECB data, no API key). The cache
//! is an explicit component owned by the composition root: consumers get a
//! shared reference, and refresh happens through the `refresh`/`is_stale`
//! contract rather than implicitly on every call. All conversion is
//! best-effort - on a cache miss the source amount passes through.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use reqwest::Client as HttpClient;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};

/// Frankfurter latest-rates endpoint.
pub const FRANKFURTER_URL: &str = "https://api.frankfurter.dev/v1/latest";

/// Configuration for the rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// Base currency prices are stored in (and converted to).
    pub base: String,
    /// Display currencies, in display order.
    pub targets: Vec<String>,
    /// How long fetched rates stay fresh.
    pub ttl: Duration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            base: "USD".to_string(),
            targets: vec!["CAD".to_string(), "EUR".to_string(), "GBP".to_string()],
            ttl: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    rates: HashMap<String, Decimal>,
}

#[derive(Default)]
struct CacheState {
    rates: HashMap<String, Decimal>,
    fetched_at: Option<Instant>,
}

/// Shared, refreshable exchange-rate cache.
pub struct RateCache {
    http: HttpClient,
    url: String,
    config: RateCacheConfig,
    state: RwLock<CacheState>,
}

impl RateCache {
    /// Create an empty cache; call [`RateCache::refresh`] to populate it.
    #[must_use]
    pub fn new(config: RateCacheConfig) -> Self {
        Self::with_url(config, FRANKFURTER_URL.to_string())
    }

    #[must_use]
    pub fn with_url(config: RateCacheConfig, url: String) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        Self {
            http,
            url,
            config,
            state: RwLock::new(CacheState::default()),
        }
    }

    /// Fetch the latest base-currency rates.
    ///
    /// Returns true if rates were successfully updated; on failure the
    /// previous rates (if any) stay in place.
    pub async fn refresh(&self) -> bool {
        let symbols = self.config.targets.join(",");
        let response = self
            .http
            .get(&self.url)
            .query(&[("base", self.config.base.as_str()), ("symbols", &symbols)])
            .send()
            .await;

        let rates = match response {
            Ok(resp) => match resp.error_for_status() {
                Ok(resp) => match resp.json::<RatesResponse>().await {
                    Ok(parsed) => parsed.rates,
                    Err(e) => {
                        warn!(error = %e, "Failed to parse exchange rates");
                        return false;
                    }
                },
                Err(e) => {
                    warn!(error = %e, "Exchange-rate API rejected request");
                    return false;
                }
            },
            Err(e) => {
                warn!(error = %e, "Failed to fetch exchange rates");
                return false;
            }
        };

        if rates.is_empty() {
            warn!("Exchange-rate API returned empty rates");
            return false;
        }

        info!(rates = rates.len(), "Exchange rates updated");
        let mut state = self.state.write();
        state.rates = rates;
        state.fetched_at = Some(Instant::now());
        true
    }

    /// True when the cache is empty or past its TTL.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        let state = self.state.read();
        match state.fetched_at {
            Some(at) => state.rates.is_empty() || at.elapsed() > self.config.ttl,
            None => true,
        }
    }

    /// Refresh if stale; best-effort.
    pub async fn ensure_fresh(&self) {
        if self.is_stale() {
            self.refresh().await;
        }
    }

    /// Convert an amount in `currency` into the base currency.
    ///
    /// Falls back to the source amount when no rate is cached.
    #[must_use]
    pub fn to_base(&self, amount: Decimal, currency: &str) -> Decimal {
        if currency == self.config.base {
            return amount;
        }
        let state = self.state.read();
        match state.rates.get(currency) {
            Some(rate) if !rate.is_zero() => (amount / rate).round_dp(2),
            _ => amount,
        }
    }

    /// Format a base-currency amount as a pre-joined multi-currency string,
    /// e.g. `"$14.99 · C$20.54 · €13.78 · £11.98"`.
    ///
    /// Falls back to base-currency-only when rates aren't available.
    #[must_use]
    pub fn format_price(&self, amount: Decimal) -> String {
        let mut parts = vec![format!("{}{:.2}", symbol(&self.config.base), amount)];

        let state = self.state.read();
        for target in &self.config.targets {
            if let Some(rate) = state.rates.get(target) {
                let converted = (amount * rate).round_dp(2);
                parts.push(format!("{}{:.2}", symbol(target), converted));
            }
        }

        parts.join(" · ")
    }

    #[cfg(test)]
    pub(crate) fn seed_rates(&self, rates: &[(&str, Decimal)]) {
        let mut state = self.state.write();
        state.rates = rates
            .iter()
            .map(|(k, v)| ((*k).to_string(), *v))
            .collect();
        state.fetched_at = Some(Instant::now());
    }
}

/// Currency display symbols; unknown currencies display their code.
fn symbol(currency: &str) -> &str {
    match currency {
        "USD" => "$",
        "CAD" => "C$",
        "EUR" => "€",
        "GBP" => "£",
        other => other,
    }
}
