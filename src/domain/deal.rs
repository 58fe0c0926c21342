//! Deal candidates and their identity keys.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::category::Category;

/// Identity key for one deal instance - the sole dedup mechanism.
///
/// The inner String is private so that every key is built through the
/// per-source constructors below. Derivation is an append-only contract:
/// changing an existing scheme orphans stored keys and causes a one-time
/// duplicate burst on the next cycle, so new schemes get new constructors
/// instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DealKey(String);

impl DealKey {
    /// Key for a CheapShark deal.
    ///
    /// `last_change` is the deal's last-modified timestamp, so a re-listed
    /// or re-priced discount on the same game is a distinct announcement.
    #[must_use]
    pub fn cheapshark(game_id: &str, last_change: i64) -> Self {
        Self(format!("cheapshark-{game_id}-{last_change}"))
    }

    /// Key for an Epic free promotion.
    ///
    /// Upcoming and current phases of one promotion share a key, so each
    /// promotion posts once.
    #[must_use]
    pub fn epic(game_id: &str) -> Self {
        Self(format!("epic-{game_id}"))
    }

    /// Key for an IsThereAnyDeal deal.
    ///
    /// A new discount tier on the same game and shop is a distinct
    /// announcement.
    #[must_use]
    pub fn itad(game_id: &str, shop_id: i64, cut: u8) -> Self {
        Self(format!("itad-{game_id}-{shop_id}-{cut}"))
    }

    /// Get the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DealKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DealKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Upstream source a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    CheapShark,
    Epic,
    Itad,
}

impl Source {
    /// Stable tag stored alongside posted records.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Source::CheapShark => "cheapshark",
            Source::Epic => "epic",
            Source::Itad => "itad",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discounted price on a storefront, normalised to USD.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountOffer {
    pub sale_usd: Decimal,
    pub normal_usd: Decimal,
    /// Percentage off, 0-100.
    pub cut: u8,
    /// Storefront display name, e.g. "Steam".
    pub shop: String,
    pub expiry: Option<DateTime<Utc>>,
}

/// A free promotion.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeOffer {
    /// When the promotion ends, if known. Display-only.
    pub until: Option<DateTime<Utc>>,
    /// True for promotions announced but not yet started.
    pub upcoming: bool,
}

/// Price side of a candidate: a discount or a free promotion.
#[derive(Debug, Clone, PartialEq)]
pub enum Offer {
    Discount(DiscountOffer),
    Free(FreeOffer),
}

/// A normalised deal record produced by a fetch cycle, not yet evaluated
/// for posting. Ephemeral - consumed by the delivery pipeline and dropped.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub key: DealKey,
    pub source: Source,
    pub title: String,
    pub category: Category,
    pub offer: Offer,
    /// Purchase / claim URL. Empty when the source supplied none.
    pub url: String,
    /// Steam app id usable for price-history lookups; absent when the
    /// source cannot supply one.
    pub history_ref: Option<String>,
    /// The source itself already flagged this price as an all-time low,
    /// so no remote lookup is needed.
    pub known_historical_low: bool,
}

impl Candidate {
    /// Current sale price in USD, if the offer carries one.
    #[must_use]
    pub fn sale_price_usd(&self) -> Option<Decimal> {
        match &self.offer {
            Offer::Discount(d) => Some(d.sale_usd),
            Offer::Free(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cheapshark_key_includes_last_change() {
        let a = DealKey::cheapshark("42", 100);
        let b = DealKey::cheapshark("42", 101);
        assert_eq!(a.as_str(), "cheapshark-42-100");
        assert_ne!(a, b);
    }

    #[test]
    fn cheapshark_key_is_stable_across_fetches() {
        assert_eq!(DealKey::cheapshark("42", 100), DealKey::cheapshark("42", 100));
    }

    #[test]
    fn epic_key_ignores_promotion_phase() {
        // Upcoming and current phases derive the same key.
        assert_eq!(DealKey::epic("abc").as_str(), "epic-abc");
    }

    #[test]
    fn itad_key_changes_with_discount_tier() {
        let half = DealKey::itad("uuid-1", 61, 50);
        let deeper = DealKey::itad("uuid-1", 61, 75);
        assert_eq!(half.as_str(), "itad-uuid-1-61-50");
        assert_ne!(half, deeper);
    }

    #[test]
    fn keys_are_source_namespaced() {
        // The same upstream id can never collide across sources.
        assert_ne!(DealKey::epic("7"), DealKey::cheapshark("7", 0));
    }

    #[test]
    fn source_tags() {
        assert_eq!(Source::CheapShark.as_str(), "cheapshark");
        assert_eq!(Source::Epic.as_str(), "epic");
        assert_eq!(Source::Itad.as_str(), "itad");
    }
}
