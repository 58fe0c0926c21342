//! Price-history port for the historical-low milestone check.

use std::future::Future;

use rust_decimal::Decimal;

/// Best-effort lookup of whether a price is at or below the lowest ever
/// recorded for a title.
///
/// Implementations never error and never block a post: any lookup failure
/// degrades to `false`. The milestone annotation is an enhancement, not a
/// correctness-critical field.
pub trait HistoricalLowChecker: Send + Sync {
    /// True iff `current_price` is at or below the lowest recorded price
    /// for the referenced title.
    fn is_historical_low(
        &self,
        history_ref: &str,
        current_price: Decimal,
    ) -> impl Future<Output = bool> + Send;
}
