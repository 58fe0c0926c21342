//! Exchange-rate cache backed by the Frankfurter API.

mod rates;

pub use rates::{RateCache, RateCacheConfig, FRANKFURTER_URL};
