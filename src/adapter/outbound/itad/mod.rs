//! IsThereAnyDeal clients: cross-region deal feed and price history.

mod deals;
mod history;

pub use deals::{ItadDealsClient, ItadFilters};
pub use history::ItadHistory;

/// IsThereAnyDeal API base URL.
pub const BASE_URL: &str = "https://api.isthereanydeal.com";
