//! CheapShark discount-aggregator client.

mod client;

pub use client::{CheapSharkClient, DealFilters, BASE_URL};
