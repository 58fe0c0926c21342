//! Transport-agnostic domain types.

mod category;
mod deal;

pub use category::Category;
pub use deal::{Candidate, DealKey, DiscountOffer, FreeOffer, Offer, Source};
