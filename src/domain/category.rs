//! Thread categories and their display metadata.
//!
//! When threading is enabled, deal messages are posted inside per-category
//! threads rather than directly into the room timeline. Each category maps
//! to one durable thread root.

/// Categories that map to distinct room threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    GameDeals,
    DlcDeals,
    EpicFree,
    NonGameDeals,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 4] = [
        Category::GameDeals,
        Category::DlcDeals,
        Category::EpicFree,
        Category::NonGameDeals,
    ];

    /// Stable identifier used as the persistence key for thread mappings.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::GameDeals => "game_deals",
            Category::DlcDeals => "dlc_deals",
            Category::EpicFree => "epic_free",
            Category::NonGameDeals => "non_game_deals",
        }
    }

    /// Thread root title.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Category::GameDeals => "🎮 Game Deals",
            Category::DlcDeals => "🧩 DLC Deals",
            Category::EpicFree => "🆓 Epic Free Games",
            Category::NonGameDeals => "📦 Non-Game Deals",
        }
    }

    /// Short description shown below the thread root title.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Category::GameDeals => "PC game deals from CheapShark and IsThereAnyDeal",
            Category::DlcDeals => "DLC and expansion deals from IsThereAnyDeal",
            Category::EpicFree => "Weekly free games from the Epic Games Store",
            Category::NonGameDeals => "Software, courses, and other non-game deals",
        }
    }

    /// Map an ITAD entry `type` value to a category.
    #[must_use]
    pub fn from_itad_type(deal_type: &str) -> Self {
        match deal_type {
            "game" => Category::GameDeals,
            "dlc" => Category::DlcDeals,
            _ => Category::NonGameDeals,
        }
    }
}
