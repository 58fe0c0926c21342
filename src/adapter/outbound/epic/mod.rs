//! Epic Games Store free-promotion client.

mod client;

pub use client::{EpicClient, FreeGames, FREE_GAMES_URL};
