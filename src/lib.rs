//! Dealhound - game-deal watcher for Telegram rooms.
//!
//! This crate polls game-deal APIs (CheapShark discounts, Epic Games Store
//! free promotions, IsThereAnyDeal cross-region deals), deduplicates deals
//! against a SQLite store, and posts new ones to a Telegram chat, optionally
//! threaded by category.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - **`domain`** - Transport-agnostic types: candidates, identity keys,
//!   categories, offers
//! - **`port`** - Trait seams adapters implement: persistence, chat
//!   transport, historical-low lookup
//! - **`adapter`** - Implementations: SQLite store, Telegram transport,
//!   upstream API clients, the exchange-rate cache
//! - **`app`** - Composition root: the delivery pipeline, thread router,
//!   message composer, first-run population, preflight checks, and the
//!   polling scheduler
//!
//! # Delivery semantics
//!
//! The pipeline delivers first and persists second: a crash between the two
//! can cause at most a duplicate post on the next cycle, never a silently
//! dropped deal. Delivery failures are retried on the next polling cycle
//! because the candidate stays absent from the dedup store.

pub mod adapter;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;
