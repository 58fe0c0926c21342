//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points adapters implement to integrate with
//! external systems: the SQLite store, the Telegram transport, and the
//! IsThereAnyDeal price-history service.

pub mod outbound;
