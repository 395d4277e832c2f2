//! Pricefloor Storage - Storage Traits and In-Memory Implementations
//!
//! Defines the storage abstraction layer for the lowest-price ledger: the
//! [`LedgerStore`] and [`HistoryLog`] traits, the reusable cache-aside layer
//! ([`PriceCache`]), and in-memory implementations used by tests and
//! development. The production PostgreSQL implementation lives in
//! pricefloor-api.

pub mod cache;
pub mod memory;
pub mod traits;

pub use cache::{CacheBackend, CacheEntry, CacheOutcome, CacheStats, InMemoryCacheBackend, PriceCache};
pub use memory::{InMemoryHistory, InMemoryLedger};
pub use traits::{HistoryLog, LedgerStore};
