//! Cache-aside layer for lowest-price reads.
//!
//! The cache is a derived, disposable view over the ledger: any component
//! may repopulate it, only the ingestion pipeline invalidates it, and it is
//! never authoritative. [`PriceCache`] is the single get-or-populate +
//! invalidate abstraction shared by the single and batch read paths, so the
//! staleness rules live in one place.

mod memory_backend;
mod price_cache;
mod traits;

pub use memory_backend::InMemoryCacheBackend;
pub use price_cache::{CacheOutcome, PriceCache};
pub use traits::{CacheBackend, CacheEntry, CacheStats};
