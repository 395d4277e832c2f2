//! Pricefloor Core - Domain Types and Error Taxonomy
//!
//! Shared vocabulary for the verified lowest-price ledger. This crate holds
//! the validated identifiers, ledger row types, and the error enums used by
//! the storage and API layers. It performs no I/O.

pub mod error;
pub mod types;

pub use error::{
    OracleError, PricefloorError, PricefloorResult, StorageError, ValidationError,
};
pub use types::{
    HistoryEntry, IngestSummary, LedgerStats, MergeOutcome, Observation, PriceRecord, ProductId,
};
