//! Cache-Aside Top-Destinations Subsystem
//!
//! Serves the top-destinations ranking from a key-value store, repopulating
//! it from the relational ranking query on miss, with time-based expiration.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  TopDestinationsCache                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  get() ──▶ CacheStore.get("top_destinations")                 │
//! │              │ hit: decode ──▶ return snapshot                │
//! │              │ miss:                                          │
//! │              ▼                                                │
//! │            RankingSource.fetch() ──▶ populate() ──▶ return    │
//! │              (single-flight: one fetch+populate in flight,    │
//! │               concurrent miss-callers join the result)        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design
//!
//! - Blob encoding: the whole snapshot is one JSON value under one key, with
//!   one TTL applied atomically with the write
//! - State machine per key: `ABSENT → (populate) → PRESENT_FRESH → (TTL) →
//!   ABSENT`; no explicit invalidation, staleness is bounded by TTL only
//! - Corrupt entries surface as errors, never masked as misses

mod codec;
mod top_destinations;

#[cfg(test)]
mod proptest;

pub use codec::{decode_snapshot, encode_snapshot};
pub use top_destinations::{CacheConfig, TopDestinationsCache};

/// Logical cache key for the ranking snapshot
pub const TOP_DESTINATIONS_KEY: &str = "top_destinations";

/// Default entry lifetime (one hour)
pub const DEFAULT_CACHE_TTL: std::time::Duration = std::time::Duration::from_secs(3600);

// =============================================================================
// Tests
// =============================================================================
