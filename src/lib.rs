//! Wayfarer Content Service
//!
//! Travel content RPC backend whose read path for the "top destinations"
//! ranking is cache-aside: repeated reads are served from Redis, misses pull
//! a fresh ranking from Postgres, write it back with a TTL, and return it.
//!
//! # Architecture
//!
//! ```text
//! RPC adapter → TopDestinationsCache.get()
//!                 ├─ hit:  CacheStore.get → decode → return
//!                 └─ miss: RankingSource.fetch → populate → return
//! ```
//!
//! Staleness is bounded by TTL only; there is no explicit invalidation.
//! Concurrent misses are coalesced so at most one ranking query is in flight
//! per key (a deliberate hardening over the unguarded stampede).
//!
//! # Modules
//!
//! - [`adapters`] - Postgres/Redis adapters plus in-memory test doubles
//! - [`cache`] - The cache-aside core and snapshot codec
//! - [`domain`] - Value objects and port traits
//! - [`error`] - Error types
//! - [`metrics`] - Prometheus counters
//! - [`rpc`] - gRPC surface

pub mod adapters;
pub mod cache;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod rpc;

// Re-export commonly used types
pub use cache::{CacheConfig, TopDestinationsCache, DEFAULT_CACHE_TTL, TOP_DESTINATIONS_KEY};
pub use domain::{CacheStore, Destination, RankingSnapshot, RankingSource};
pub use error::{Error, Result};
