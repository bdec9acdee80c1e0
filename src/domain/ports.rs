//! Domain Ports (Port/Adapter Pattern)
//!
//! This module defines the value objects of the top-destinations read path and
//! the two port traits the cache-aside core depends on. Infrastructure
//! adapters implement these traits to provide concrete implementations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Cache-Aside Core                    │
//! │  ┌───────────────────────────────────────────────┐  │
//! │  │              Ports (Traits)                    │  │
//! │  │      RankingSource    │    CacheStore          │  │
//! │  └───────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                Infrastructure Layer                  │
//! │  ┌───────────────────────────────────────────────┐  │
//! │  │              Adapters (Impls)                  │  │
//! │  │  PostgresRankingSource │ RedisCacheStore       │  │
//! │  └───────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

// =============================================================================
// Value Objects
// =============================================================================

/// One ranked travel destination.
///
/// Field names are the persisted names: the JSON cache entry and the ranking
/// query columns both use `best_time_to_visit` / `popularity_score`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    /// Country name (required)
    pub country: String,

    /// Free-form description
    pub description: String,

    /// Free-form recommendation, e.g. "April to June"
    pub best_time_to_visit: String,

    /// Non-negative ordering key; higher means more popular
    pub popularity_score: i64,
}

/// One complete, time-stamped result of the popularity ranking query.
///
/// Ordered best-first by `popularity_score`; ties keep database row order.
/// A snapshot is superseded wholesale by the next one, never patched. An
/// empty snapshot is valid and means "no destinations ranked yet".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingSnapshot {
    /// Ranked destinations, best first
    pub destinations: Vec<Destination>,

    /// When the ranking query produced this snapshot
    pub fetched_at: DateTime<Utc>,
}

impl RankingSnapshot {
    /// Create a snapshot time-stamped now.
    pub fn new(destinations: Vec<Destination>) -> Self {
        Self {
            destinations,
            fetched_at: Utc::now(),
        }
    }

    /// Create an empty snapshot ("no destinations ranked yet").
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Number of ranked destinations.
    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    /// Whether the snapshot holds no destinations.
    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    /// Check the ordering invariant: non-increasing in `popularity_score`.
    pub fn is_ordered(&self) -> bool {
        self.destinations
            .windows(2)
            .all(|pair| pair[0].popularity_score >= pair[1].popularity_score)
    }
}

// =============================================================================
// Ranking Source Port
// =============================================================================

/// Port for the relational ranking query.
///
/// Implementations must be idempotent and read-only on the underlying store.
/// A failure is reported, never silently mapped to an empty snapshot: an
/// empty result must mean genuinely zero ranked destinations.
#[async_trait]
pub trait RankingSource: Send + Sync {
    /// Execute the ranking query and return an ordered snapshot of at most N
    /// destinations, sorted by popularity score descending.
    async fn fetch(&self) -> Result<RankingSnapshot>;
}

// =============================================================================
// Cache Store Port
// =============================================================================

/// Port for the key-value cache store.
///
/// The cache-aside core works correctly using only these primitives. No
/// multi-key atomicity is assumed; `set` carries its TTL with the write so a
/// populate is a single atomic operation against the store.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the value under `key`. `Ok(None)` is a miss, not an error.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Write `value` under `key` with `ttl` applied atomically with the write.
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()>;

    /// Set one field of the hash stored under `key`.
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<()>;

    /// Read all fields of the hash stored under `key`. Empty map if absent.
    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>>;

    /// Whether a live (unexpired) entry exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Set or reset the TTL on an existing entry. A missing or already
    /// expired key is a no-op, not an error; `exists` tells the two apart.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dest(country: &str, score: i64) -> Destination {
        Destination {
            country: country.to_string(),
            description: format!("{} description", country),
            best_time_to_visit: "April to June".to_string(),
            popularity_score: score,
        }
    }

    #[test]
    fn test_snapshot_empty() {
        let snapshot = RankingSnapshot::empty();

        assert!(snapshot.is_empty());
        assert_eq!(snapshot.len(), 0);
        assert!(snapshot.is_ordered());
    }

    #[test]
    fn test_snapshot_ordering_invariant() {
        let ordered = RankingSnapshot::new(vec![
            dest("Italy", 95),
            dest("Japan", 88),
            dest("Peru", 88),
            dest("Iceland", 70),
        ]);
        assert!(ordered.is_ordered());

        let unordered = RankingSnapshot::new(vec![dest("Japan", 88), dest("Italy", 95)]);
        assert!(!unordered.is_ordered());
    }

    #[test]
    fn test_snapshot_single_entry_is_ordered() {
        let snapshot = RankingSnapshot::new(vec![dest("Italy", 95)]);
        assert!(snapshot.is_ordered());
    }

    #[test]
    fn test_destination_persisted_field_names() {
        let json = serde_json::to_string(&dest("Italy", 95)).unwrap();

        assert!(json.contains("\"country\":\"Italy\""));
        assert!(json.contains("\"best_time_to_visit\""));
        assert!(json.contains("\"popularity_score\":95"));
    }

    #[test]
    fn test_destination_equality() {
        assert_eq!(dest("Italy", 95), dest("Italy", 95));
        assert_ne!(dest("Italy", 95), dest("Italy", 94));
    }

    #[test]
    fn test_snapshot_preserves_tie_order() {
        // Ties keep input (database row) order
        let first = dest("Japan", 88);
        let second = dest("Peru", 88);
        let snapshot = RankingSnapshot::new(vec![first.clone(), second.clone()]);

        assert_eq!(snapshot.destinations[0], first);
        assert_eq!(snapshot.destinations[1], second);
    }
}
