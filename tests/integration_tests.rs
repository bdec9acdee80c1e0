//! Wayfarer Integration Tests
//!
//! Exercises the cache-aside top-destinations subsystem end to end over the
//! instrumented in-memory doubles:
//! - Scenario tests: miss, hit, corrupt entry, empty ranking
//! - Policy tests: expiration, write-failure handling
//! - Concurrency tests: miss coalescing, stampede mode, cancellation
//! - RPC tests: handler output and status mapping
//! - Store contract tests: the six cache-store primitives

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use bytes::Bytes;

use wayfarer::adapters::{InMemoryCacheStore, StaticRankingSource};
use wayfarer::cache::{CacheConfig, TopDestinationsCache, TOP_DESTINATIONS_KEY};
use wayfarer::domain::{CacheStore, Destination, RankingSource};
use wayfarer::error::Error;

fn dest(country: &str, score: i64) -> Destination {
    Destination {
        country: country.to_string(),
        description: format!("{} description", country),
        best_time_to_visit: "April to June".to_string(),
        popularity_score: score,
    }
}

fn italy_japan() -> Vec<Destination> {
    vec![dest("Italy", 95), dest("Japan", 88)]
}

fn setup(
    destinations: Vec<Destination>,
    config: CacheConfig,
) -> (
    Arc<TopDestinationsCache>,
    Arc<InMemoryCacheStore>,
    Arc<StaticRankingSource>,
) {
    let store = Arc::new(InMemoryCacheStore::new());
    let source = Arc::new(StaticRankingSource::new(destinations));
    let cache = TopDestinationsCache::new(
        config,
        store.clone() as Arc<dyn CacheStore>,
        source.clone() as Arc<dyn RankingSource>,
    );
    (cache, store, source)
}

// =============================================================================
// Scenario Tests
// =============================================================================

mod scenario_tests {
    use super::*;

    /// First call misses, queries the source once, populates the store, and
    /// returns the entries in ranking order.
    #[tokio::test]
    async fn test_first_read_misses_and_populates() {
        let (cache, store, source) = setup(italy_japan(), CacheConfig::default());

        let snapshot = cache.get().await.unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.destinations[0].country, "Italy");
        assert_eq!(snapshot.destinations[0].popularity_score, 95);
        assert_eq!(snapshot.destinations[1].country, "Japan");
        assert_eq!(snapshot.destinations[1].popularity_score, 88);

        assert_eq!(source.fetches(), 1);
        assert_eq!(store.writes(), 1);
        assert!(store.exists(TOP_DESTINATIONS_KEY).await.unwrap());
    }

    /// With an unexpired entry in the store, the source is never consulted.
    #[tokio::test]
    async fn test_warm_read_never_touches_source() {
        let (cache, _store, source) = setup(italy_japan(), CacheConfig::default());

        let first = cache.get().await.unwrap();
        let second = cache.get().await.unwrap();

        assert_eq!(second, first);
        assert_eq!(source.fetches(), 1);
    }

    /// Corrupted bytes under the key surface as `CacheCorrupt`; the corrupt
    /// entry never falls through to the source.
    #[tokio::test]
    async fn test_corrupt_entry_surfaces() {
        let (cache, store, source) = setup(italy_japan(), CacheConfig::default());

        store
            .set(
                TOP_DESTINATIONS_KEY,
                Bytes::from_static(b"\xffnot json"),
                Duration::from_secs(60),
            )
            .await
            .unwrap();

        let err = cache.get().await.unwrap_err();
        assert_matches!(err, Error::CacheCorrupt { ref key, .. } if key == TOP_DESTINATIONS_KEY);
        assert_eq!(source.fetches(), 0);
    }

    /// An empty ranking is a valid answer: returned as an empty list and
    /// still written to the store with a TTL.
    #[tokio::test]
    async fn test_empty_ranking_is_cached_not_an_error() {
        let (cache, store, source) = setup(vec![], CacheConfig::default());

        let snapshot = cache.get().await.unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(store.writes(), 1);
        assert!(store.exists(TOP_DESTINATIONS_KEY).await.unwrap());

        // The cached empty snapshot serves subsequent reads
        let again = cache.get().await.unwrap();
        assert!(again.is_empty());
        assert_eq!(source.fetches(), 1);
    }

    /// What the second read returns equals what the source produced, field
    /// for field, in order.
    #[tokio::test]
    async fn test_cache_round_trip_fidelity() {
        let (cache, _store, _source) = setup(
            vec![dest("Italy", 95), dest("Japan", 88), dest("Peru", 88)],
            CacheConfig::default(),
        );

        let fresh = cache.get().await.unwrap();
        let cached = cache.get().await.unwrap();

        assert_eq!(cached, fresh);
        assert!(cached.is_ordered());
    }
}

// =============================================================================
// Policy Tests
// =============================================================================

mod policy_tests {
    use super::*;

    /// Once the TTL elapses the entry is indistinguishable from never
    /// cached, so the next read queries the source again.
    #[tokio::test]
    async fn test_expired_entry_triggers_refetch() {
        let config = CacheConfig {
            ttl: Duration::from_secs(1800),
            coalesce_misses: true,
        };
        let (cache, store, source) = setup(italy_japan(), config);

        cache.get().await.unwrap();
        assert_eq!(source.fetches(), 1);

        store.advance(Duration::from_secs(1801));

        cache.get().await.unwrap();
        assert_eq!(source.fetches(), 2);
        assert_eq!(store.writes(), 2);
    }

    /// Just short of the TTL the entry is still served.
    #[tokio::test]
    async fn test_unexpired_entry_still_serves() {
        let config = CacheConfig {
            ttl: Duration::from_secs(1800),
            coalesce_misses: true,
        };
        let (cache, store, source) = setup(italy_japan(), config);

        cache.get().await.unwrap();
        store.advance(Duration::from_secs(1799));

        cache.get().await.unwrap();
        assert_eq!(source.fetches(), 1);
    }

    /// Serve-then-log: a store that rejects writes degrades persistence,
    /// not the read path.
    #[tokio::test]
    async fn test_write_failure_still_serves_fresh_data() {
        let (cache, store, source) = setup(italy_japan(), CacheConfig::default());
        store.fail_writes(true);

        let snapshot = cache.get().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(store.writes(), 0);

        // Nothing was persisted, so the next read fetches again
        let again = cache.get().await.unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(source.fetches(), 2);
    }

    /// An explicit populate does surface the write failure.
    #[tokio::test]
    async fn test_explicit_populate_reports_write_failure() {
        let (cache, store, _source) = setup(italy_japan(), CacheConfig::default());
        store.fail_writes(true);

        let snapshot = wayfarer::domain::RankingSnapshot::new(italy_japan());
        let err = cache.populate(&snapshot).await.unwrap_err();
        assert_matches!(err, Error::CacheWriteFailed { .. });
    }

    /// A failing source propagates as `SourceUnavailable` and leaves the
    /// store untouched.
    #[tokio::test]
    async fn test_source_failure_propagates() {
        let (cache, store, source) = setup(italy_japan(), CacheConfig::default());
        source.fail_fetches(true);

        let err = cache.get().await.unwrap_err();
        assert_matches!(err, Error::SourceUnavailable(_));
        assert_eq!(store.writes(), 0);
    }

    /// A failed store read is surfaced as `CacheReadFailed`, never
    /// reinterpreted as a miss; the source stays untouched.
    #[tokio::test]
    async fn test_store_read_failure_does_not_fall_through() {
        let (cache, store, source) = setup(italy_japan(), CacheConfig::default());
        store.fail_reads(true);

        let err = cache.get().await.unwrap_err();
        assert_matches!(err, Error::CacheReadFailed { .. });
        assert_eq!(source.fetches(), 0);
        assert_eq!(store.writes(), 0);
    }
}

// =============================================================================
// Concurrency Tests
// =============================================================================

mod concurrency_tests {
    use super::*;
    use futures::future::join_all;

    /// With miss coalescing on, N concurrent first reads share one source
    /// fetch and one store write; every caller gets the snapshot.
    #[tokio::test]
    async fn test_concurrent_misses_coalesce() {
        let (cache, store, source) = setup(italy_japan(), CacheConfig::default());
        source.set_delay(Duration::from_millis(100));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get().await })
            })
            .collect();

        for result in join_all(handles).await {
            let snapshot = result.unwrap().unwrap();
            assert_eq!(snapshot.len(), 2);
        }

        assert_eq!(source.fetches(), 1);
        assert_eq!(store.writes(), 1);
    }

    /// With coalescing off, concurrent misses each query the source (the
    /// unguarded stampede behavior).
    #[tokio::test]
    async fn test_stampede_without_coalescing() {
        let config = CacheConfig {
            ttl: Duration::from_secs(3600),
            coalesce_misses: false,
        };
        let (cache, _store, source) = setup(italy_japan(), config);
        source.set_delay(Duration::from_millis(100));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get().await })
            })
            .collect();

        for result in join_all(handles).await {
            assert!(result.unwrap().is_ok());
        }

        assert_eq!(source.fetches(), 4);
    }

    /// A cancelled read leaves nothing half-applied: encode happens before
    /// the single store write, so dropping the future mid-fetch writes
    /// nothing.
    #[tokio::test]
    async fn test_cancellation_leaves_store_untouched() {
        let (cache, store, source) = setup(italy_japan(), CacheConfig::default());
        source.set_delay(Duration::from_millis(500));

        let result = tokio::time::timeout(Duration::from_millis(50), cache.get()).await;
        assert!(result.is_err());

        // Give any stray write a chance to land before asserting
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.writes(), 0);
        assert!(!store.exists(TOP_DESTINATIONS_KEY).await.unwrap());
    }
}

// =============================================================================
// RPC Tests
// =============================================================================

mod rpc_tests {
    use super::*;
    use tonic::Request;
    use wayfarer::rpc::proto::content_server::Content;
    use wayfarer::rpc::proto::GetTopDestinationsRequest;
    use wayfarer::rpc::ContentService;

    #[tokio::test]
    async fn test_handler_returns_ordered_entries() {
        let (cache, _store, _source) = setup(italy_japan(), CacheConfig::default());
        let service = ContentService::new(cache);

        let response = service
            .get_top_destinations(Request::new(GetTopDestinationsRequest {}))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.destinations.len(), 2);
        assert_eq!(response.destinations[0].country, "Italy");
        assert_eq!(response.destinations[0].popularity_score, 95);
        assert_eq!(response.destinations[1].country, "Japan");
    }

    #[tokio::test]
    async fn test_handler_empty_ranking_is_ok() {
        let (cache, _store, _source) = setup(vec![], CacheConfig::default());
        let service = ContentService::new(cache);

        let response = service
            .get_top_destinations(Request::new(GetTopDestinationsRequest {}))
            .await
            .unwrap()
            .into_inner();

        assert!(response.destinations.is_empty());
    }

    #[tokio::test]
    async fn test_handler_maps_source_failure_to_unavailable() {
        let (cache, _store, source) = setup(italy_japan(), CacheConfig::default());
        source.fail_fetches(true);
        let service = ContentService::new(cache);

        let status = service
            .get_top_destinations(Request::new(GetTopDestinationsRequest {}))
            .await
            .unwrap_err();

        assert_eq!(status.code(), tonic::Code::Unavailable);
    }

    #[tokio::test]
    async fn test_handler_maps_corrupt_entry_to_internal() {
        let (cache, store, _source) = setup(italy_japan(), CacheConfig::default());
        store
            .set(
                TOP_DESTINATIONS_KEY,
                Bytes::from_static(b"garbage"),
                Duration::from_secs(60),
            )
            .await
            .unwrap();
        let service = ContentService::new(cache);

        let status = service
            .get_top_destinations(Request::new(GetTopDestinationsRequest {}))
            .await
            .unwrap_err();

        assert_eq!(status.code(), tonic::Code::Internal);
    }
}

// =============================================================================
// Store Contract Tests
// =============================================================================

mod store_contract_tests {
    use super::*;

    #[tokio::test]
    async fn test_blob_set_get_exists() {
        let store = InMemoryCacheStore::new();

        assert_eq!(store.get("k").await.unwrap(), None);

        store
            .set("k", Bytes::from_static(b"value"), Duration::from_secs(10))
            .await
            .unwrap();

        assert!(store.exists("k").await.unwrap());
        assert_eq!(
            store.get("k").await.unwrap(),
            Some(Bytes::from_static(b"value"))
        );
    }

    #[tokio::test]
    async fn test_set_carries_ttl_atomically() {
        let store = InMemoryCacheStore::new();
        store
            .set("k", Bytes::from_static(b"v"), Duration::from_secs(10))
            .await
            .unwrap();

        // Expired entry is a miss, not an error
        store.advance(Duration::from_secs(11));
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(!store.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_hash_fields_round_trip() {
        let store = InMemoryCacheStore::new();

        store.hash_set("1", "country", "Italy").await.unwrap();
        store
            .hash_set("1", "best_time_to_visit", "April to June")
            .await
            .unwrap();
        store.hash_set("1", "popularity_score", "95").await.unwrap();

        let fields = store.hash_get_all("1").await.unwrap();
        assert_eq!(fields["country"], "Italy");
        assert_eq!(fields["best_time_to_visit"], "April to June");
        // Stored as the decimal string form, parsed back as i64
        assert_eq!(fields["popularity_score"].parse::<i64>().unwrap(), 95);
    }

    #[tokio::test]
    async fn test_hash_get_all_absent_key_is_empty() {
        let store = InMemoryCacheStore::new();
        assert!(store.hash_get_all("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expire_resets_deadline() {
        let store = InMemoryCacheStore::new();
        store
            .set("k", Bytes::from_static(b"v"), Duration::from_secs(10))
            .await
            .unwrap();

        store.advance(Duration::from_secs(8));
        store.expire("k", Duration::from_secs(10)).await.unwrap();
        store.advance(Duration::from_secs(8));

        // Original deadline has passed, the refreshed one has not
        assert!(store.exists("k").await.unwrap());
    }
}
