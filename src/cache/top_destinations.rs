//! Top Destinations Cache - the cache-aside core
//!
//! Stateless logic over two injected stores: reads the ranking snapshot from
//! the cache store, and on miss pulls a fresh one from the ranking source,
//! writes it back with a TTL, and returns it without a redundant re-read.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::codec::{decode_snapshot, encode_snapshot};
use super::{DEFAULT_CACHE_TTL, TOP_DESTINATIONS_KEY};
use crate::domain::{CacheStore, RankingSnapshot, RankingSource};
use crate::error::{Error, Result};
use crate::metrics;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the top-destinations cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Entry lifetime, applied from population time
    pub ttl: Duration,

    /// Coalesce concurrent misses into one fetch+populate. Disabling this
    /// restores the unguarded behavior where N concurrent misses each query
    /// the ranking source (a cache stampede).
    pub coalesce_misses: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL,
            coalesce_misses: true,
        }
    }
}

// =============================================================================
// Top Destinations Cache
// =============================================================================

/// Cache-aside read path for the top-destinations ranking.
///
/// Holds no mutable state of its own beyond the single-flight guard; the
/// cache store and the relational connection are shared process-wide and
/// injected once at startup.
pub struct TopDestinationsCache {
    config: CacheConfig,
    store: Arc<dyn CacheStore>,
    source: Arc<dyn RankingSource>,
    /// Single-flight guard: at most one fetch+populate in flight for the key
    refresh_lock: Mutex<()>,
}

impl TopDestinationsCache {
    /// Create a new cache over the given stores.
    pub fn new(
        config: CacheConfig,
        store: Arc<dyn CacheStore>,
        source: Arc<dyn RankingSource>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            store,
            source,
            refresh_lock: Mutex::new(()),
        })
    }

    /// Get the current ranking snapshot.
    ///
    /// Serves from the cache store when a live entry exists; otherwise pulls
    /// a fresh snapshot from the ranking source, writes it back with the
    /// configured TTL, and returns it. A miss is not an error; a corrupt
    /// entry is (`CacheCorrupt`), and so is a store read failure
    /// (`CacheReadFailed`).
    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<RankingSnapshot> {
        if let Some(snapshot) = self.read_store().await? {
            metrics::CACHE_HITS.inc();
            debug!(entries = snapshot.len(), "Cache hit for top destinations");
            return Ok(snapshot);
        }

        metrics::CACHE_MISSES.inc();
        debug!("Cache miss for top destinations");

        if self.config.coalesce_misses {
            let _guard = self.refresh_lock.lock().await;

            // The winner populated while we waited on the lock; join its
            // result instead of issuing a duplicate fetch.
            if let Some(snapshot) = self.read_store().await? {
                debug!("Joined in-flight refresh for top destinations");
                return Ok(snapshot);
            }

            self.fetch_and_populate().await
        } else {
            self.fetch_and_populate().await
        }
    }

    /// Encode the snapshot and write it to the cache store.
    ///
    /// The TTL rides with the write as one store operation, so there is no
    /// window where the entry exists without an expiry and no partial
    /// multi-field state if the caller is cancelled mid-populate.
    pub async fn populate(&self, snapshot: &RankingSnapshot) -> Result<()> {
        let bytes = encode_snapshot(snapshot)?;
        self.store
            .set(TOP_DESTINATIONS_KEY, bytes, self.config.ttl)
            .await?;

        metrics::CACHE_POPULATES.inc();
        info!(
            entries = snapshot.len(),
            ttl_secs = self.config.ttl.as_secs(),
            "Populated top destinations cache"
        );
        Ok(())
    }

    /// Read and decode the cached snapshot. `Ok(None)` is a miss.
    async fn read_store(&self) -> Result<Option<RankingSnapshot>> {
        match self.store.get(TOP_DESTINATIONS_KEY).await? {
            Some(bytes) => {
                let snapshot = decode_snapshot(TOP_DESTINATIONS_KEY, &bytes).map_err(|e| {
                    metrics::CACHE_CORRUPT_ENTRIES.inc();
                    e
                })?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    /// Miss path: one source fetch, one store write, return the fetched
    /// snapshot.
    ///
    /// Write-failure policy: serve-then-log. A transient cache outage must
    /// not degrade the read path, so a `CacheWriteFailed` from the implicit
    /// populate is logged and the fresh snapshot is still returned. Any
    /// other populate error propagates.
    async fn fetch_and_populate(&self) -> Result<RankingSnapshot> {
        let snapshot = self.source.fetch().await?;
        metrics::SOURCE_FETCHES.inc();

        match self.populate(&snapshot).await {
            Ok(()) => {}
            Err(e @ Error::CacheWriteFailed { .. }) => {
                metrics::CACHE_POPULATE_FAILURES.inc();
                warn!(error = %e, "Cache populate failed; serving fresh snapshot anyway");
            }
            Err(e) => return Err(e),
        }

        Ok(snapshot)
    }
}
