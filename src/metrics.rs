//! Prometheus metrics for the cache-aside read path
//!
//! Counters are lazily registered against the default registry and exposed
//! by the metrics server in `main.rs` via the text encoder.

use once_cell::sync::Lazy;
use prometheus::{register_int_counter, IntCounter};

/// Cache reads served from the store
pub static CACHE_HITS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("wayfarer_cache_hits_total", "Cache hits for top destinations")
        .expect("register wayfarer_cache_hits_total")
});

/// Cache reads that found no live entry
pub static CACHE_MISSES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "wayfarer_cache_misses_total",
        "Cache misses for top destinations"
    )
    .expect("register wayfarer_cache_misses_total")
});

/// Successful cache writes
pub static CACHE_POPULATES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "wayfarer_cache_populates_total",
        "Snapshot writes to the cache store"
    )
    .expect("register wayfarer_cache_populates_total")
});

/// Tolerated write failures on the miss path (serve-then-log policy)
pub static CACHE_POPULATE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "wayfarer_cache_populate_failures_total",
        "Cache writes rejected by the store"
    )
    .expect("register wayfarer_cache_populate_failures_total")
});

/// Entries that failed to decode
pub static CACHE_CORRUPT_ENTRIES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "wayfarer_cache_corrupt_entries_total",
        "Cache entries that failed to decode"
    )
    .expect("register wayfarer_cache_corrupt_entries_total")
});

/// Ranking queries issued against the relational store
pub static SOURCE_FETCHES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "wayfarer_source_fetches_total",
        "Ranking queries issued against the relational store"
    )
    .expect("register wayfarer_source_fetches_total")
});

/// RPC calls handled
pub static RPC_REQUESTS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "wayfarer_rpc_requests_total",
        "GetTopDestinations calls received"
    )
    .expect("register wayfarer_rpc_requests_total")
});

/// Force registration of every counter so `/metrics` reports them at zero
/// before the first request.
pub fn init() {
    Lazy::force(&CACHE_HITS);
    Lazy::force(&CACHE_MISSES);
    Lazy::force(&CACHE_POPULATES);
    Lazy::force(&CACHE_POPULATE_FAILURES);
    Lazy::force(&CACHE_CORRUPT_ENTRIES);
    Lazy::force(&SOURCE_FETCHES);
    Lazy::force(&RPC_REQUESTS);
}
