//! In-Memory Test Doubles
//!
//! Instrumented in-memory implementations of the two ports, used by unit and
//! integration tests. The store keeps its own logical clock so TTL behavior
//! can be tested without sleeping; the source counts fetches and can be
//! scripted to fail or to respond slowly.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::RwLock;

use crate::domain::{CacheStore, Destination, RankingSnapshot, RankingSource};
use crate::error::{Error, Result};

// =============================================================================
// In-Memory Cache Store
// =============================================================================

#[derive(Debug, Clone)]
enum StoredValue {
    Blob(Bytes),
    Hash(HashMap<String, String>),
}

#[derive(Debug, Clone)]
struct StoredEntry {
    value: StoredValue,
    /// Logical-clock deadline in milliseconds; `None` means no expiry set
    expires_at: Option<u64>,
}

/// In-memory cache store for testing.
///
/// Uses DashMap for lock-free concurrent access and atomic counters for
/// read/write instrumentation. Time is a logical clock advanced explicitly
/// by tests, so expiration is deterministic.
pub struct InMemoryCacheStore {
    entries: DashMap<String, StoredEntry>,
    /// Logical clock in milliseconds
    now_ms: AtomicU64,
    reads: AtomicU64,
    writes: AtomicU64,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            now_ms: AtomicU64::new(0),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }
}

impl InMemoryCacheStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the logical clock, expiring entries whose TTL has elapsed.
    pub fn advance(&self, by: Duration) {
        self.now_ms.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    /// Switch read operations between succeeding and failing.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Switch write operations between succeeding and failing.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of read operations observed.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of successful write operations observed.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn now(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn is_live(&self, entry: &StoredEntry) -> bool {
        match entry.expires_at {
            Some(deadline) => self.now() < deadline,
            None => true,
        }
    }

    fn deadline(&self, ttl: Duration) -> u64 {
        self.now() + ttl.as_millis() as u64
    }

    fn check_readable(&self, key: &str) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(Error::read_failed(key, "reads disabled"))
        } else {
            Ok(())
        }
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(Error::write_failed(key, "writes disabled"))
        } else {
            Ok(())
        }
    }

    /// Drop a dead entry so it reads as absent for every operation,
    /// matching how Redis treats an expired key.
    fn purge_if_dead(&self, key: &str) {
        self.entries.remove_if(key, |_, entry| !self.is_live(entry));
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.check_readable(key)?;
        self.reads.fetch_add(1, Ordering::Relaxed);

        match self.entries.get(key) {
            Some(entry) if self.is_live(&entry) => match &entry.value {
                StoredValue::Blob(bytes) => Ok(Some(bytes.clone())),
                StoredValue::Hash(_) => Err(Error::read_failed(key, "holds a hash, not a blob")),
            },
            _ => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()> {
        self.check_writable(key)?;
        self.writes.fetch_add(1, Ordering::Relaxed);

        self.entries.insert(
            key.to_string(),
            StoredEntry {
                value: StoredValue::Blob(value),
                expires_at: Some(self.deadline(ttl)),
            },
        );
        Ok(())
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<()> {
        self.check_writable(key)?;
        self.writes.fetch_add(1, Ordering::Relaxed);

        self.purge_if_dead(key);
        let mut entry = self.entries.entry(key.to_string()).or_insert(StoredEntry {
            value: StoredValue::Hash(HashMap::new()),
            expires_at: None,
        });
        match &mut entry.value {
            StoredValue::Hash(fields) => {
                fields.insert(field.to_string(), value.to_string());
                Ok(())
            }
            StoredValue::Blob(_) => Err(Error::write_failed(key, "holds a blob, not a hash")),
        }
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>> {
        self.check_readable(key)?;
        self.reads.fetch_add(1, Ordering::Relaxed);

        match self.entries.get(key) {
            Some(entry) if self.is_live(&entry) => match &entry.value {
                StoredValue::Hash(fields) => Ok(fields.clone()),
                StoredValue::Blob(_) => Err(Error::read_failed(key, "holds a blob, not a hash")),
            },
            _ => Ok(HashMap::new()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.check_readable(key)?;
        self.reads.fetch_add(1, Ordering::Relaxed);

        Ok(self
            .entries
            .get(key)
            .map(|entry| self.is_live(&entry))
            .unwrap_or(false))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        self.check_writable(key)?;

        // A dead entry must not be resurrected by a new deadline
        self.purge_if_dead(key);
        let deadline = self.deadline(ttl);
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.expires_at = Some(deadline);
        }
        Ok(())
    }
}

// =============================================================================
// Static Ranking Source
// =============================================================================

/// Scripted ranking source for testing.
///
/// Returns a fixed set of destinations, counts fetches, and can be switched
/// into a failing mode or given an artificial response delay.
pub struct StaticRankingSource {
    destinations: RwLock<Vec<Destination>>,
    fetches: AtomicU64,
    fail: AtomicBool,
    delay: RwLock<Duration>,
}

impl StaticRankingSource {
    /// Create a source returning the given destinations.
    pub fn new(destinations: Vec<Destination>) -> Self {
        Self {
            destinations: RwLock::new(destinations),
            fetches: AtomicU64::new(0),
            fail: AtomicBool::new(false),
            delay: RwLock::new(Duration::ZERO),
        }
    }

    /// Number of fetches issued so far.
    pub fn fetches(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Switch fetches between succeeding and failing.
    pub fn fail_fetches(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Add an artificial delay before each response.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.write() = delay;
    }

    /// Replace the returned destinations.
    pub fn set_destinations(&self, destinations: Vec<Destination>) {
        *self.destinations.write() = destinations;
    }
}

#[async_trait]
impl RankingSource for StaticRankingSource {
    async fn fetch(&self) -> Result<RankingSnapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.read();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::SourceUnavailable("scripted failure".to_string()));
        }

        Ok(RankingSnapshot::new(self.destinations.read().clone()))
    }
}
