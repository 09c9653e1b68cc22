//! Feature and result caches
//!
//! `TtlLruCache` is a sharded in-process map with per-entry TTL and
//! approximate LRU eviction. `ResultCache` sits on top of any `KvCache`
//! substrate and treats every failure or slow round-trip as a miss.

use async_trait::async_trait;
use dashmap::DashMap;
use lead_intel_core::{lead_key_prefix, CacheError, KvCache, SignalVector};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::request::InferenceOutcome;

/// One cached value
#[derive(Debug)]
pub struct CacheEntry<T> {
    pub key: String,
    pub value: T,
    pub inserted_at: Instant,
    pub ttl: Duration,
    last_access: AtomicU64,
}

impl<T> CacheEntry<T> {
    fn new(key: String, value: T, ttl: Duration, tick: u64) -> Self {
        Self {
            key,
            value,
            inserted_at: Instant::now(),
            ttl,
            last_access: AtomicU64::new(tick),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() >= self.ttl
    }

    pub fn last_access(&self) -> u64 {
        self.last_access.load(Ordering::Relaxed)
    }
}

/// Hit/miss counters of one cache
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Bounded TTL cache with least-recently-used eviction
///
/// Recency is a global access tick rather than a linked list, so reads
/// only touch the shard holding the key. Eviction scans for the oldest
/// tick, which keeps inserts O(n) at capacity; capacities here are a few
/// thousand entries.
#[derive(Debug)]
pub struct TtlLruCache<T> {
    entries: DashMap<String, CacheEntry<T>>,
    capacity: usize,
    default_ttl: Duration,
    tick: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<T: Clone> TtlLruCache<T> {
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
            default_ttl,
            tick: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    fn next_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                entry.last_access.store(self.next_tick(), Ordering::Relaxed);
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            },
            Some(_) => true,
            None => false,
        };
        // the shard guard is released before removing
        if expired {
            self.entries.remove_if(key, |_, e| e.is_expired());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn insert(&self, key: impl Into<String>, value: T) {
        self.insert_with_ttl(key, value, self.default_ttl);
    }

    pub fn insert_with_ttl(&self, key: impl Into<String>, value: T, ttl: Duration) {
        let key = key.into();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.purge_expired();
            while self.entries.len() >= self.capacity {
                if !self.evict_oldest() {
                    break;
                }
            }
        }
        let entry = CacheEntry::new(key.clone(), value, ttl, self.next_tick());
        self.entries.insert(key, entry);
    }

    fn evict_oldest(&self) -> bool {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|e| e.last_access())
            .map(|e| e.key().clone());
        match oldest {
            Some(key) => {
                self.entries.remove(&key);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(key = %key, "Evicted least recently used entry");
                true
            },
            None => false,
        }
    }

    /// Drop every expired entry, returning how many went
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.is_expired());
        before.saturating_sub(self.entries.len())
    }

    pub fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn remove_prefix(&self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|k, _| !k.starts_with(prefix));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}

/// In-process `KvCache` substrate
#[derive(Debug)]
pub struct InMemoryKvCache {
    inner: TtlLruCache<Vec<u8>>,
}

impl InMemoryKvCache {
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            inner: TtlLruCache::new(capacity, default_ttl),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.stats()
    }
}

#[async_trait]
impl KvCache for InMemoryKvCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.inner.get(key))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        self.inner.insert_with_ttl(key, value, ttl);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        Ok(self.inner.remove_prefix(prefix))
    }
}

/// Inference outcomes keyed by request fingerprint
#[derive(Clone)]
pub struct ResultCache {
    backend: Arc<dyn KvCache>,
    ttl: Duration,
    timeout: Duration,
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("ttl", &self.ttl)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ResultCache {
    pub fn new(backend: Arc<dyn KvCache>, ttl: Duration, timeout: Duration) -> Self {
        Self {
            backend,
            ttl,
            timeout,
        }
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    /// Cached outcome; any backend error, timeout or decode failure is a miss
    pub async fn get(&self, fingerprint: &str) -> Option<InferenceOutcome> {
        match self.try_get(fingerprint).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(fingerprint = %fingerprint, error = %e, "Result cache read failed, treating as miss");
                None
            },
        }
    }

    async fn try_get(&self, fingerprint: &str) -> Result<Option<InferenceOutcome>, CacheError> {
        let bytes = tokio::time::timeout(self.timeout, self.backend.get(fingerprint))
            .await
            .map_err(|_| CacheError::Timeout(self.timeout_ms()))??;
        match bytes {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| CacheError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    /// Store an outcome; failures are logged and otherwise ignored
    pub async fn put(&self, fingerprint: &str, outcome: &InferenceOutcome) -> bool {
        let result = async {
            let bytes =
                serde_json::to_vec(outcome).map_err(|e| CacheError::Serialization(e.to_string()))?;
            tokio::time::timeout(self.timeout, self.backend.set(fingerprint, bytes, self.ttl))
                .await
                .map_err(|_| CacheError::Timeout(self.timeout_ms()))?
        }
        .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(fingerprint = %fingerprint, error = %e, "Result cache write failed");
                false
            },
        }
    }

    /// Drop every cached outcome of one lead
    pub async fn invalidate_lead(&self, lead_id: &str) -> Result<usize, CacheError> {
        let prefix = lead_key_prefix(lead_id);
        tokio::time::timeout(self.timeout, self.backend.delete_prefix(&prefix))
            .await
            .map_err(|_| CacheError::Timeout(self.timeout_ms()))?
    }
}

/// Extracted signals keyed by `feature_fingerprint`
pub type FeatureCache = TtlLruCache<SignalVector>;
