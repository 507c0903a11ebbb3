//! Cache backend implementations.

use super::key::CacheKey;
use crate::{Error, Result};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Clone)]
struct CacheEntry {
    data: Vec<u8>,
    created_at: Instant,
    /// `None` when `now + ttl` is not representable; such entries never expire.
    expires_at: Option<Instant>,
    last_accessed: Instant,
}

impl CacheEntry {
    fn new(data: Vec<u8>, ttl: Duration, now: Instant) -> Self {
        Self {
            data,
            created_at: now,
            expires_at: now.checked_add(ttl),
            last_accessed: now,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |at| now >= at)
    }

    fn size(&self, key: &str) -> usize {
        key.len() + self.data.len()
    }
}

/// Age and freshness of a single entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub age: Duration,
    pub idle: Duration,
    pub remaining_ttl: Duration,
    pub size_bytes: usize,
}

/// Point-in-time backend accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendSnapshot {
    pub entries: usize,
    pub size_bytes: usize,
    pub evictions: u64,
    pub expirations: u64,
}

/// Storage for serialized responses.
///
/// Bookkeeping is synchronous: no method suspends, so a get/set pair never
/// interleaves with another task's mutation mid-way.
pub trait CacheBackend: Send + Sync {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>>;
    fn set(&self, key: &CacheKey, value: Vec<u8>, ttl: Duration) -> Result<()>;
    fn delete(&self, key: &CacheKey) -> Result<bool>;
    fn clear(&self) -> Result<()>;
    fn snapshot(&self) -> Result<BackendSnapshot>;
    fn name(&self) -> &'static str;
}

struct Inner {
    entries: LruCache<String, CacheEntry>,
    size_bytes: usize,
    evictions: u64,
    expirations: u64,
}

impl Inner {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.pop(key)?;
        self.size_bytes = self.size_bytes.saturating_sub(entry.size(key));
        Some(entry)
    }

    fn purge_expired(&mut self, now: Instant) {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        for k in expired {
            self.remove(&k);
            self.expirations += 1;
        }
    }
}

/// In-memory cache with per-entry TTL and least-recently-used eviction.
pub struct MemoryCache {
    inner: Mutex<Inner>,
    max_entries: NonZeroUsize,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        let max_entries = NonZeroUsize::new(max_entries.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                // Capacity is enforced by hand so evictions can be counted.
                entries: LruCache::unbounded(),
                size_bytes: 0,
                evictions: 0,
                expirations: 0,
            }),
            max_entries,
        }
    }

    pub fn capacity(&self) -> usize {
        self.max_entries.get()
    }

    /// Keys from most to least recently used. Expired entries are included
    /// until the next access purges them.
    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.entries.iter().map(|(k, _)| k.clone()).collect())
    }

    /// Inspect an entry without refreshing its recency.
    pub fn entry_info(&self, key: &CacheKey) -> Result<Option<EntryInfo>> {
        let now = Instant::now();
        let inner = self.lock()?;
        Ok(inner
            .entries
            .peek(&key.hash)
            .filter(|e| !e.is_expired(now))
            .map(|e| EntryInfo {
                age: now.duration_since(e.created_at),
                idle: now.duration_since(e.last_accessed),
                remaining_ttl: e
                    .expires_at
                    .map_or(Duration::MAX, |at| at.saturating_duration_since(now)),
                size_bytes: e.size(&key.hash),
            }))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| Error::Cache {
            message: "memory cache poisoned".to_string(),
        })
    }
}

impl CacheBackend for MemoryCache {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();
        let mut inner = self.lock()?;
        let expired = match inner.entries.get_mut(&key.hash) {
            None => return Ok(None),
            Some(entry) if entry.is_expired(now) => true,
            Some(entry) => {
                entry.last_accessed = now;
                return Ok(Some(entry.data.clone()));
            }
        };
        if expired {
            inner.remove(&key.hash);
            inner.expirations += 1;
        }
        Ok(None)
    }

    fn set(&self, key: &CacheKey, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut inner = self.lock()?;
        // Overwrites never evict.
        inner.remove(&key.hash);
        if inner.entries.len() >= self.max_entries.get() {
            inner.purge_expired(now);
        }
        while inner.entries.len() >= self.max_entries.get() {
            match inner.entries.pop_lru() {
                Some((k, e)) => {
                    inner.size_bytes = inner.size_bytes.saturating_sub(e.size(&k));
                    inner.evictions += 1;
                }
                None => break,
            }
        }
        let entry = CacheEntry::new(value, ttl, now);
        inner.size_bytes += entry.size(&key.hash);
        inner.entries.put(key.hash.clone(), entry);
        Ok(())
    }

    fn delete(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.lock()?.remove(&key.hash).is_some())
    }

    fn clear(&self) -> Result<()> {
        let mut inner = self.lock()?;
        inner.entries.clear();
        inner.size_bytes = 0;
        inner.evictions = 0;
        inner.expirations = 0;
        Ok(())
    }

    fn snapshot(&self) -> Result<BackendSnapshot> {
        let inner = self.lock()?;
        Ok(BackendSnapshot {
            entries: inner.entries.len(),
            size_bytes: inner.size_bytes,
            evictions: inner.evictions,
            expirations: inner.expirations,
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// No-op backend: every lookup misses, nothing is stored.
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for NullCache {
    fn get(&self, _: &CacheKey) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
    fn set(&self, _: &CacheKey, _: Vec<u8>, _: Duration) -> Result<()> {
        Ok(())
    }
    fn delete(&self, _: &CacheKey) -> Result<bool> {
        Ok(false)
    }
    fn clear(&self) -> Result<()> {
        Ok(())
    }
    fn snapshot(&self) -> Result<BackendSnapshot> {
        Ok(BackendSnapshot::default())
    }
    fn name(&self) -> &'static str {
        "null"
    }
}
