//! Cache manager.

use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::warn;

use super::backend::{CacheBackend, MemoryCache};
use super::key::{CacheKey, CacheKeyGenerator};
use crate::config::CacheSettings;
use crate::Result;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub default_ttl: Duration,
    pub enabled: bool,
    /// Serialized values larger than this are never stored.
    pub max_entry_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(300),
            enabled: true,
            max_entry_size: 1024 * 1024,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
    pub fn with_max_entry_size(mut self, bytes: usize) -> Self {
        self.max_entry_size = bytes;
        self
    }
}

/// Cache statistics.
///
/// `hits`/`misses` survive [`CacheManager::clear`]; entry, size, eviction and
/// expiration figures are reset by it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub enabled: bool,
    pub entries: usize,
    pub size_bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub errors: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    errors: AtomicU64,
}

pub struct CacheManager {
    config: CacheConfig,
    backend: Box<dyn CacheBackend>,
    keys: CacheKeyGenerator,
    stats: AtomicStats,
}

impl CacheManager {
    pub fn new(config: CacheConfig, backend: Box<dyn CacheBackend>) -> Self {
        Self {
            config,
            backend,
            keys: CacheKeyGenerator::new(),
            stats: AtomicStats::default(),
        }
    }

    /// In-memory manager sized from bridge settings.
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(
            CacheConfig::new()
                .with_ttl(settings.ttl())
                .with_enabled(settings.enabled),
            Box::new(MemoryCache::new(settings.max_size)),
        )
    }

    pub fn with_key_generator(mut self, keys: CacheKeyGenerator) -> Self {
        self.keys = keys;
        self
    }

    pub fn keys(&self) -> &CacheKeyGenerator {
        &self.keys
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Typed lookup. A stored value that no longer decodes counts as an error
    /// plus a miss and is dropped.
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>> {
        if !self.config.enabled {
            return Ok(None);
        }
        match self.backend.get(key) {
            Ok(Some(data)) => match serde_json::from_slice(&data) {
                Ok(val) => {
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                    Ok(Some(val))
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "discarding undecodable cache entry");
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                    self.stats.misses.fetch_add(1, Ordering::Relaxed);
                    let _ = self.backend.delete(key);
                    Ok(None)
                }
            },
            Ok(None) => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Store `value` with the default TTL. Returns whether it was stored.
    pub fn set<T: Serialize>(&self, key: &CacheKey, value: &T) -> Result<bool> {
        self.set_with_ttl(key, value, self.config.default_ttl)
    }

    pub fn set_with_ttl<T: Serialize>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Duration,
    ) -> Result<bool> {
        if !self.config.enabled {
            return Ok(false);
        }
        let data = serde_json::to_vec(value)?;
        if data.len() > self.config.max_entry_size {
            return Ok(false);
        }
        match self.backend.set(key, data, ttl) {
            Ok(()) => {
                self.stats.sets.fetch_add(1, Ordering::Relaxed);
                Ok(true)
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    pub fn delete(&self, key: &CacheKey) -> Result<bool> {
        match self.backend.delete(key) {
            Ok(d) => {
                if d {
                    self.stats.deletes.fetch_add(1, Ordering::Relaxed);
                }
                Ok(d)
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Drop every entry. Hit/miss counters are kept.
    pub fn clear(&self) -> Result<()> {
        self.backend.clear()
    }

    pub fn stats(&self) -> CacheStats {
        let backend = self.backend.snapshot().unwrap_or_default();
        CacheStats {
            enabled: self.config.enabled,
            entries: backend.entries,
            size_bytes: backend.size_bytes,
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            sets: self.stats.sets.load(Ordering::Relaxed),
            deletes: self.stats.deletes.load(Ordering::Relaxed),
            errors: self.stats.errors.load(Ordering::Relaxed),
            evictions: backend.evictions,
            expirations: backend.expirations,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::backend::NullCache;

    fn manager(max: usize) -> CacheManager {
        CacheManager::from_settings(&CacheSettings {
            enabled: true,
            ttl_seconds: 60,
            max_size: max,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn typed_round_trip_and_counters() {
        let cache = manager(4);
        let key = CacheKey::new("k");
        assert_eq!(cache.get::<Vec<u32>>(&key).unwrap(), None);
        assert!(cache.set(&key, &vec![1u32, 2, 3]).unwrap());
        assert_eq!(cache.get::<Vec<u32>>(&key).unwrap(), Some(vec![1, 2, 3]));

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.sets), (1, 1, 1));
        assert_eq!(stats.entries, 1);
        assert!(stats.size_bytes > 0);
        assert!((stats.hit_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_keeps_hit_and_miss_counters() {
        let cache = manager(1);
        let (a, b) = (CacheKey::new("a"), CacheKey::new("b"));
        cache.set(&a, &1u8).unwrap();
        cache.set(&b, &2u8).unwrap();
        cache.get::<u8>(&b).unwrap();
        cache.get::<u8>(&a).unwrap();

        cache.clear().unwrap();
        cache.clear().unwrap();

        let stats = cache.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.size_bytes, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn undecodable_entry_is_dropped() {
        let cache = manager(4);
        let key = CacheKey::new("k");
        cache.set(&key, &"not a number").unwrap();
        assert_eq!(cache.get::<u64>(&key).unwrap(), None);
        let stats = cache.stats();
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.entries, 0);
    }

    #[test]
    fn oversized_values_are_not_stored() {
        let cache = CacheManager::new(
            CacheConfig::new().with_max_entry_size(8),
            Box::new(MemoryCache::new(4)),
        );
        let key = CacheKey::new("k");
        assert!(!cache.set(&key, &"a string well over eight bytes").unwrap());
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn disabled_manager_is_inert() {
        let cache = CacheManager::new(
            CacheConfig::new().with_enabled(false),
            Box::new(MemoryCache::new(4)),
        );
        let key = CacheKey::new("k");
        assert!(!cache.set(&key, &1u8).unwrap());
        assert_eq!(cache.get::<u8>(&key).unwrap(), None);
        let stats = cache.stats();
        assert!(!stats.enabled);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn delete_counts_only_real_removals() {
        let cache = CacheManager::new(CacheConfig::new(), Box::new(NullCache::new()));
        assert!(!cache.delete(&CacheKey::new("k")).unwrap());
        assert_eq!(cache.stats().deletes, 0);
        assert_eq!(cache.backend_name(), "null");
    }
}
