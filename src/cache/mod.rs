//! # Response Caching Module
//!
//! Content-addressed response cache that avoids redundant upstream scans.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CacheManager`] | Typed get/set over a backend, with TTL and statistics |
//! | [`CacheConfig`] | Default TTL, enable flag and per-entry size cap |
//! | [`CacheBackend`] | Trait for storage backends |
//! | [`MemoryCache`] | In-memory TTL + LRU backend |
//! | [`NullCache`] | No-op backend |
//! | [`CacheKeyGenerator`] | SHA-256 keys over request content |
//!
//! ## Example
//!
//! ```rust
//! use airs_bridge::cache::{CacheConfig, CacheManager, MemoryCache};
//! use airs_bridge::types::{AiProfile, ContentItem, ScanRequest};
//! use std::time::Duration;
//!
//! let cache = CacheManager::new(
//!     CacheConfig::new().with_ttl(Duration::from_secs(60)),
//!     Box::new(MemoryCache::new(100)),
//! );
//! let req = ScanRequest::new(AiProfile::named("default"), vec![ContentItem::prompt("hi")]);
//! let key = cache.keys().scan_key(&req).unwrap();
//! cache.set(&key, &"verdict").unwrap();
//! assert_eq!(cache.get::<String>(&key).unwrap().as_deref(), Some("verdict"));
//! ```
//!
//! ## Cache Key Generation
//!
//! Keys are derived from the security profile and the ordered prompt /
//! response / context fields only. Transaction ids and caller metadata are
//! excluded, so identical content always maps to the same entry.

mod backend;
mod key;
mod manager;

pub use backend::{BackendSnapshot, CacheBackend, EntryInfo, MemoryCache, NullCache};
pub use key::{CacheKey, CacheKeyGenerator, OP_SCAN_RESULTS, OP_SCAN_SYNC, OP_THREAT_REPORTS};
pub use manager::{CacheConfig, CacheManager, CacheStats};
