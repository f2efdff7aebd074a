//! Memoisation of resolved read models
//!
//! LRU eviction behind a parking_lot RwLock, with atomic hit/miss counters.
//! Keys are plain strings built by the caller and must carry the
//! configuration id, since the same type resolves differently per
//! configuration.

use lru::LruCache;
use parking_lot::RwLock;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

pub const DEFAULT_CAPACITY: usize = 64;

/// Get-or-compute store for cloned values
pub trait Cache<V: Clone> {
    fn get(&self, key: &str) -> Option<V>;

    fn insert(&self, key: String, value: V);

    fn invalidate_all(&self);

    /// Cached value for `key`, computing and storing it on a miss.
    ///
    /// Failed computations are not cached.
    fn get_or_try_insert_with<E, F>(&self, key: &str, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = compute()?;
        self.insert(key.to_string(), value.clone());
        Ok(value)
    }
}

impl<V: Clone, C: Cache<V> + ?Sized> Cache<V> for &C {
    fn get(&self, key: &str) -> Option<V> {
        (**self).get(key)
    }

    fn insert(&self, key: String, value: V) {
        (**self).insert(key, value)
    }

    fn invalidate_all(&self) {
        (**self).invalidate_all()
    }
}

/// Bounded LRU cache
pub struct LruCacheService<V> {
    cache: RwLock<LruCache<String, V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> LruCacheService<V> {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: RwLock::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> CacheStats {
        let cache = self.cache.read();
        CacheStats {
            size: cache.len(),
            capacity: cache.cap().get(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl<V: Clone> Default for LruCacheService<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<V: Clone> Cache<V> for LruCacheService<V> {
    fn get(&self, key: &str) -> Option<V> {
        // LRU promotion needs the write lock
        let mut cache = self.cache.write();
        match cache.get(key) {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn insert(&self, key: String, value: V) {
        self.cache.write().put(key, value);
    }

    fn invalidate_all(&self) {
        self.cache.write().clear();
        tracing::debug!("cache cleared");
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
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
