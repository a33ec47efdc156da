// crates/sponsormatch-core/src/cache.rs
// ============================================================================
// Module: Caches
// Description: Bounded, FIFO-evicting maps over context text and full
//   request fingerprints.
// Purpose: Keep request latency bounded under repeated contexts without
//   making correctness depend on cache state.
// Dependencies: sponsormatch-core::model
// ============================================================================

//! ## Overview
//! Two caches, each a fixed-size map with FIFO eviction: the embedding cache
//! (capacity 500) and the match-result cache (capacity 100, advisory only).
//! Both are process-local; correctness never depends on them.
//!
//! Invariants:
//! - A cache never exceeds its configured capacity by more than the number
//!   of concurrently in-flight inserts.
//! - The result cache is advisory: a hit must not replay the analytics write
//!   side effect, and a trace served from cache must not be re-inserted into
//!   the audit-trace store under a new identifier.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::hash::Hash;
use std::sync::Mutex;

use sha2::Digest;
use sha2::Sha256;

use crate::model::AuditTrace;
use crate::model::MatchResponse;

/// Default capacity of the embedding cache.
pub const EMBEDDING_CACHE_CAPACITY: usize = 500;
/// Default capacity of the match-result cache.
pub const RESULT_CACHE_CAPACITY: usize = 100;

struct BoundedFifoInner<K, V> {
    entries: HashMap<K, V>,
    order: VecDeque<K>,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, V: Clone> BoundedFifoInner<K, V> {
    fn get_or_insert_with(&mut self, key: K, compute: impl FnOnce() -> V) -> (V, bool) {
        if let Some(value) = self.entries.get(&key) {
            return (value.clone(), true);
        }
        let value = compute();
        self.order.push_back(key.clone());
        self.entries.insert(key, value.clone());
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        (value, false)
    }
}

/// A bounded, thread-safe, FIFO-evicting cache keyed by `K`.
pub struct BoundedFifoCache<K, V> {
    inner: Mutex<BoundedFifoInner<K, V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> BoundedFifoCache<K, V> {
    /// Creates an empty cache with the given `capacity`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(BoundedFifoInner { entries: HashMap::new(), order: VecDeque::new(), capacity }),
        }
    }

    /// Returns the cached value for `key`, computing and inserting it via
    /// `compute` on a miss. Returns the value alongside whether it was a hit.
    ///
    /// A read-through race where two callers concurrently miss and both
    /// compute is acceptable: the compute is expected to be idempotent.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned by a prior panic while held.
    pub fn get_or_insert_with(&self, key: K, compute: impl FnOnce() -> V) -> (V, bool) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.get_or_insert_with(key, compute)
    }

    /// Looks up `key` without computing; returns `None` on a miss.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned by a prior panic while held.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<V> {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.entries.get(key).cloned()
    }

    /// Inserts `value` under `key`, evicting the oldest entry if the cache is
    /// at capacity. Used after a fallible compute succeeds outside the lock,
    /// so a compute that can suspend or fail never holds the cache mutex.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned by a prior panic while held.
    pub fn insert(&self, key: K, value: V) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.get_or_insert_with(key, || value);
    }

    /// Returns the current number of cached entries.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned by a prior panic while held.
    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.entries.len()
    }

    /// Returns true if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// SHA-256 of `text`, hex-encoded; the embedding cache's key shape.
#[must_use]
pub fn sha256_hex(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// The embedding cache: normalized context text to embedding vector.
pub type EmbeddingCache = BoundedFifoCache<String, Vec<f32>>;

/// Builds an embedding cache at the spec-mandated capacity.
#[must_use]
pub fn new_embedding_cache() -> EmbeddingCache {
    BoundedFifoCache::new(EMBEDDING_CACHE_CAPACITY)
}

/// The result cache: request fingerprint to cached response and trace.
pub type ResultCache = BoundedFifoCache<String, (MatchResponse, AuditTrace)>;

/// Builds a result cache at the spec-mandated capacity.
#[must_use]
pub fn new_result_cache() -> ResultCache {
    BoundedFifoCache::new(RESULT_CACHE_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_does_not_recompute() {
        let cache: BoundedFifoCache<String, u32> = BoundedFifoCache::new(10);
        let (value, hit) = cache.get_or_insert_with("a".to_string(), || 1);
        assert_eq!(value, 1);
        assert!(!hit);
        let (value, hit) = cache.get_or_insert_with("a".to_string(), || 2);
        assert_eq!(value, 1);
        assert!(hit);
    }

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let cache: BoundedFifoCache<String, u32> = BoundedFifoCache::new(2);
        cache.get_or_insert_with("a".to_string(), || 1);
        cache.get_or_insert_with("b".to_string(), || 2);
        cache.get_or_insert_with("c".to_string(), || 3);
        assert_eq!(cache.len(), 2);
        let (_, hit) = cache.get_or_insert_with("a".to_string(), || 99);
        assert!(!hit);
    }

    #[test]
    fn sha256_hex_is_deterministic() {
        assert_eq!(sha256_hex("hello"), sha256_hex("hello"));
        assert_ne!(sha256_hex("hello"), sha256_hex("world"));
    }
}
