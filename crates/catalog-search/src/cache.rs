//! Tag-invalidated configuration cache.
//!
//! Relevance configurations, the static relevance seed and field mappings are
//! read far more often than they change. Each is cached here under a scope key
//! and a tag; an admin write invalidates the whole tag at once.
//!
//! Population is check-then-populate under the write lock, so concurrent
//! first reads of the same key converge on a single cached value.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// Tag for cached relevance configurations and the relevance seed.
pub const RELEVANCE_TAG: &str = "search_relevance";

/// Tag for cached field mappings.
pub const MAPPING_TAG: &str = "search_mapping";

struct CacheEntry<V> {
    tag: &'static str,
    value: Arc<V>,
}

/// A process-wide cache of shared, immutable values keyed by scope.
pub struct ConfigCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V> Default for ConfigCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> std::fmt::Debug for ConfigCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigCache")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl<V> ConfigCache<V> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        self.entries.read().get(key).map(|e| Arc::clone(&e.value))
    }

    /// Returns the cached value for `key`, populating it with `load` on a miss.
    ///
    /// `load` runs at most once per key between invalidations, even when
    /// several threads miss at the same time. A failed load caches nothing.
    pub fn get_or_try_insert_with<E, F>(
        &self,
        key: &str,
        tag: &'static str,
        load: F,
    ) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let mut entries = self.entries.write();
        if let Some(entry) = entries.get(key) {
            return Ok(Arc::clone(&entry.value));
        }

        let value = Arc::new(load()?);
        entries.insert(
            key.to_string(),
            CacheEntry {
                tag,
                value: Arc::clone(&value),
            },
        );
        tracing::debug!(key, tag, "Populated configuration cache entry");
        Ok(value)
    }

    /// Drops every entry stored under `tag`. Returns the number of entries removed.
    pub fn invalidate_tag(&self, tag: &str) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.tag != tag);
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(tag, removed, "Invalidated configuration cache tag");
        }
        removed
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
