//! In-process object cache with entity-driven eviction.

use std::collections::HashSet;
use std::sync::Mutex;

use lru::LruCache;
use tracing::debug;

use super::config::CacheConfig;
use super::keys::{CacheKey, EntityKey};
use super::lock::mutex_lock;
use super::registry::CacheRegistry;

const SOURCE: &str = "cache::store";

/// Host-style object cache: values keyed by name, each with a set of entity
/// dependencies that evict it when signalled.
pub trait CacheProvider<V>: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<V>;

    fn insert(&self, key: CacheKey, value: V, dependencies: HashSet<EntityKey>);

    fn remove(&self, key: &CacheKey);

    /// Drop every value depending on `entity`. Returns how many were dropped.
    fn evict(&self, entity: &EntityKey) -> usize;
}

/// LRU-bounded `CacheProvider`.
///
/// Registry updates happen while the entry lock is held, and the entry lock is
/// always taken first, so an eviction never observes an entry whose
/// dependencies are not registered yet.
pub struct ObjectCache<V> {
    // LRU reads reorder entries, so every access is exclusive.
    entries: Mutex<LruCache<CacheKey, V>>,
    registry: CacheRegistry,
}

impl<V: Clone + Send + Sync> ObjectCache<V> {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(config.capacity_non_zero())),
            registry: CacheRegistry::new(),
        }
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone + Send + Sync> CacheProvider<V> for ObjectCache<V> {
    fn get(&self, key: &CacheKey) -> Option<V> {
        mutex_lock(&self.entries, SOURCE, "get").get(key).cloned()
    }

    fn insert(&self, key: CacheKey, value: V, dependencies: HashSet<EntityKey>) {
        let mut entries = mutex_lock(&self.entries, SOURCE, "insert");
        if let Some((old_key, _)) = entries.push(key.clone(), value)
            && old_key != key
        {
            self.registry.unregister(&old_key);
        }
        self.registry.register(key, dependencies);
    }

    fn remove(&self, key: &CacheKey) {
        let mut entries = mutex_lock(&self.entries, SOURCE, "remove");
        entries.pop(key);
        self.registry.unregister(key);
    }

    fn evict(&self, entity: &EntityKey) -> usize {
        let mut entries = mutex_lock(&self.entries, SOURCE, "evict");
        let affected = self.registry.unregister_entity(entity);
        let evicted = affected
            .iter()
            .filter(|key| entries.pop(*key).is_some())
            .count();
        debug!(?entity, evicted, "Evicted dependent cache entries");
        evicted
    }
}
